use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FetchError, Result};

/// Media codes are base64url-flavored tokens; anything else in the slot
/// means the URL was not a post or reel permalink after all.
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Extracts the public media code from an Instagram post or reel URL.
///
/// The code is the path segment immediately following `/p/` or `/reel/`,
/// returned verbatim. Trailing path segments, query strings and fragments
/// are ignored.
///
/// # Example
/// ```rust
/// use grampull::media_code_from_url;
///
/// let code = media_code_from_url("https://www.instagram.com/p/ABC123/").unwrap();
/// assert_eq!(code, "ABC123");
/// ```
pub fn media_code_from_url(url: &str) -> Result<String> {
    for marker in ["/p/", "/reel/"] {
        if let Some(rest) = url.split(marker).nth(1) {
            let code = rest.split(['/', '?', '#']).next().unwrap_or("");
            if !code.is_empty() && CODE_RE.is_match(code) {
                return Ok(code.to_string());
            }
        }
    }

    Err(FetchError::InvalidUrlFormat(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_post_code() {
        let code = media_code_from_url("https://www.instagram.com/p/C1aB2cD3eF4/").unwrap();
        assert_eq!(code, "C1aB2cD3eF4");
    }

    #[test]
    fn test_extracts_reel_code() {
        let code = media_code_from_url("https://www.instagram.com/reel/Xy-Z_9/").unwrap();
        assert_eq!(code, "Xy-Z_9");
    }

    #[test]
    fn test_ignores_query_and_fragment() {
        let code =
            media_code_from_url("https://www.instagram.com/p/ABC123?igsh=xyz#comments").unwrap();
        assert_eq!(code, "ABC123");

        let code = media_code_from_url("https://www.instagram.com/p/ABC123/c/17890/").unwrap();
        assert_eq!(code, "ABC123");
    }

    #[test]
    fn test_no_trailing_slash() {
        let code = media_code_from_url("https://www.instagram.com/reel/ABC123").unwrap();
        assert_eq!(code, "ABC123");
    }

    #[test]
    fn test_rejects_urls_without_markers() {
        let err = media_code_from_url("https://www.instagram.com/acme/").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrlFormat(_)));

        // "/reels/" is the browse page, not a permalink
        let err = media_code_from_url("https://www.instagram.com/reels/").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrlFormat(_)));
    }

    #[test]
    fn test_rejects_empty_or_malformed_segment() {
        let err = media_code_from_url("https://www.instagram.com/p/?img_index=1").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrlFormat(_)));

        let err = media_code_from_url("https://www.instagram.com/p/has spaces/").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrlFormat(_)));
    }
}
