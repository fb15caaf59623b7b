//! Fuzzy page-name scoring, kept free of HTTP so it can be tested alone.

/// Minimum similarity for a fuzzy page-name match to be trusted. Low on
/// purpose: page names routinely carry suffixes the input sheet drops
/// ("Acme" vs "Acme Global Official").
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;

/// Case-insensitive name similarity in `[0, 1]`.
///
/// Normalized Levenshtein, so a small typo scores close to 1 while an
/// unrelated name scores close to 0.
pub fn similarity(target: &str, candidate: &str) -> f64 {
    strsim::normalized_levenshtein(&target.to_lowercase(), &candidate.to_lowercase())
}
