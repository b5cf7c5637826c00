//! Domain key normalization.

/// Canonical lookup key for a raw domain string.
///
/// Lower-cases, trims, then keeps only the text before the first `/`. This
/// is a textual split, not a URL parse: `"https://x.com"` becomes `"https:"`.
/// The result may be empty; callers reject that before touching the store.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let trimmed = lowered.trim();
    match trimmed.split_once('/') {
        Some((head, _)) => head.to_string(),
        None => trimmed.to_string(),
    }
}
