use std::sync::LazyLock;

use regex::Regex;

use super::trim_text;

static OUT_OF_FIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(\.[0-9])?)/5").unwrap());

const RATING_KEYWORDS: &[&str] = &["Rating:", "Rated:"];

/// Parse the `<n>/5` score following the first rating keyword found.
pub fn extract_rating(description: &str) -> Option<f64> {
    let (idx, keyword) = RATING_KEYWORDS
        .iter()
        .find_map(|k| description.find(k).map(|i| (i, *k)))?;

    let rest = trim_text(&description[idx + keyword.len()..]);
    let caps = OUT_OF_FIVE_RE.captures(rest)?;
    caps[1].parse().ok()
}
