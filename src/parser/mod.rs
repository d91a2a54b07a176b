pub mod lines;
pub mod price;
pub mod rating;

use serde::{Deserialize, Serialize};

/// One tourism spot pulled out of a generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub name: String,
    pub description: String,
    /// Last numbered-list index seen when the spot was created (0 if none).
    pub number: u64,
    pub ticket_price: Option<String>,
    pub rating: Option<f64>,
}

/// Trim whitespace and byte-order marks, which generated text sometimes carries.
pub(crate) fn trim_text(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Single-pass pipeline: generated text → classified lines → spots.
pub fn process_response(text: &str) -> Vec<Spot> {
    lines::extract(text)
}
