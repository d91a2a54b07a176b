use serde::Serialize;

use crate::parser::Spot;

/// Only this many spots are shown in chat and in the results panel.
pub const RESULT_LIMIT: usize = 7;

const CHAT_HEADER: &str = "Here are some places:";
const NO_SPOTS_CHAT: &str = "No tourism spots found.";
const NO_SPOTS_PANEL: &str = "No relevant tourism spots found.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    pub name: String,
    pub description: String,
    pub ticket_info: String,
    pub rating_info: String,
}

fn ticket_info(spot: &Spot) -> String {
    match spot.ticket_price.as_deref() {
        Some(p) if !p.is_empty() => format!("Ticket Price: {}", p),
        _ => "Free Entry".to_string(),
    }
}

// A zero score is shown as missing, same as no score.
fn rating_info(spot: &Spot) -> String {
    match spot.rating {
        Some(r) if r != 0.0 && !r.is_nan() => format!("Rating: {}/5", r),
        _ => "Rating not available".to_string(),
    }
}

/// Chat reply for the first `RESULT_LIMIT` spots. Numbering follows position
/// in the slice, so a skipped spot leaves a gap.
pub fn chat_message(spots: &[Spot]) -> String {
    let mut out = format!("{}\n", CHAT_HEADER);
    let mut rendered = 0;

    for (i, spot) in spots.iter().take(RESULT_LIMIT).enumerate() {
        if spot.name.is_empty() || spot.description.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{}. {}: {} - {}, {}\n\n",
            i + 1,
            spot.name.replace('*', ""),
            spot.description.replace('*', ""),
            ticket_info(spot),
            rating_info(spot),
        ));
        rendered += 1;
    }

    if rendered == 0 {
        NO_SPOTS_CHAT.to_string()
    } else {
        out.trim_end().to_string()
    }
}

pub fn result_cards(spots: &[Spot]) -> Vec<ResultCard> {
    spots
        .iter()
        .take(RESULT_LIMIT)
        .map(|s| ResultCard {
            name: s.name.clone(),
            description: s.description.clone(),
            ticket_info: ticket_info(s),
            rating_info: rating_info(s),
        })
        .collect()
}

/// Terminal rendition of the results panel.
pub fn cards_text(cards: &[ResultCard]) -> String {
    if cards.is_empty() {
        return NO_SPOTS_PANEL.to_string();
    }
    cards
        .iter()
        .map(|c| {
            format!(
                "── {} ──\n{}\n{}\n{}",
                c.name, c.description, c.ticket_info, c.rating_info
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
