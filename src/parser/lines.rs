use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::price::extract_ticket_price;
use super::rating::extract_rating;
use super::{trim_text, Spot};

static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]+)\.\s").unwrap());

const BULLET_PREFIX: &str = "* ";
const SECTION_MARKERS: &[&str] = &["Tips for Visiting:", "Other Considerations:"];

#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    /// `N. name: description`
    Numbered { number: u64, body: &'a str },
    /// `* name: description`
    Bulleted { body: &'a str },
    Continuation(&'a str),
}

pub fn classify_line(line: &str) -> Line<'_> {
    if let Some(m) = NUMBERED_RE.captures(line) {
        let prefix = m.get(0).map_or(0, |p| p.end());
        // Digit runs too long for u64 saturate instead of failing the line.
        let number = m[1].parse().unwrap_or(u64::MAX);
        return Line::Numbered {
            number,
            body: &line[prefix..],
        };
    }
    if let Some(body) = line.strip_prefix(BULLET_PREFIX) {
        return Line::Bulleted { body };
    }
    Line::Continuation(line)
}

/// Walk the text line by line and collect every `name: description` item.
pub fn extract(text: &str) -> Vec<Spot> {
    let mut spots: Vec<Spot> = Vec::new();
    let mut current_number = 0u64;
    // Continuations only extend a description while this is set. No item
    // path sets it yet, so continuation lines are currently ignored.
    let mut inside_spot = false;

    for line in text.split('\n') {
        match classify_line(line) {
            Line::Numbered { number, body } => {
                current_number = number;
                push_item(&mut spots, body, current_number);
                inside_spot = false;
            }
            Line::Bulleted { body } => {
                push_item(&mut spots, body, current_number);
                inside_spot = false;
            }
            Line::Continuation(raw) if inside_spot => {
                let trimmed = trim_text(raw);
                if trimmed.is_empty() || SECTION_MARKERS.iter().any(|m| raw.contains(m)) {
                    continue;
                }
                if let Some(last) = spots.last_mut() {
                    last.description.push(' ');
                    last.description.push_str(trimmed);
                }
            }
            Line::Continuation(_) => {}
        }
    }

    spots
}

fn push_item(spots: &mut Vec<Spot>, body: &str, number: u64) {
    let Some((name, description)) = split_item(body) else {
        debug!(line = body, "skipping item without exactly one ':'");
        return;
    };
    let ticket_price = extract_ticket_price(&description);
    let rating = extract_rating(&description);
    spots.push(Spot {
        name,
        description,
        number,
        ticket_price,
        rating,
    });
}

/// Split `name: description`. Any other number of `:` rejects the item.
fn split_item(body: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    Some((clean(parts[0]), clean(parts[1])))
}

fn clean(raw: &str) -> String {
    trim_text(&trim_text(raw).replace('*', "")).to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap()
    }

    #[test]
    fn classifies_item_starts() {
        assert_eq!(
            classify_line("12. Colosseum: Ancient arena"),
            Line::Numbered { number: 12, body: "Colosseum: Ancient arena" }
        );
        assert_eq!(
            classify_line("* Louvre: Museum"),
            Line::Bulleted { body: "Louvre: Museum" }
        );
        assert_eq!(classify_line("*Louvre: Museum"), Line::Continuation("*Louvre: Museum"));
        assert_eq!(classify_line("1.Louvre: Museum"), Line::Continuation("1.Louvre: Museum"));
        assert_eq!(classify_line("  1. Indented"), Line::Continuation("  1. Indented"));
    }

    #[test]
    fn empty_input_has_no_spots() {
        assert!(extract("").is_empty());
        assert!(extract("\n\n").is_empty());
    }

    #[test]
    fn keywords_without_colon_do_not_match() {
        let spots = extract("1. **Tower Bridge**: Iconic bridge, Ticket Price $12.50 and Rated 4.7/5");
        assert_eq!(spots.len(), 1);
        let s = &spots[0];
        assert_eq!(s.name, "Tower Bridge");
        assert_eq!(s.description, "Iconic bridge, Ticket Price $12.50 and Rated 4.7/5");
        assert_eq!(s.number, 1);
        // Keywords carry their own colon, which a two-part item cannot contain.
        assert_eq!(s.ticket_price, None);
        assert_eq!(s.rating, None);
    }

    #[test]
    fn extra_colons_drop_the_item() {
        let spots = extract("1. Eiffel Tower: A landmark. Ticket Price: €25, Rating: 4.5/5");
        assert!(spots.is_empty());
    }

    #[test]
    fn line_without_colon_still_updates_number() {
        let spots = extract("2. A place with no colon\n* Louvre: World-famous museum");
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].name, "Louvre");
        assert_eq!(spots[0].number, 2);
    }

    #[test]
    fn bullet_before_any_number_is_zero() {
        let spots = extract("* Louvre: World-famous museum");
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].number, 0);
        assert_eq!(spots[0].description, "World-famous museum");
    }

    #[test]
    fn continuation_lines_are_not_appended() {
        let spots = extract("1. Louvre: Museum\nHome of the Mona Lisa\n\nTips for Visiting: go early");
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].description, "Museum");
    }

    #[test]
    fn asterisks_stripped_and_trimmed() {
        let spots = extract("3.   ***Sagrada Família*** :  **Gaudí's** basilica  ");
        assert_eq!(spots[0].name, "Sagrada Família");
        assert_eq!(spots[0].description, "Gaudí's basilica");
    }

    #[test]
    fn empty_description_is_kept() {
        let spots = extract("4. Park Güell:");
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].description, "");
    }

    #[test]
    fn paris_fixture() {
        let spots = extract(&fixture("paris"));
        let names: Vec<&str> = spots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Eiffel Tower", "Louvre Museum", "Seine Cruise", "Montmartre", "Musée d'Orsay"]
        );
        assert_eq!(spots[0].number, 1);
        assert_eq!(spots[2].number, 2);
        assert_eq!(spots[4].number, 4);
    }

    #[test]
    fn bali_fixture_keeps_order_and_duplicates() {
        let spots = extract(&fixture("bali"));
        assert_eq!(spots.len(), 3);
        assert_eq!(spots[0].name, "Uluwatu Temple");
        assert_eq!(spots[2].name, "Uluwatu Temple");
        assert!(spots.iter().all(|s| s.number == 0));
    }

    #[test]
    fn record_count_bounded_by_item_lines() {
        for name in ["paris", "bali", "prose"] {
            let text = fixture(name);
            let item_lines = text
                .split('\n')
                .filter(|l| !matches!(classify_line(l), Line::Continuation(_)))
                .count();
            assert!(extract(&text).len() <= item_lines);
        }
    }

    #[test]
    fn prose_fixture_has_no_spots() {
        assert!(extract(&fixture("prose")).is_empty());
    }

    #[test]
    fn extraction_is_repeatable() {
        let text = fixture("paris");
        assert_eq!(extract(&text), extract(&text));
    }

    #[test]
    fn large_index_kept() {
        let spots = extract("4294967296. Somewhere: far away\n* Nearby: close");
        assert_eq!(spots[0].number, 4_294_967_296);
        assert_eq!(spots[1].number, 4_294_967_296);
    }

    #[test]
    fn huge_index_saturates() {
        let spots = extract("99999999999999999999999. Somewhere: far away");
        assert_eq!(spots[0].number, u64::MAX);
    }

    #[test]
    fn byte_order_marks_trimmed() {
        let spots = extract("1. \u{feff}Louvre\u{feff}: \u{feff}Museum \u{feff}");
        assert_eq!(spots[0].name, "Louvre");
        assert_eq!(spots[0].description, "Museum");
    }
}
