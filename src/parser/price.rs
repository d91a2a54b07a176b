use super::trim_text;

const PRICE_KEYWORDS: &[&str] = &["Ticket Price:", "Entry Fee:", "Admission:"];

/// Currency markers accepted inside a price token. Tokens are scanned one
/// char at a time, so multi-char markers such as `US$` or `Rp` never match.
const CURRENCY_SYMBOLS: &[&str] = &["$", "US$", "€", "£", "¥", "₩", "₹", "Rp"];

/// Pull the price token that follows the first price keyword found.
pub fn extract_ticket_price(description: &str) -> Option<String> {
    let (idx, keyword) = PRICE_KEYWORDS
        .iter()
        .find_map(|k| description.find(k).map(|i| (i, *k)))?;

    let rest = trim_text(&description[idx + keyword.len()..]);
    let token: String = rest.chars().take_while(|&c| is_price_char(c)).collect();

    let token = trim_text(&token);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn is_price_char(c: char) -> bool {
    if c.is_ascii_digit() || c == '.' {
        return true;
    }
    let mut buf = [0u8; 4];
    let as_str: &str = c.encode_utf8(&mut buf);
    CURRENCY_SYMBOLS.contains(&as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fee_stops_at_first_non_price_char() {
        assert_eq!(extract_ticket_price("Entry Fee: 15 dollars").as_deref(), Some("15"));
    }

    #[test]
    fn no_keyword_is_none() {
        assert_eq!(extract_ticket_price("No price info"), None);
        assert_eq!(extract_ticket_price("ticket price: 10"), None);
    }

    #[test]
    fn keyword_without_value_is_none() {
        assert_eq!(extract_ticket_price("Admission: free for children"), None);
        assert_eq!(extract_ticket_price("Ticket Price:"), None);
    }

    #[test]
    fn single_char_currency_kept() {
        assert_eq!(
            extract_ticket_price("Ticket Price: €25, Rating: 4.5/5").as_deref(),
            Some("€25")
        );
        assert_eq!(extract_ticket_price("Admission: $12.50 per adult").as_deref(), Some("$12.50"));
        assert_eq!(extract_ticket_price("Entry Fee: ₹500").as_deref(), Some("₹500"));
    }

    #[test]
    fn multi_char_currency_never_matches() {
        assert_eq!(extract_ticket_price("Entry Fee: US$30"), None);
        assert_eq!(extract_ticket_price("Entry Fee: Rp50.000"), None);
        assert_eq!(extract_ticket_price("Entry Fee: 50.000 Rp").as_deref(), Some("50.000"));
    }

    #[test]
    fn keyword_order_wins_over_position() {
        let desc = "Admission: 5, Ticket Price: 20";
        assert_eq!(extract_ticket_price(desc).as_deref(), Some("20"));
    }

    #[test]
    fn first_occurrence_of_keyword_used() {
        let desc = "Entry Fee: none listed. Entry Fee: 8";
        assert_eq!(extract_ticket_price(desc), None);
    }

    #[test]
    fn comma_separated_thousands_truncate() {
        assert_eq!(extract_ticket_price("Entry Fee: ₩1,000").as_deref(), Some("₩1"));
    }
}
