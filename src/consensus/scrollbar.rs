//! Scrollbar decoding
//!
//! A scrollbar renders as a leading unit caption, alternating key/value
//! readings, and a trailing unit caption:
//!
//! ```text
//! "v", "12,3", "45,6", "bar"   ->   pair 0 = (12,3 -> 45,6)
//! ```
//!
//! Pairs are positional. A garbled reading drops its own pair but never shifts
//! the index of the pairs after it.

use crate::capture::Token;

use super::filter::{detect_unit, is_numeric_token, END_UNITS, START_UNITS};

/// One (key, value) reading at a given position of the scrollbar list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbarPair {
    /// 0-based pair position
    pub index: usize,
    pub key: String,
    pub value: String,
}

impl ScrollbarPair {
    /// Voting form `key:value`
    pub fn joined(&self) -> String {
        format!("{}:{}", self.key, self.value)
    }
}

/// Token list with its bracketing unit captions removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimmedTokens {
    pub tokens: Vec<String>,
    /// Canonical start keyword of the dropped leading caption
    pub start_unit: Option<&'static str>,
    /// Canonical end keyword of the dropped trailing caption
    pub end_unit: Option<&'static str>,
}

/// Render tokens, drop empties, and strip the leading/trailing unit captions
pub fn trim_units(tokens: &[Token]) -> TrimmedTokens {
    let mut rendered: Vec<String> = tokens
        .iter()
        .map(Token::render)
        .filter(|t| !t.is_empty())
        .collect();

    let start_unit = rendered.first().and_then(|t| detect_unit(t, &START_UNITS));
    if start_unit.is_some() {
        rendered.remove(0);
    }

    let end_unit = rendered.last().and_then(|t| detect_unit(t, &END_UNITS));
    if end_unit.is_some() {
        rendered.pop();
    }

    TrimmedTokens {
        tokens: rendered,
        start_unit,
        end_unit,
    }
}

/// Flattened `"; "`-joined form used as the field's history entry
pub fn representative(tokens: &[Token]) -> String {
    trim_units(tokens).tokens.join("; ")
}

/// Decode the positional key/value pairs of one scrollbar reading
pub fn decode_pairs(tokens: &[Token]) -> Vec<ScrollbarPair> {
    let trimmed = trim_units(tokens);

    trimmed
        .tokens
        .chunks_exact(2)
        .enumerate()
        .filter(|(_, pair)| is_numeric_token(&pair[0]) && is_numeric_token(&pair[1]))
        .map(|(index, pair)| ScrollbarPair {
            index,
            key: pair[0].clone(),
            value: pair[1].clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<Token> {
        raw.iter().map(|s| Token::from(*s)).collect()
    }

    #[test]
    fn test_decode_with_captions() {
        let pairs = decode_pairs(&tokens(&["v", "1,0", "2,0", "3,0", "4,0", "bar"]));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].index, 0);
        assert_eq!(pairs[0].joined(), "1,0:2,0");
        assert_eq!(pairs[1].index, 1);
        assert_eq!(pairs[1].joined(), "3,0:4,0");
    }

    #[test]
    fn test_trailing_unpaired_token_discarded() {
        let pairs = decode_pairs(&tokens(&["1,0", "2,0", "3,0"]));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].joined(), "1,0:2,0");
    }

    #[test]
    fn test_garbled_pair_keeps_positions() {
        let pairs = decode_pairs(&tokens(&["v", "1,0", "2a0", "3,0", "4,0", "cm"]));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].index, 1);
        assert_eq!(pairs[0].joined(), "3,0:4,0");
    }

    #[test]
    fn test_entirely_garbled_yields_nothing() {
        assert!(decode_pairs(&tokens(&["v", "abc", "def", "s"])).is_empty());
        assert!(decode_pairs(&[]).is_empty());
        assert!(decode_pairs(&tokens(&["", "  "])).is_empty());
    }

    #[test]
    fn test_numbers_render_two_decimals() {
        let raw = vec![Token::Number(1.0), Token::Number(2.5), Token::Text("m/s".into())];
        let pairs = decode_pairs(&raw);
        assert_eq!(pairs[0].joined(), "1.00:2.50");
    }

    #[test]
    fn test_trim_units_reports_captions() {
        let trimmed = trim_units(&tokens(&["P", "1,0", "2,0", "Bar"]));
        assert_eq!(trimmed.start_unit, Some("p"));
        assert_eq!(trimmed.end_unit, Some("bar"));
        assert_eq!(trimmed.tokens, vec!["1,0", "2,0"]);
    }

    #[test]
    fn test_representative() {
        assert_eq!(
            representative(&tokens(&["v", "1,0", "2,0", "bar"])),
            "1,0; 2,0"
        );
        assert_eq!(representative(&tokens(&["v", "bar"])), "");
    }
}
