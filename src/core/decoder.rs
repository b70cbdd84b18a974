use crate::domain::model::{Card, Rank, Suit};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty card token")]
    Empty,

    #[error("unrecognized rank symbol '{0}'")]
    UnknownRank(String),

    #[error("unrecognized suit symbol '{0}'")]
    UnknownSuit(char),
}

/// Decodes a raw token such as `"AS"`, `" 10h "` or `"KD"` into a [`Card`].
///
/// The last character is the suit symbol and everything before it is the
/// rank symbol, so `"10"` is read as a two-character rank.
pub fn decode(token: &str) -> Result<Card, ParseError> {
    let token = token.trim();
    let mut chars = token.chars();
    let suit_symbol = chars.next_back().ok_or(ParseError::Empty)?;
    let rank_symbol = chars.as_str();

    let suit = Suit::from_symbol(suit_symbol).ok_or(ParseError::UnknownSuit(suit_symbol))?;
    let rank = Rank::from_symbol(rank_symbol)
        .ok_or_else(|| ParseError::UnknownRank(rank_symbol.to_string()))?;

    Ok(Card::new(rank, suit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Color;

    const RANKS: [(&str, u8); 13] = [
        ("A", 1),
        ("2", 2),
        ("3", 3),
        ("4", 4),
        ("5", 5),
        ("6", 6),
        ("7", 7),
        ("8", 8),
        ("9", 9),
        ("10", 10),
        ("J", 11),
        ("Q", 12),
        ("K", 13),
    ];

    #[test]
    fn test_decode_known_cards() {
        let ace = decode("AS").unwrap();
        assert_eq!(ace.rank.value(), 1);
        assert_eq!(ace.suit, Suit::Spades);
        assert_eq!(ace.color(), Color::Black);

        let ten = decode("10h").unwrap();
        assert_eq!(ten.rank.value(), 10);
        assert_eq!(ten.suit, Suit::Hearts);
        assert_eq!(ten.color(), Color::Red);

        let king = decode("KD").unwrap();
        assert_eq!(king.rank.value(), 13);
        assert_eq!(king.suit, Suit::Diamonds);
        assert_eq!(king.color(), Color::Red);
    }

    #[test]
    fn test_decode_every_card_any_case_and_padding() {
        let suits = [('S', Color::Black), ('H', Color::Red), ('D', Color::Red), ('C', Color::Black)];
        for (symbol, value) in RANKS {
            for (suit, color) in suits {
                for token in [
                    format!("{}{}", symbol, suit),
                    format!("  {}{}\t", symbol.to_lowercase(), suit.to_ascii_lowercase()),
                    format!("\n{}{} ", symbol, suit.to_ascii_lowercase()),
                ] {
                    let card = decode(&token).unwrap_or_else(|e| panic!("{:?}: {}", token, e));
                    assert_eq!(card.rank.value(), value, "token {:?}", token);
                    assert_eq!(card.suit.key(), suit, "token {:?}", token);
                    assert_eq!(card.color(), color, "token {:?}", token);
                }
            }
        }
    }

    #[test]
    fn test_decode_rejects_empty_tokens() {
        assert_eq!(decode(""), Err(ParseError::Empty));
        assert_eq!(decode("   \t"), Err(ParseError::Empty));
    }

    #[test]
    fn test_decode_rejects_unknown_symbols() {
        assert_eq!(decode("1Z"), Err(ParseError::UnknownSuit('Z')));
        assert_eq!(decode("1S"), Err(ParseError::UnknownRank("1".to_string())));
        assert_eq!(decode("11H"), Err(ParseError::UnknownRank("11".to_string())));
        assert_eq!(decode("S"), Err(ParseError::UnknownRank(String::new())));
        assert_eq!(decode("10"), Err(ParseError::UnknownSuit('0')));
        assert!(decode("A S").is_err());
        assert!(decode("AX").is_err());
    }

    #[test]
    fn test_decode_is_idempotent() {
        for token in ["QC", " 7d", "10S", "bogus"] {
            assert_eq!(decode(token), decode(token));
        }
    }
}
