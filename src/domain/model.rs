use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Raw card text read from the game view before decoding, e.g. `"10H"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardToken(String);

impl CardToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for CardToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Card value, 1 (Ace) through 13 (King).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const ACE: Rank = Rank(1);
    pub const SEVEN: Rank = Rank(7);
    pub const TEN: Rank = Rank(10);
    pub const JACK: Rank = Rank(11);
    pub const QUEEN: Rank = Rank(12);
    pub const KING: Rank = Rank(13);

    pub fn new(value: u8) -> Option<Self> {
        (1..=13).contains(&value).then_some(Rank(value))
    }

    /// 對照表：A, 2..10, J, Q, K（不分大小寫）
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_uppercase().as_str() {
            "A" => Some(Rank::ACE),
            "J" => Some(Rank::JACK),
            "Q" => Some(Rank::QUEEN),
            "K" => Some(Rank::KING),
            // 只接受 "2".."10"，排除 "02"、"+5" 之類的寫法
            digits
                if (1..=2).contains(&digits.len())
                    && !digits.starts_with('0')
                    && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                digits
                    .parse::<u8>()
                    .ok()
                    .filter(|n| (2..=10).contains(n))
                    .map(Rank)
            }
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        const SYMBOLS: [&str; 13] = [
            "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
        ];
        SYMBOLS[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Suit {
    #[serde(rename = "S")]
    Spades,
    #[serde(rename = "H")]
    Hearts,
    #[serde(rename = "D")]
    Diamonds,
    #[serde(rename = "C")]
    Clubs,
}

impl Suit {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'S' => Some(Suit::Spades),
            'H' => Some(Suit::Hearts),
            'D' => Some(Suit::Diamonds),
            'C' => Some(Suit::Clubs),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Suit::Spades => 'S',
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
        }
    }

    pub fn color(self) -> Color {
        match self {
            Suit::Spades | Suit::Clubs => Color::Black,
            Suit::Hearts | Suit::Diamonds => Color::Red,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

/// Lucky 7 outcome of a drawn card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoundResult {
    #[serde(rename = "below7")]
    Below7,
    #[serde(rename = "seven")]
    Seven,
    #[serde(rename = "above7")]
    Above7,
}

impl RoundResult {
    pub fn of(rank: Rank) -> Self {
        match rank.cmp(&Rank::SEVEN) {
            std::cmp::Ordering::Less => RoundResult::Below7,
            std::cmp::Ordering::Equal => RoundResult::Seven,
            std::cmp::Ordering::Greater => RoundResult::Above7,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoundResult::Below7 => "below7",
            RoundResult::Seven => "seven",
            RoundResult::Above7 => "above7",
        })
    }
}

/// A decoded card. The color is derived from the suit, so it is always consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn color(&self) -> Color {
        self.suit.color()
    }

    pub fn result(&self) -> RoundResult {
        RoundResult::of(self.rank)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// One CSV row. Field order is the column order of the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedRow {
    pub ts_utc: DateTime<Utc>,
    pub round_id: Option<String>,
    pub rank: Rank,
    pub suit_key: Suit,
    pub color: Color,
    pub result: RoundResult,
}

impl ScrapedRow {
    pub fn new(ts_utc: DateTime<Utc>, round_id: Option<String>, card: Card) -> Self {
        Self {
            ts_utc,
            round_id,
            rank: card.rank,
            suit_key: card.suit,
            color: card.color(),
            result: card.result(),
        }
    }
}
