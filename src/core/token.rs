//! Card tokens from card image sources.
//!
//! The game view shows the drawn card as an image, so the token is recovered
//! from the image `src` (or a class string) rather than from visible text.

use crate::domain::model::CardToken;
use regex::Regex;
use std::sync::LazyLock;

/// Substrings marking a face-down card image.
///
/// Patterns below fold case for ASCII only, so every captured symbol is a
/// single byte.
pub const CLOSED_HINTS: [&str; 5] = ["closed", "back", "backside", "card-back", "1_card_20_20"];

static PAT_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?i-u:(A|K|Q|J|10|[2-9])([SHDC])\.(?:png|jpg|jpeg|webp))\b").unwrap()
});
static PAT_DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?i-u:(A|K|Q|J|10|[2-9])(SS|HH|DD|CC)\.(?:png|jpg|jpeg|webp))\b").unwrap()
});
static PAT_WORDY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u:(ace|king|queen|jack|10|[2-9])).*?(?i-u:(spade|heart|diamond|club))").unwrap()
});
static PAT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u:rank[-_ ]?(A|K|Q|J|10|[2-9])).*?(?i-u:suit[-_ ]?([shdc]))").unwrap()
});

pub fn is_face_down(src: &str) -> bool {
    let low = src.to_lowercase();
    CLOSED_HINTS.iter().any(|hint| low.contains(hint))
}

/// Recognises a card in an image URL such as `/img/cards/10H.png`.
///
/// Returns a canonical token (`"10H"`) for the decoder, or `None` for
/// face-down or unrecognised images.
pub fn token_from_image_url(src: &str) -> Option<CardToken> {
    if is_face_down(src) {
        return None;
    }

    if let Some(caps) = PAT_SIMPLE.captures(src) {
        return Some(canonical(&caps[1], &caps[2]));
    }

    if let Some(caps) = PAT_DOUBLE.captures(src) {
        // 第二個花色字母只是重複
        return Some(canonical(&caps[1], &caps[2]));
    }

    if let Some(caps) = PAT_WORDY.captures(src) {
        let rank = match caps[1].to_ascii_uppercase().as_str() {
            "ACE" => "A".to_string(),
            "KING" => "K".to_string(),
            "QUEEN" => "Q".to_string(),
            "JACK" => "J".to_string(),
            digits => digits.to_string(),
        };
        return Some(canonical(&rank, &caps[2]));
    }

    PAT_CLASS
        .captures(src)
        .map(|caps| canonical(&caps[1], &caps[2]))
}

/// `suit` may be a whole word or a doubled letter; only its first letter counts.
fn canonical(rank: &str, suit: &str) -> CardToken {
    let suit: String = suit.chars().take(1).collect();
    CardToken::new(format!("{}{}", rank.to_ascii_uppercase(), suit.to_ascii_uppercase()))
}
