//! Pure extraction from an HTML snapshot of the game page.

use crate::core::token::{is_face_down, token_from_image_url};
use crate::domain::model::CardToken;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Places the open card is rendered, most specific first.
const CARD_IMAGE_QUERIES: [&str; 6] = [
    "div.casino-video-cards div.flip-card-back img",
    "div.flip-card-inner div.flip-card-back img",
    "div.lucky7-open img",
    "img.open-card-image",
    "div.casino-video-cards img",
    "div.flip-card-container img",
];

const ROUND_ID_QUERIES: [&str; 4] = [".round-id", ".casino-round-id", "span.roundId", "div.round-id"];

fn selectors(queries: &[&str]) -> Vec<Selector> {
    queries
        .iter()
        .map(|q| Selector::parse(q).unwrap())
        .collect()
}

static CARD_IMAGE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&CARD_IMAGE_QUERIES));
static ROUND_ID_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| selectors(&ROUND_ID_QUERIES));
static ANY_IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// What one poll needs from the page, extracted in a single parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub card_image_urls: Vec<String>,
    pub round_id: Option<String>,
}

impl PageSnapshot {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            card_image_urls: card_image_urls(&document),
            round_id: round_id(&document),
        }
    }

    /// First card image that yields a token.
    pub fn card_token(&self) -> Option<CardToken> {
        self.card_image_urls
            .iter()
            .find_map(|src| token_from_image_url(src))
    }

    /// Falls back to the first depth-1 frame document showing a card when
    /// the page itself shows none. A frame without its own round id keeps
    /// the page's.
    pub fn or_frames(self, frame_documents: &[String]) -> Self {
        if self.card_token().is_some() {
            return self;
        }

        let frame = frame_documents
            .iter()
            .filter(|html| !html.trim().is_empty())
            .map(|html| PageSnapshot::parse(html))
            .find(|frame| frame.card_token().is_some());

        match frame {
            Some(frame) => PageSnapshot {
                round_id: frame.round_id.or(self.round_id),
                card_image_urls: frame.card_image_urls,
            },
            None => self,
        }
    }
}

fn card_image_urls(document: &Html) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for selector in CARD_IMAGE_SELECTORS.iter() {
        for img in document.select(selector) {
            let src = img.value().attr("src").unwrap_or_default().trim();
            let alt = img.value().attr("alt").unwrap_or_default().trim();
            if src.is_empty() || alt.eq_ignore_ascii_case("closed") || is_face_down(src) {
                continue;
            }
            if !urls.iter().any(|u| u == src) {
                urls.push(src.to_string());
            }
        }
    }

    // 其他看起來像牌面的圖片
    for img in document.select(&ANY_IMAGE) {
        let src = img.value().attr("src").unwrap_or_default().trim();
        if src.is_empty() || is_face_down(src) || !src.to_lowercase().contains("card") {
            continue;
        }
        if !urls.iter().any(|u| u == src) {
            urls.push(src.to_string());
        }
    }

    urls
}

fn round_id(document: &Html) -> Option<String> {
    ROUND_ID_SELECTORS.iter().find_map(|selector| {
        document.select(selector).find_map(|el| {
            let text = el.text().collect::<String>();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
    })
}
