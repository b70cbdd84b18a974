use crate::domain::model::Card;

/// The (card, round id) pair used to tell two polls of the same round apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub card: Card,
    pub round_id: Option<String>,
}

/// Remembers the last emitted signature so an unchanged page is written once.
#[derive(Debug, Default)]
pub struct RoundDeduplicator {
    last: Option<Signature>,
}

impl RoundDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set: returns true when `(card, round_id)` differs from the
    /// last emitted signature, and records it as the new one in that case.
    ///
    /// Without a round id this reduces to "the card value changed".
    pub fn should_emit(&mut self, card: &Card, round_id: Option<&str>) -> bool {
        let unchanged = self
            .last
            .as_ref()
            .is_some_and(|last| last.card == *card && last.round_id.as_deref() == round_id);
        if unchanged {
            return false;
        }

        self.last = Some(Signature {
            card: *card,
            round_id: round_id.map(str::to_string),
        });
        true
    }

    pub fn last(&self) -> Option<&Signature> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::decode;

    #[test]
    fn test_first_call_always_emits() {
        let mut dedup = RoundDeduplicator::new();
        assert!(dedup.last().is_none());
        assert!(dedup.should_emit(&decode("AS").unwrap(), None));
        assert_eq!(dedup.last().unwrap().card, decode("AS").unwrap());
    }

    #[test]
    fn test_identical_signature_emits_once() {
        let mut dedup = RoundDeduplicator::new();
        let card = decode("7H").unwrap();
        assert!(dedup.should_emit(&card, Some("101")));
        assert!(!dedup.should_emit(&card, Some("101")));
        assert!(!dedup.should_emit(&card, Some("101")));
    }

    #[test]
    fn test_new_round_with_same_card_emits() {
        let mut dedup = RoundDeduplicator::new();
        let card = decode("QC").unwrap();
        assert!(dedup.should_emit(&card, Some("1")));
        assert!(dedup.should_emit(&card, Some("2")));
        assert_eq!(dedup.last().unwrap().round_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_without_round_id_card_change_decides() {
        let mut dedup = RoundDeduplicator::new();
        assert!(dedup.should_emit(&decode("2S").unwrap(), None));
        assert!(!dedup.should_emit(&decode("2S").unwrap(), None));
        assert!(dedup.should_emit(&decode("2D").unwrap(), None));
    }

    #[test]
    fn test_suppressed_call_keeps_signature() {
        let mut dedup = RoundDeduplicator::new();
        let card = decode("KS").unwrap();
        dedup.should_emit(&card, Some("9"));
        dedup.should_emit(&card, Some("9"));
        assert_eq!(
            dedup.last(),
            Some(&Signature {
                card,
                round_id: Some("9".to_string())
            })
        );
    }
}
