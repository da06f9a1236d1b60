use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mixer::CardId;

/// Per-card mixer state. Keys are `"{control}_{cid}"`, so two controls
/// sharing a name on the same card keep separate flags.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerSettings {
    cards: BTreeMap<CardId, BTreeMap<String, bool>>,
}

impl MixerSettings {
    /// The stored lock flag, or `None` when the control was never saved.
    pub fn lock(&self, card: CardId, key: &str) -> Option<bool> {
        self.cards.get(&card).and_then(|c| c.get(key)).copied()
    }

    /// Store a lock flag. Returns whether the stored value changed.
    pub fn set_lock(&mut self, card: CardId, key: &str, lock: bool) -> bool {
        let controls = self.cards.entry(card).or_insert_with(BTreeMap::new);
        match controls.insert(key.to_string(), lock) {
            Some(previous) => previous != lock,
            None => true,
        }
    }
}
