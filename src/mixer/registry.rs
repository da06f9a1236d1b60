//! Sound card and mixer element enumeration.

use std::rc::Rc;

use tracing::{debug, warn};

use super::backend::{CardInfo, MixerBackend};
use super::CardId;

pub struct CardRegistry {
    backend: Rc<dyn MixerBackend>,
}

impl CardRegistry {
    pub fn new(backend: Rc<dyn MixerBackend>) -> Self {
        Self { backend }
    }

    /// All cards in driver index order. A card whose controls all lack
    /// volume capability keeps its slot but loses its name, so indices
    /// stay aligned with the driver enumeration.
    pub fn cards(&self) -> Vec<CardInfo> {
        let mut cards = self.backend.cards();
        for card in cards.iter_mut() {
            if self.mixer_elements(card.index).is_empty() {
                debug!("card hw:{} has no usable mixer elements", card.index);
                card.name = None;
            }
        }
        cards
    }

    /// `(control name, instance id)` pairs for one card, in enumeration
    /// order. Instance ids count repeated names from zero in first-seen
    /// order; elements without any volume capability are skipped.
    pub fn mixer_elements(&self, card: CardId) -> Vec<(String, u32)> {
        let elems = match self.backend.elems(card) {
            Ok(elems) => elems,
            Err(e) => {
                warn!("can't enumerate mixer elements on hw:{}: {}", card, e);
                return Vec::new();
            }
        };
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for elem in elems {
            if !elem.caps.usable() {
                continue;
            }
            let cid = seen.iter().filter(|name| **name == elem.name).count() as u32;
            out.push((elem.name.clone(), cid));
            seen.push(elem.name);
        }
        out
    }
}
