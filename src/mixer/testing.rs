//! In-memory mixer backend for exercising the engine without hardware.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::backend::{CardInfo, ElemAddr, ElemInfo, MixerBackend, MixerHandle, VolumeCaps};
use super::control::{ChangeObserver, ChangeOrigin};
use super::{CardId, Volume};
use crate::error::MixerError;

#[derive(Clone, Debug)]
pub struct FakeElem {
    pub name: String,
    pub caps: VolumeCaps,
    pub volume: Vec<Volume>,
    /// `None` marks an element without a hardware mute switch.
    pub mute: Option<bool>,
    /// When set, `set_mute` reports success but the switch does not move.
    pub stuck_mute: bool,
    pub recording: Option<bool>,
    /// Simulates a vanished control: opens and reads fail.
    pub missing: bool,
}

impl FakeElem {
    pub fn stereo(name: &str) -> Self {
        Self {
            name: name.to_string(),
            caps: VolumeCaps {
                playback: true,
                capture: false,
            },
            volume: vec![50, 50],
            mute: Some(false),
            stuck_mute: false,
            recording: None,
            missing: false,
        }
    }

    pub fn mono(name: &str) -> Self {
        let mut elem = Self::stereo(name);
        elem.volume = vec![50];
        elem
    }
}

#[derive(Debug, Default)]
pub struct FakeCard {
    pub name: Option<String>,
    pub elems: Vec<FakeElem>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub cards: BTreeMap<CardId, FakeCard>,
}

impl FakeState {
    fn elem(&self, addr: &ElemAddr) -> Option<&FakeElem> {
        let card = self.cards.get(&addr.card)?;
        card.elems
            .iter()
            .filter(|e| e.name == addr.control)
            .nth(addr.cid as usize)
    }

    fn elem_mut(&mut self, addr: &ElemAddr) -> Option<&mut FakeElem> {
        let card = self.cards.get_mut(&addr.card)?;
        card.elems
            .iter_mut()
            .filter(|e| e.name == addr.control)
            .nth(addr.cid as usize)
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBackend {
    /// One card with one element; returns the backend and the element's
    /// address.
    pub fn single(elem: FakeElem) -> (Self, ElemAddr) {
        let backend = Self::default();
        let addr = backend.add_elem(0, elem);
        (backend, addr)
    }

    pub fn add_elem(&self, card: CardId, elem: FakeElem) -> ElemAddr {
        let mut state = self.state.borrow_mut();
        let entry = state.cards.entry(card).or_insert_with(|| FakeCard {
            name: Some(format!("Fake Card {}", card)),
            elems: Vec::new(),
        });
        let cid = entry
            .elems
            .iter()
            .filter(|e| e.name == elem.name)
            .count() as u32;
        let addr = ElemAddr::new(card, elem.name.clone(), cid);
        entry.elems.push(elem);
        addr
    }

    /// Mutate the "hardware" behind the engine's back.
    pub fn with_elem<R>(&self, addr: &ElemAddr, f: impl FnOnce(&mut FakeElem) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let elem = state.elem_mut(addr).expect("no such element");
        f(elem)
    }
}

impl MixerBackend for FakeBackend {
    fn cards(&self) -> Vec<CardInfo> {
        self.state
            .borrow()
            .cards
            .iter()
            .map(|(index, card)| CardInfo {
                index: *index,
                name: card.name.clone(),
            })
            .collect()
    }

    fn elems(&self, card: CardId) -> Result<Vec<ElemInfo>, MixerError> {
        let state = self.state.borrow();
        let card = state
            .cards
            .get(&card)
            .ok_or_else(|| MixerError::HardwareUnavailable(format!("hw:{}", card)))?;
        Ok(card
            .elems
            .iter()
            .map(|e| ElemInfo {
                name: e.name.clone(),
                caps: e.caps,
            })
            .collect())
    }

    fn open(&self, addr: &ElemAddr) -> Result<Box<dyn MixerHandle>, MixerError> {
        let (card_name, channel_count, caps) = {
            let state = self.state.borrow();
            let elem = state
                .elem(addr)
                .ok_or_else(|| MixerError::HardwareUnavailable(addr.to_string()))?;
            if elem.missing {
                return Err(MixerError::HardwareUnavailable(addr.to_string()));
            }
            let card_name = state
                .cards
                .get(&addr.card)
                .and_then(|c| c.name.clone())
                .unwrap_or_default();
            (card_name, elem.volume.len(), elem.caps)
        };
        Ok(Box::new(FakeHandle {
            backend: self.clone(),
            addr: addr.clone(),
            card_name,
            channel_count,
            caps,
        }))
    }
}

struct FakeHandle {
    backend: FakeBackend,
    addr: ElemAddr,
    card_name: String,
    channel_count: usize,
    caps: VolumeCaps,
}

impl FakeHandle {
    fn read<R>(&self, f: impl FnOnce(&FakeElem) -> R) -> Result<R, MixerError> {
        let state = self.backend.state.borrow();
        let elem = state
            .elem(&self.addr)
            .ok_or_else(|| MixerError::HardwareUnavailable(self.addr.to_string()))?;
        if elem.missing {
            return Err(MixerError::HardwareUnavailable(self.addr.to_string()));
        }
        Ok(f(elem))
    }

    fn write<R>(&self, f: impl FnOnce(&mut FakeElem) -> R) -> Result<R, MixerError> {
        let mut state = self.backend.state.borrow_mut();
        let elem = state
            .elem_mut(&self.addr)
            .ok_or_else(|| MixerError::HardwareUnavailable(self.addr.to_string()))?;
        if elem.missing {
            return Err(MixerError::HardwareUnavailable(self.addr.to_string()));
        }
        Ok(f(elem))
    }
}

impl MixerHandle for FakeHandle {
    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn card_name(&self) -> &str {
        &self.card_name
    }

    fn caps(&self) -> VolumeCaps {
        self.caps
    }

    fn volume(&self) -> Result<Vec<Volume>, MixerError> {
        self.read(|e| e.volume.clone())
    }

    fn set_volume(&mut self, channel: usize, value: Volume) -> Result<(), MixerError> {
        self.write(|e| {
            if let Some(slot) = e.volume.get_mut(channel) {
                *slot = value;
            }
        })
    }

    fn mute(&self) -> Result<bool, MixerError> {
        self.read(|e| e.mute.ok_or(MixerError::MuteUnsupported))?
    }

    fn set_mute(&mut self, muted: bool) -> Result<(), MixerError> {
        self.write(|e| {
            if e.mute.is_none() {
                return Err(MixerError::MuteUnsupported);
            }
            if !e.stuck_mute {
                e.mute = Some(muted);
            }
            Ok(())
        })?
    }

    fn recording(&self) -> Result<bool, MixerError> {
        self.read(|e| e.recording.ok_or(MixerError::RecordingUnsupported))?
    }

    fn set_recording(&mut self, on: bool) -> Result<(), MixerError> {
        self.write(|e| {
            if e.recording.is_none() {
                return Err(MixerError::RecordingUnsupported);
            }
            e.recording = Some(on);
            Ok(())
        })?
    }
}

/// Observer that records every callback as a readable line, in order.
#[derive(Default)]
pub struct Recorder {
    events: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<String> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl ChangeObserver for Recorder {
    fn volume_changed(&self, volume: &[Volume], origin: ChangeOrigin) {
        self.events
            .borrow_mut()
            .push(format!("volume {:?} {:?}", volume, origin));
    }

    fn mute_changed(&self, muted: bool, origin: ChangeOrigin) {
        self.events
            .borrow_mut()
            .push(format!("mute {} {:?}", muted, origin));
    }

    fn any_changed(&self, volume: &[Volume], muted: bool, origin: ChangeOrigin) {
        self.events
            .borrow_mut()
            .push(format!("any {:?} {} {:?}", volume, muted, origin));
    }
}
