//! The seam between the synchronization engine and the platform mixer API.
//!
//! Everything above this module talks in percentages (0-100) and logical
//! channel indices; rescaling from the driver's native volume range happens
//! inside the backend implementation.

use std::fmt;

use super::{CardId, Volume};
use crate::error::MixerError;

/// Address of one mixer element on one card. `cid` disambiguates repeated
/// control names: the first "PCM" on a card is 0, the second is 1, and so
/// on, in enumeration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElemAddr {
    pub card: CardId,
    pub control: String,
    pub cid: u32,
}

impl ElemAddr {
    pub fn new(card: CardId, control: impl Into<String>, cid: u32) -> Self {
        Self {
            card,
            control: control.into(),
            cid,
        }
    }
}

impl fmt::Display for ElemAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hw:{} {}:{}", self.card, self.control, self.cid)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeCaps {
    pub playback: bool,
    pub capture: bool,
}

impl VolumeCaps {
    /// An element with neither direction is skipped by enumeration.
    pub fn usable(&self) -> bool {
        self.playback || self.capture
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardInfo {
    pub index: CardId,
    /// `None` marks a card that exists at this index but is unusable; it
    /// keeps its slot so indices stay aligned with the driver.
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ElemInfo {
    pub name: String,
    pub caps: VolumeCaps,
}

pub trait MixerBackend {
    /// All cards known to the driver, in index order.
    fn cards(&self) -> Vec<CardInfo>;

    /// Raw element list for one card, in driver enumeration order.
    fn elems(&self, card: CardId) -> Result<Vec<ElemInfo>, MixerError>;

    /// Acquire a handle to one element. Fails with `HardwareUnavailable`
    /// when the card or control no longer exists.
    fn open(&self, addr: &ElemAddr) -> Result<Box<dyn MixerHandle>, MixerError>;
}

/// One open control handle. Channel count and capabilities are fixed for
/// the lifetime of the handle.
pub trait MixerHandle {
    fn channel_count(&self) -> usize;
    fn card_name(&self) -> &str;
    fn caps(&self) -> VolumeCaps;

    /// Current volume, one 0-100 value per channel.
    fn volume(&self) -> Result<Vec<Volume>, MixerError>;
    fn set_volume(&mut self, channel: usize, value: Volume) -> Result<(), MixerError>;

    fn mute(&self) -> Result<bool, MixerError>;
    fn set_mute(&mut self, muted: bool) -> Result<(), MixerError>;

    /// Recording (capture switch) state; `RecordingUnsupported` when the
    /// element has none.
    fn recording(&self) -> Result<bool, MixerError>;
    fn set_recording(&mut self, on: bool) -> Result<(), MixerError>;
}
