//! ALSA implementation of the mixer backend seam.

use alsa::card::Iter as CardIter;
use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};
use tracing::warn;

use super::backend::{CardInfo, ElemAddr, ElemInfo, MixerBackend, MixerHandle, VolumeCaps};
use super::{CardId, Volume, VOLUME_MAX};
use crate::error::MixerError;

pub struct AlsaBackend;

impl AlsaBackend {
    pub fn new() -> Self {
        Self
    }
}

fn device_name(card: CardId) -> String {
    format!("hw:{}", card)
}

fn selem_caps(selem: &Selem) -> VolumeCaps {
    VolumeCaps {
        playback: selem.has_playback_volume(),
        capture: selem.has_capture_volume(),
    }
}

impl MixerBackend for AlsaBackend {
    fn cards(&self) -> Vec<CardInfo> {
        let mut cards = Vec::new();
        for card in CardIter::new() {
            match card {
                Ok(card) => cards.push(CardInfo {
                    index: card.get_index(),
                    name: card.get_name().ok(),
                }),
                Err(e) => warn!("skipping unreadable card: {}", e),
            }
        }
        cards
    }

    fn elems(&self, card: CardId) -> Result<Vec<ElemInfo>, MixerError> {
        let mixer = Mixer::new(&device_name(card), false)?;
        let mut elems = Vec::new();
        for elem in mixer.iter() {
            let selem = match Selem::new(elem) {
                Some(selem) => selem,
                None => continue,
            };
            let name = match selem.get_id().get_name() {
                Ok(name) => name.to_string(),
                Err(e) => {
                    warn!("unnamed element on hw:{}: {}", card, e);
                    continue;
                }
            };
            elems.push(ElemInfo {
                name,
                caps: selem_caps(&selem),
            });
        }
        Ok(elems)
    }

    fn open(&self, addr: &ElemAddr) -> Result<Box<dyn MixerHandle>, MixerError> {
        AlsaHandle::open(addr).map(|h| Box::new(h) as Box<dyn MixerHandle>)
    }
}

/// An open simple-element handle. It owns its own `Mixer` so that reopening
/// the channel replaces the whole kernel handle; the simple mixer state goes
/// stale once another process touches the element.
struct AlsaHandle {
    mixer: Mixer,
    sid: SelemId,
    addr: ElemAddr,
    card_name: String,
    playback: bool,
    channels: Vec<SelemChannelId>,
    range: (i64, i64),
    caps: VolumeCaps,
}

impl AlsaHandle {
    fn open(addr: &ElemAddr) -> Result<Self, MixerError> {
        let mixer = Mixer::new(&device_name(addr.card), false)?;
        let sid = SelemId::new(&addr.control, addr.cid);

        let (playback, channels, range, caps) = {
            let selem = mixer
                .find_selem(&sid)
                .ok_or_else(|| MixerError::HardwareUnavailable(addr.to_string()))?;
            let caps = selem_caps(&selem);
            let playback = caps.playback || !caps.capture;
            let range = if playback {
                selem.get_playback_volume_range()
            } else {
                selem.get_capture_volume_range()
            };
            let mut channels: Vec<SelemChannelId> = SelemChannelId::all()
                .iter()
                .copied()
                .filter(|ch| {
                    if playback {
                        selem.has_playback_channel(*ch)
                    } else {
                        selem.has_capture_channel(*ch)
                    }
                })
                .collect();
            if channels.is_empty() {
                channels.push(SelemChannelId::mono());
            }
            (playback, channels, range, caps)
        };

        let card_name = alsa::card::Card::new(addr.card)
            .get_name()
            .unwrap_or_else(|_| device_name(addr.card));

        Ok(Self {
            mixer,
            sid,
            addr: addr.clone(),
            card_name,
            playback,
            channels,
            range,
            caps,
        })
    }

    fn selem(&self) -> Result<Selem, MixerError> {
        self.mixer
            .find_selem(&self.sid)
            .ok_or_else(|| MixerError::HardwareUnavailable(self.addr.to_string()))
    }

    fn to_percent(&self, raw: i64) -> Volume {
        let (min, max) = self.range;
        if max <= min {
            return 0;
        }
        ((raw - min) * VOLUME_MAX + (max - min) / 2) / (max - min)
    }

    fn from_percent(&self, value: Volume) -> i64 {
        let (min, max) = self.range;
        min + (value * (max - min) + VOLUME_MAX / 2) / VOLUME_MAX
    }
}

impl MixerHandle for AlsaHandle {
    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn card_name(&self) -> &str {
        &self.card_name
    }

    fn caps(&self) -> VolumeCaps {
        self.caps
    }

    fn volume(&self) -> Result<Vec<Volume>, MixerError> {
        let selem = self.selem()?;
        let mut volume = Vec::with_capacity(self.channels.len());
        for ch in &self.channels {
            let raw = if self.playback {
                selem.get_playback_volume(*ch)?
            } else {
                selem.get_capture_volume(*ch)?
            };
            volume.push(self.to_percent(raw));
        }
        Ok(volume)
    }

    fn set_volume(&mut self, channel: usize, value: Volume) -> Result<(), MixerError> {
        let ch = *self
            .channels
            .get(channel)
            .ok_or_else(|| MixerError::HardwareUnavailable(self.addr.to_string()))?;
        let raw = self.from_percent(value);
        let selem = self.selem()?;
        if self.playback {
            selem.set_playback_volume(ch, raw)?;
        } else {
            selem.set_capture_volume(ch, raw)?;
        }
        Ok(())
    }

    fn mute(&self) -> Result<bool, MixerError> {
        let selem = self.selem()?;
        let ch = self.channels[0];
        let on = if self.playback {
            if !selem.has_playback_switch() {
                return Err(MixerError::MuteUnsupported);
            }
            selem.get_playback_switch(ch)?
        } else {
            if !selem.has_capture_switch() {
                return Err(MixerError::MuteUnsupported);
            }
            selem.get_capture_switch(ch)?
        };
        // switch semantics: 0 = off = muted
        Ok(on == 0)
    }

    fn set_mute(&mut self, muted: bool) -> Result<(), MixerError> {
        let selem = self.selem()?;
        let value = if muted { 0 } else { 1 };
        if self.playback {
            if !selem.has_playback_switch() {
                return Err(MixerError::MuteUnsupported);
            }
            selem.set_playback_switch_all(value)?;
        } else {
            if !selem.has_capture_switch() {
                return Err(MixerError::MuteUnsupported);
            }
            selem.set_capture_switch_all(value)?;
        }
        Ok(())
    }

    fn recording(&self) -> Result<bool, MixerError> {
        let selem = self.selem()?;
        if !selem.has_capture_switch() {
            return Err(MixerError::RecordingUnsupported);
        }
        Ok(selem.get_capture_switch(self.channels[0])? != 0)
    }

    fn set_recording(&mut self, on: bool) -> Result<(), MixerError> {
        let selem = self.selem()?;
        if !selem.has_capture_switch() {
            return Err(MixerError::RecordingUnsupported);
        }
        selem.set_capture_switch_all(if on { 1 } else { 0 })?;
        Ok(())
    }
}
