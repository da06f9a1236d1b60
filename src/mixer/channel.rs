//! A single hardware mixer control and its change-detection snapshot.

use std::rc::Rc;

use tracing::{info, warn};

use super::backend::{ElemAddr, MixerBackend, MixerHandle};
use super::{Volume, VOLUME_MAX, VOLUME_MIN};
use crate::error::MixerError;

/// Aggregate state handed to the tray icon and the notification surface.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusInfo {
    pub volume: Vec<Volume>,
    pub muted: bool,
    pub card_name: String,
    pub mixer_name: String,
}

/// One mixer control on one card.
///
/// Reads never fail: a vanished control reports zero volume and unmuted
/// until a later reopen succeeds, and writes against it are logged no-ops.
/// When the hardware mute switch is missing or does not verify, the channel
/// permanently falls back to emulated mute: muting zeroes the volume vector
/// and unmuting restores the exact pre-mute values.
pub struct MixerChannel {
    backend: Rc<dyn MixerBackend>,
    addr: ElemAddr,
    handle: Option<Box<dyn MixerHandle>>,
    channel_count: usize,
    emulate_mute: bool,
    soft_muted: bool,
    /// Change-detection snapshot: the last *reported* volume and mute.
    last_volume: Vec<Volume>,
    last_mute: bool,
    /// Pre-mute volume, restored verbatim on unmute.
    old_volume: Vec<Volume>,
}

fn clamp(value: Volume) -> Volume {
    value.max(VOLUME_MIN).min(VOLUME_MAX)
}

impl MixerChannel {
    pub fn new(backend: Rc<dyn MixerBackend>, addr: ElemAddr, emulate_mute: bool) -> Self {
        let mut this = Self {
            backend,
            addr,
            handle: None,
            channel_count: 1,
            emulate_mute,
            soft_muted: false,
            last_volume: Vec::new(),
            last_mute: false,
            old_volume: Vec::new(),
        };
        this.attach();
        this
    }

    /// Point this channel at a different element, releasing the old handle
    /// before acquiring the new one.
    pub fn retarget(&mut self, addr: ElemAddr, emulate_mute: bool) {
        self.close();
        self.addr = addr;
        self.emulate_mute = emulate_mute;
        self.soft_muted = false;
        self.channel_count = 1;
        self.attach();
    }

    fn attach(&mut self) {
        self.reopen();
        if let Some(handle) = &self.handle {
            self.channel_count = handle.channel_count().max(1);
        }
        self.last_volume = self.volume();
        self.last_mute = self.mute();
        self.old_volume = self.last_volume.clone();
    }

    pub fn addr(&self) -> &ElemAddr {
        &self.addr
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn emulates_mute(&self) -> bool {
        self.emulate_mute
    }

    /// The simple mixer handle goes stale once another process touches the
    /// element; reacquire it before every poll read.
    pub fn reopen(&mut self) {
        self.close();
        match self.backend.open(&self.addr) {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => warn!("can't open mixer {}: {}", self.addr, e),
        }
    }

    pub fn close(&mut self) {
        self.handle = None;
    }

    fn raw_volume(&self) -> Vec<Volume> {
        match self.handle.as_ref().map(|h| h.volume()) {
            Some(Ok(volume)) => volume,
            Some(Err(e)) => {
                warn!("can't read volume on {}: {}", self.addr, e);
                vec![0; self.channel_count]
            }
            None => vec![0; self.channel_count],
        }
    }

    /// Logical volume: while emulated mute is engaged this is the pre-mute
    /// snapshot, not the zeroed hardware value.
    pub fn volume(&self) -> Vec<Volume> {
        if self.soft_muted {
            self.old_volume.clone()
        } else {
            self.raw_volume()
        }
    }

    pub fn set_volume(&mut self, value: Volume, channel: usize) {
        let value = clamp(value);
        if channel >= self.channel_count {
            return;
        }
        if self.soft_muted {
            // hardware stays silent; adjust the restore target instead
            self.old_volume[channel] = value;
            self.last_volume[channel] = value;
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            match handle.set_volume(channel, value) {
                Ok(()) => self.last_volume[channel] = value,
                Err(e) => warn!("can't set volume on {}: {}", self.addr, e),
            }
        }
    }

    pub fn set_volume_all(&mut self, value: Volume) {
        for channel in 0..self.channel_count {
            self.set_volume(value, channel);
        }
    }

    pub fn mute(&self) -> bool {
        if self.emulate_mute {
            return self.soft_muted;
        }
        match self.handle.as_ref().map(|h| h.mute()) {
            Some(Ok(muted)) => muted,
            // no switch to read: a zeroed volume is the closest signal
            Some(Err(_)) => self.raw_volume().first().map(|v| *v == 0).unwrap_or(false),
            None => false,
        }
    }

    /// Attempt the hardware switch and verify it took effect; the first
    /// failure permanently arms emulated mute for this channel's lifetime.
    pub fn set_mute(&mut self, value: bool) {
        if self.handle.is_none() {
            self.last_mute = value;
            return;
        }

        if !self.emulate_mute {
            let ok = match self.handle.as_mut().map(|h| h.set_mute(value)) {
                Some(Ok(())) => self.mute() == value,
                _ => false,
            };
            if !ok {
                info!("hardware mute failed on {}, emulating from now on", self.addr);
                self.emulate_mute = true;
            }
        }

        if self.emulate_mute {
            if value {
                if !self.soft_muted {
                    self.old_volume = self.raw_volume();
                    for channel in 0..self.channel_count {
                        if let Some(handle) = self.handle.as_mut() {
                            if let Err(e) = handle.set_volume(channel, 0) {
                                warn!("can't zero volume on {}: {}", self.addr, e);
                            }
                        }
                    }
                    self.soft_muted = true;
                }
            } else if self.soft_muted {
                self.soft_muted = false;
                let restore = self.old_volume.clone();
                for (channel, value) in restore.into_iter().enumerate() {
                    if let Some(handle) = self.handle.as_mut() {
                        if let Err(e) = handle.set_volume(channel, value) {
                            warn!("can't restore volume on {}: {}", self.addr, e);
                        }
                    }
                }
            }
        }

        self.last_mute = value;
    }

    pub fn recording(&self) -> Option<bool> {
        match self.handle.as_ref()?.recording() {
            Ok(on) => Some(on),
            Err(MixerError::RecordingUnsupported) => None,
            Err(e) => {
                warn!("can't read recording switch on {}: {}", self.addr, e);
                None
            }
        }
    }

    pub fn set_recording(&mut self, on: bool) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.set_recording(on) {
                warn!("can't set recording switch on {}: {}", self.addr, e);
            }
        }
    }

    pub fn status_info(&self) -> StatusInfo {
        StatusInfo {
            volume: self.volume(),
            muted: self.mute(),
            card_name: self
                .handle
                .as_ref()
                .map(|h| h.card_name().to_string())
                .unwrap_or_default(),
            mixer_name: self.addr.control.clone(),
        }
    }

    /// Both poll values in one read, erroring instead of defaulting so the
    /// detector can treat an unreadable tick as "no change".
    pub(super) fn read_state(&self) -> Result<(Vec<Volume>, bool), MixerError> {
        if self.soft_muted {
            return Ok((self.old_volume.clone(), true));
        }
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| MixerError::HardwareUnavailable(self.addr.to_string()))?;
        let volume = handle.volume()?;
        let muted = if self.emulate_mute {
            self.soft_muted
        } else {
            match handle.mute() {
                Ok(muted) => muted,
                Err(_) => volume.first().map(|v| *v == 0).unwrap_or(false),
            }
        };
        Ok((volume, muted))
    }

    /// Element-wise integer comparison against the snapshot.
    pub fn is_volume_changed(&self, volume: &[Volume]) -> bool {
        self.last_volume.as_slice() != volume
    }

    pub fn is_mute_changed(&self, mute: bool) -> bool {
        self.last_mute != mute
    }

    pub fn last_volume(&self) -> &[Volume] {
        &self.last_volume
    }

    pub fn last_mute(&self) -> bool {
        self.last_mute
    }

    /// Overwrite the snapshot; the detector calls this only after all
    /// callbacks for the tick have run.
    pub(super) fn store_snapshot(&mut self, volume: Vec<Volume>, mute: bool) {
        self.last_volume = volume;
        self.last_mute = mute;
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeBackend, FakeElem};
    use super::*;

    fn channel_for(elem: FakeElem) -> (FakeBackend, MixerChannel) {
        let (backend, addr) = FakeBackend::single(elem);
        let channel = MixerChannel::new(Rc::new(backend.clone()), addr, false);
        (backend, channel)
    }

    #[test]
    fn set_volume_all_fans_out() {
        let (_, mut channel) = channel_for(FakeElem::stereo("Master"));
        channel.set_volume_all(30);
        assert_eq!(channel.volume(), vec![30, 30]);
        assert_eq!(channel.channel_count(), 2);
    }

    #[test]
    fn set_volume_all_on_mono() {
        let (_, mut channel) = channel_for(FakeElem::mono("Mic"));
        channel.set_volume_all(72);
        assert_eq!(channel.volume(), vec![72]);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let (_, mut channel) = channel_for(FakeElem::stereo("Master"));
        channel.set_volume_all(150);
        assert_eq!(channel.volume(), vec![100, 100]);
        channel.set_volume(-5, 0);
        assert_eq!(channel.volume()[0], 0);
    }

    #[test]
    fn missing_switch_arms_emulated_mute() {
        let mut elem = FakeElem::stereo("Master");
        elem.mute = None;
        elem.volume = vec![37, 64];
        let (backend, mut channel) = channel_for(elem);
        let addr = channel.addr().clone();

        channel.set_mute(true);
        assert!(channel.emulates_mute());
        assert!(channel.mute());
        // hardware is zeroed but the logical volume is preserved
        assert_eq!(backend.with_elem(&addr, |e| e.volume.clone()), vec![0, 0]);
        assert_eq!(channel.volume(), vec![37, 64]);

        channel.set_mute(false);
        assert!(!channel.mute());
        assert_eq!(channel.volume(), vec![37, 64]);
        assert_eq!(backend.with_elem(&addr, |e| e.volume.clone()), vec![37, 64]);
    }

    #[test]
    fn failed_verification_arms_emulated_mute() {
        let mut elem = FakeElem::stereo("Headphone");
        elem.stuck_mute = true;
        let (_, mut channel) = channel_for(elem);

        assert!(!channel.emulates_mute());
        channel.set_mute(true);
        assert!(channel.emulates_mute());
        assert!(channel.mute());
    }

    #[test]
    fn hardware_mute_does_not_emulate() {
        let (backend, mut channel) = channel_for(FakeElem::stereo("Master"));
        let addr = channel.addr().clone();
        channel.set_mute(true);
        assert!(!channel.emulates_mute());
        assert!(channel.mute());
        assert_eq!(backend.with_elem(&addr, |e| e.mute), Some(true));
        // volume untouched by a real switch
        assert_eq!(channel.volume(), vec![50, 50]);
    }

    #[test]
    fn set_volume_while_soft_muted_updates_restore_target() {
        let mut elem = FakeElem::stereo("Master");
        elem.mute = None;
        let (backend, mut channel) = channel_for(elem);
        let addr = channel.addr().clone();

        channel.set_mute(true);
        channel.set_volume_all(80);
        // still silent
        assert_eq!(backend.with_elem(&addr, |e| e.volume.clone()), vec![0, 0]);

        channel.set_mute(false);
        assert_eq!(channel.volume(), vec![80, 80]);
    }

    #[test]
    fn vanished_control_reads_neutral_values() {
        let mut elem = FakeElem::stereo("Master");
        elem.missing = true;
        let (_, mut channel) = channel_for(elem);

        assert!(!channel.is_open());
        assert_eq!(channel.volume(), vec![0]);
        assert!(!channel.mute());
        assert_eq!(channel.recording(), None);
        // writes must not panic
        channel.set_volume_all(50);
        channel.set_mute(true);
    }

    #[test]
    fn reopen_recovers_after_control_returns() {
        let mut elem = FakeElem::stereo("Master");
        elem.missing = true;
        let (backend, mut channel) = channel_for(elem);
        let addr = channel.addr().clone();
        assert!(!channel.is_open());

        backend.with_elem(&addr, |e| e.missing = false);
        channel.reopen();
        assert!(channel.is_open());
        assert_eq!(channel.volume(), vec![50, 50]);
    }

    #[test]
    fn recording_switch_round_trip() {
        let mut elem = FakeElem::mono("Mic");
        elem.recording = Some(false);
        let (_, mut channel) = channel_for(elem);
        assert_eq!(channel.recording(), Some(false));
        channel.set_recording(true);
        assert_eq!(channel.recording(), Some(true));
    }
}
