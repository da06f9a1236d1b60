//! Lockable mixer control with observer dispatch and lock persistence.

use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use super::backend::ElemAddr;
use super::channel::{MixerChannel, StatusInfo};
use super::{MixerBackend, Volume, VOLUME_MAX, VOLUME_MIN};
use crate::error::SettingsError;
use crate::settings::Settings;

/// Where a change came from. A widget that caused an `Internal` change
/// skips re-applying its own echo; `External` means another application or
/// a hardware control moved the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    Internal,
    External,
}

/// Listener for state changes. Specific callbacks fire before
/// `any_changed`.
pub trait ChangeObserver {
    fn volume_changed(&self, _volume: &[Volume], _origin: ChangeOrigin) {}
    fn mute_changed(&self, _muted: bool, _origin: ChangeOrigin) {}
    fn any_changed(&self, _volume: &[Volume], _muted: bool, _origin: ChangeOrigin) {}
}

/// A [`MixerChannel`] plus the persisted lock flag. While locked, a volume
/// write to any channel is applied to all of them. The flag is stored per
/// `(card, control, cid)` and only written back when it actually changed.
pub struct MixerControl {
    channel: MixerChannel,
    settings: Arc<Settings>,
    lock: bool,
    observers: Vec<Rc<dyn ChangeObserver>>,
}

impl MixerControl {
    pub fn new(
        settings: Arc<Settings>,
        backend: Rc<dyn MixerBackend>,
        addr: ElemAddr,
        emulate_mute: bool,
    ) -> Self {
        let channel = MixerChannel::new(backend, addr, emulate_mute);
        let mut this = Self {
            channel,
            settings,
            lock: false,
            observers: Vec::new(),
        };
        this.load();
        this
    }

    /// Re-target to another element. The current lock state carries over
    /// unless the new element has a persisted flag of its own.
    pub fn update(&mut self, addr: ElemAddr, emulate_mute: bool) {
        self.channel.retarget(addr, emulate_mute);
        self.load();
    }

    pub fn add_observer(&mut self, observer: Rc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    pub fn channel(&self) -> &MixerChannel {
        &self.channel
    }

    pub fn channel_count(&self) -> usize {
        self.channel.channel_count()
    }

    pub fn volume(&self) -> Vec<Volume> {
        self.channel.volume()
    }

    pub fn mute(&self) -> bool {
        self.channel.mute()
    }

    pub fn recording(&self) -> Option<bool> {
        self.channel.recording()
    }

    pub fn status_info(&self) -> StatusInfo {
        self.channel.status_info()
    }

    /// `channel: None` writes every channel; so does any write while the
    /// lock is on and the element has more than one channel.
    pub fn set_volume(&mut self, value: Volume, channel: Option<usize>, origin: ChangeOrigin) {
        match channel {
            Some(ch) if !(self.lock && self.channel.channel_count() > 1) => {
                self.channel.set_volume(value, ch)
            }
            _ => self.channel.set_volume_all(value),
        }
        if origin == ChangeOrigin::Internal {
            let volume = self.channel.volume();
            let muted = self.channel.mute();
            self.notify_volume(&volume, origin);
            self.notify_any(&volume, muted, origin);
        }
    }

    pub fn set_mute(&mut self, value: bool, origin: ChangeOrigin) {
        self.channel.set_mute(value);
        if origin == ChangeOrigin::Internal {
            let volume = self.channel.volume();
            let muted = self.channel.mute();
            self.notify_mute(muted, origin);
            self.notify_any(&volume, muted, origin);
        }
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.channel.mute();
        self.set_mute(!muted, ChangeOrigin::Internal);
    }

    /// Nudge all channels by `step` from the first channel's value.
    pub fn step_volume(&mut self, step: Volume) {
        let current = self.channel.volume().first().copied().unwrap_or(0);
        let value = (current + step).max(VOLUME_MIN).min(VOLUME_MAX);
        self.set_volume(value, None, ChangeOrigin::Internal);
    }

    pub fn set_recording(&mut self, on: bool) {
        self.channel.set_recording(on);
    }

    pub fn lock(&self) -> bool {
        self.lock
    }

    pub fn set_lock(&mut self, value: bool) {
        debug!("set lock for {} to {}", self.channel.addr(), value);
        self.lock = value;
    }

    fn key(&self) -> String {
        let addr = self.channel.addr();
        format!("{}_{}", addr.control, addr.cid)
    }

    pub fn load(&mut self) {
        let card = self.channel.addr().card;
        if let Some(lock) = self.settings.r().mixers().lock(card, &self.key()) {
            self.lock = lock;
        }
    }

    /// Persist the lock flag; the store is only touched when the stored
    /// value is absent or different.
    pub fn save(&self) -> Result<(), SettingsError> {
        let card = self.channel.addr().card;
        let changed = self
            .settings
            .w()
            .mixers()
            .set_lock(card, &self.key(), self.lock);
        if changed {
            self.settings.sync()?;
        }
        Ok(())
    }

    /// One change-detection step: reopen, read, compare against the
    /// snapshot, dispatch, then store the fresh state as the new snapshot.
    /// An unreadable element means "no change" for this tick.
    pub fn poll(&mut self) {
        self.channel.reopen();
        let (volume, muted) = match self.channel.read_state() {
            Ok(state) => state,
            Err(e) => {
                debug!("poll skipped for {}: {}", self.channel.addr(), e);
                return;
            }
        };
        let volume_changed = self.channel.is_volume_changed(&volume);
        let mute_changed = self.channel.is_mute_changed(muted);
        if !volume_changed && !mute_changed {
            return;
        }
        debug!(
            "{} changed externally: {:?} -> {:?}, mute {} -> {}",
            self.channel.addr(),
            self.channel.last_volume(),
            volume,
            self.channel.last_mute(),
            muted
        );
        if volume_changed {
            self.notify_volume(&volume, ChangeOrigin::External);
        }
        if mute_changed {
            self.notify_mute(muted, ChangeOrigin::External);
        }
        self.notify_any(&volume, muted, ChangeOrigin::External);
        self.channel.store_snapshot(volume, muted);
    }

    fn notify_volume(&self, volume: &[Volume], origin: ChangeOrigin) {
        for observer in &self.observers {
            observer.volume_changed(volume, origin);
        }
    }

    fn notify_mute(&self, muted: bool, origin: ChangeOrigin) {
        for observer in &self.observers {
            observer.mute_changed(muted, origin);
        }
    }

    fn notify_any(&self, volume: &[Volume], muted: bool, origin: ChangeOrigin) {
        for observer in &self.observers {
            observer.any_changed(volume, muted, origin);
        }
    }
}
