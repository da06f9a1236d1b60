//! The mixer state synchronization engine.
//!
//! A [`MixerChannel`] wraps one hardware control, a [`MixerControl`] adds
//! the persisted lock flag and observer dispatch, and a [`ChangeDetector`]
//! polls the controls on a fixed interval to pick up changes made by other
//! applications. The hardware itself sits behind the [`MixerBackend`] seam
//! so the whole engine runs against an in-memory fake in tests.

mod alsa;
mod backend;
mod channel;
mod control;
mod detector;
mod registry;
#[cfg(test)]
pub(crate) mod testing;

pub use self::alsa::AlsaBackend;
pub use backend::{CardInfo, ElemAddr, ElemInfo, MixerBackend, MixerHandle, VolumeCaps};
pub use channel::{MixerChannel, StatusInfo};
pub use control::{ChangeObserver, ChangeOrigin, MixerControl};
pub use detector::ChangeDetector;
pub use registry::CardRegistry;

use glib::Continue;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub type CardId = i32;
pub type Volume = i64;

pub const VOLUME_MIN: Volume = 0;
pub const VOLUME_MAX: Volume = 100;

/// ALSA offers no change callback through the simple mixer API, so state is
/// polled on a short interval instead.
pub const POLL_INTERVAL_MS: u32 = 200;

/// Owns the glib interval timer that drives a [`ChangeDetector`]. The
/// detector never stops the timer itself; tearing it down is the owner's
/// job, via [`disconnect`](PollHandle::disconnect).
pub struct PollHandle(Option<glib::SourceId>);

impl PollHandle {
    pub fn connect(detector: Rc<RefCell<ChangeDetector>>) -> Self {
        debug!("connect poll timer");
        let id = glib::timeout_add_local(POLL_INTERVAL_MS, move || {
            Continue(detector.borrow_mut().tick())
        });
        Self(Some(id))
    }

    /// Idempotent; once this returns no further tick will fire.
    pub fn disconnect(&mut self) {
        if let Some(id) = self.0.take() {
            debug!("disconnect poll timer");
            glib::source_remove(id);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}
