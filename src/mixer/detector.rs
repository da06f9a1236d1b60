//! Fixed-interval change detection over a set of controls.

use std::cell::RefCell;
use std::rc::Rc;

use super::control::MixerControl;

/// Polls every managed control once per tick. The interval timer lives
/// outside (see [`PollHandle`](super::PollHandle)); the detector only says
/// "keep going".
#[derive(Default)]
pub struct ChangeDetector {
    controls: Vec<Rc<RefCell<MixerControl>>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, control: Rc<RefCell<MixerControl>>) {
        self.controls.push(control);
    }

    pub fn remove(&mut self, control: &Rc<RefCell<MixerControl>>) {
        self.controls.retain(|c| !Rc::ptr_eq(c, control));
    }

    /// One poll cycle. Always returns `true`: stopping the timer is the
    /// owner's decision, never the detector's.
    pub fn tick(&mut self) -> bool {
        for control in &self.controls {
            control.borrow_mut().poll();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeBackend, FakeElem, Recorder};
    use super::super::{ChangeOrigin, ElemAddr, MixerControl};
    use super::*;
    use crate::settings::Settings;
    use tempfile::TempDir;

    struct Fixture {
        backend: FakeBackend,
        addr: ElemAddr,
        control: Rc<RefCell<MixerControl>>,
        detector: ChangeDetector,
        recorder: Rc<Recorder>,
        _dir: TempDir,
    }

    fn fixture(elem: FakeElem) -> Fixture {
        let dir = TempDir::new().unwrap();
        let settings = Settings::init(dir.path()).unwrap();
        let (backend, addr) = FakeBackend::single(elem);
        let control = Rc::new(RefCell::new(MixerControl::new(
            settings,
            Rc::new(backend.clone()),
            addr.clone(),
            false,
        )));
        let recorder = Rc::new(Recorder::default());
        control.borrow_mut().add_observer(recorder.clone());
        let mut detector = ChangeDetector::new();
        detector.add(control.clone());
        Fixture {
            backend,
            addr,
            control,
            detector,
            recorder,
            _dir: dir,
        }
    }

    #[test]
    fn unchanged_hardware_fires_nothing() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        assert!(fx.detector.tick());
        assert!(fx.recorder.take().is_empty());
        assert_eq!(fx.control.borrow().channel().last_volume(), &[50, 50]);
    }

    #[test]
    fn external_volume_change_fires_exactly_once() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        fx.backend.with_elem(&fx.addr, |e| e.volume = vec![20, 30]);

        fx.detector.tick();
        assert_eq!(
            fx.recorder.take(),
            vec![
                "volume [20, 30] External".to_string(),
                "any [20, 30] false External".to_string(),
            ]
        );
        assert_eq!(fx.control.borrow().channel().last_volume(), &[20, 30]);

        // no further change, no further callback
        fx.detector.tick();
        assert!(fx.recorder.take().is_empty());
    }

    #[test]
    fn simultaneous_changes_fire_specific_then_aggregate() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        fx.backend.with_elem(&fx.addr, |e| {
            e.volume = vec![10, 10];
            e.mute = Some(true);
        });

        fx.detector.tick();
        assert_eq!(
            fx.recorder.take(),
            vec![
                "volume [10, 10] External".to_string(),
                "mute true External".to_string(),
                "any [10, 10] true External".to_string(),
            ]
        );
    }

    #[test]
    fn unreadable_element_is_no_change() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        fx.backend.with_elem(&fx.addr, |e| {
            e.volume = vec![5, 5];
            e.missing = true;
        });

        fx.detector.tick();
        assert!(fx.recorder.take().is_empty());
        // snapshot retained across the outage
        assert_eq!(fx.control.borrow().channel().last_volume(), &[50, 50]);

        fx.backend.with_elem(&fx.addr, |e| e.missing = false);
        fx.detector.tick();
        assert_eq!(
            fx.recorder.take(),
            vec![
                "volume [5, 5] External".to_string(),
                "any [5, 5] false External".to_string(),
            ]
        );
    }

    #[test]
    fn removed_control_is_not_polled() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        fx.detector.remove(&fx.control);
        fx.backend.with_elem(&fx.addr, |e| e.volume = vec![1, 1]);
        fx.detector.tick();
        assert!(fx.recorder.take().is_empty());
    }

    #[test]
    fn slider_echo_is_not_rereported() {
        let mut fx = fixture(FakeElem::stereo("Master"));
        fx.control
            .borrow_mut()
            .set_volume(63, Some(0), ChangeOrigin::Internal);
        fx.recorder.take();

        fx.detector.tick();
        assert!(fx.recorder.take().is_empty());
    }
}
