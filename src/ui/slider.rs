use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use gtk::prelude::*;
use gtk::{Adjustment, Orientation, PositionType, ScaleBuilder};
use tracing::warn;

use crate::mixer::{ChangeObserver, ChangeOrigin, MixerControl, Volume};
use crate::settings::Settings;

/// Borderless per-channel volume popup, opened at the pointer from the
/// tray menu. Rebuilt from scratch whenever the active element changes.
pub(super) struct SliderWindow {
    window: gtk::Window,
    container: gtk::Box,
    control: Rc<RefCell<MixerControl>>,
    settings: Arc<Settings>,
    scales: RefCell<Vec<gtk::Scale>>,
    mute_button: RefCell<Option<gtk::ToggleButton>>,
    /// Set while widgets are updated programmatically.
    guard: Rc<Cell<bool>>,
}

impl SliderWindow {
    pub(super) fn new(control: Rc<RefCell<MixerControl>>, settings: Arc<Settings>) -> Rc<Self> {
        let window = gtk::Window::new(gtk::WindowType::Toplevel);
        window.set_title("Volume");
        window.set_decorated(false);
        window.set_skip_taskbar_hint(true);
        window.set_keep_above(true);
        window.set_position(gtk::WindowPosition::Mouse);
        window.set_border_width(6);
        window.set_type_hint(gdk::WindowTypeHint::Utility);

        let container = gtk::Box::new(Orientation::Horizontal, 6);
        window.add(&container);

        // closing the popup must not end the main loop
        window.connect_delete_event(|w, _| {
            w.hide();
            gtk::Inhibit(true)
        });

        Rc::new(Self {
            window,
            container,
            control,
            settings,
            scales: RefCell::new(Vec::new()),
            mute_button: RefCell::new(None),
            guard: Rc::new(Cell::new(false)),
        })
    }

    /// Throw away all widgets and rebuild them for the current element.
    pub(super) fn rebuild(self: &Rc<Self>) {
        let container = self.container.clone();
        container.foreach(|child| container.remove(child));
        self.scales.borrow_mut().clear();
        *self.mute_button.borrow_mut() = None;

        let (volume, muted, lock, recording, count, show_values) = {
            let control = self.control.borrow();
            (
                control.volume(),
                control.mute(),
                control.lock(),
                control.recording(),
                control.channel_count(),
                self.settings.r().app().mixer_show_values,
            )
        };

        for (index, value) in volume.iter().enumerate().take(count) {
            let adjustment = Adjustment::new(*value as f64, 0.0, 100.0, 1.0, 10.0, 0.0);
            let scale = ScaleBuilder::new()
                .adjustment(&adjustment)
                .orientation(Orientation::Vertical)
                .value_pos(PositionType::Bottom)
                .draw_value(show_values)
                .inverted(true)
                .height_request(250)
                .digits(0)
                .build();
            {
                let this = self.clone();
                scale.connect_value_changed(move |scale| {
                    if this.guard.get() {
                        return;
                    }
                    this.control.borrow_mut().set_volume(
                        scale.get_value().round() as Volume,
                        Some(index),
                        ChangeOrigin::Internal,
                    );
                    this.sync_scales();
                });
            }
            self.container.add(&scale);
            self.scales.borrow_mut().push(scale);
        }

        let buttons = gtk::Box::new(Orientation::Vertical, 6);

        let mute = gtk::ToggleButton::with_label("Mute");
        mute.set_active(muted);
        {
            let this = self.clone();
            mute.connect_toggled(move |button| {
                if this.guard.get() {
                    return;
                }
                this.control
                    .borrow_mut()
                    .set_mute(button.get_active(), ChangeOrigin::Internal);
            });
        }
        buttons.add(&mute);
        *self.mute_button.borrow_mut() = Some(mute);

        if let Some(on) = recording {
            let rec = gtk::ToggleButton::with_label("Rec");
            rec.set_active(on);
            let this = self.clone();
            rec.connect_toggled(move |button| {
                if this.guard.get() {
                    return;
                }
                this.control.borrow_mut().set_recording(button.get_active());
            });
            buttons.add(&rec);
        }

        if count > 1 {
            let lock_button = gtk::ToggleButton::with_label("Lock");
            lock_button.set_active(lock);
            let this = self.clone();
            lock_button.connect_toggled(move |button| {
                if this.guard.get() {
                    return;
                }
                let mut control = this.control.borrow_mut();
                control.set_lock(button.get_active());
                if let Err(e) = control.save() {
                    warn!("can't save lock flag: {}", e);
                }
            });
            buttons.add(&lock_button);
        }

        self.container.add(&buttons);
        if self.window.get_visible() {
            self.container.show_all();
        }
    }

    pub(super) fn toggle(&self) {
        if self.window.get_visible() {
            self.window.hide();
        } else {
            self.window.set_position(gtk::WindowPosition::Mouse);
            self.window.show_all();
            self.window.present();
        }
    }

    /// Align every scale with the engine, e.g. after a locked write moved
    /// the sibling channels too.
    fn sync_scales(&self) {
        let volume = self.control.borrow().volume();
        self.set_scales(&volume);
    }

    fn set_scales(&self, volume: &[Volume]) {
        self.guard.set(true);
        for (scale, value) in self.scales.borrow().iter().zip(volume) {
            scale.set_value(*value as f64);
        }
        self.guard.set(false);
    }
}

impl ChangeObserver for SliderWindow {
    fn volume_changed(&self, volume: &[Volume], origin: ChangeOrigin) {
        // internal writes already went through the widgets
        if origin == ChangeOrigin::Internal {
            return;
        }
        self.set_scales(volume);
    }

    fn mute_changed(&self, muted: bool, origin: ChangeOrigin) {
        if origin == ChangeOrigin::Internal {
            return;
        }
        if let Some(button) = self.mute_button.borrow().as_ref() {
            self.guard.set(true);
            button.set_active(muted);
            self.guard.set(false);
        }
    }
}
