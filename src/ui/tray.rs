use std::cell::Cell;
use std::rc::Rc;

use gtk::prelude::*;
use libappindicator::{AppIndicator, AppIndicatorStatus};

use crate::icons;
use crate::mixer::StatusInfo;
use crate::settings::ToggleAction;

use super::{preferences, App};

pub(super) struct Tray {
    indicator: AppIndicator,
    mute_item: gtk::CheckMenuItem,
    show_label: bool,
    /// Set while the checkmark is updated programmatically.
    guard: Rc<Cell<bool>>,
}

impl Tray {
    pub(super) fn new(app: &Rc<App>) -> Self {
        let mut indicator = AppIndicator::new("voltray", "audio-volume-medium");
        indicator.set_status(AppIndicatorStatus::Active);

        let guard = Rc::new(Cell::new(false));
        let mut menu = gtk::Menu::new();

        let mute_item = gtk::CheckMenuItem::with_label("Mute");
        {
            let app = app.clone();
            let guard = guard.clone();
            mute_item.connect_toggled(move |_| {
                if guard.get() {
                    return;
                }
                app.toggle_mute();
            });
        }

        let slider_item = gtk::MenuItem::with_label("Volume Slider");
        {
            let app = app.clone();
            slider_item.connect_activate(move |_| app.toggle_slider());
        }

        // left-click preference decides which action sits on top
        match app.settings().r().app().toggle {
            ToggleAction::Mixer => {
                menu.append(&slider_item);
                menu.append(&mute_item);
            }
            ToggleAction::Mute => {
                menu.append(&mute_item);
                menu.append(&slider_item);
            }
        }

        let up_item = gtk::MenuItem::with_label("Volume Up");
        {
            let app = app.clone();
            up_item.connect_activate(move |_| app.step_volume(1));
        }
        menu.append(&up_item);

        let down_item = gtk::MenuItem::with_label("Volume Down");
        {
            let app = app.clone();
            down_item.connect_activate(move |_| app.step_volume(-1));
        }
        menu.append(&down_item);

        menu.append(&gtk::SeparatorMenuItem::new());

        let mixer_item = gtk::MenuItem::with_label("Open Mixer");
        {
            let app = app.clone();
            mixer_item.connect_activate(move |_| app.helper().toggle());
        }
        menu.append(&mixer_item);

        let prefs_item = gtk::MenuItem::with_label("Preferences");
        {
            let app = app.clone();
            prefs_item.connect_activate(move |_| preferences::show(&app));
        }
        menu.append(&prefs_item);

        menu.append(&gtk::SeparatorMenuItem::new());

        let quit_item = gtk::MenuItem::with_label("Quit");
        quit_item.connect_activate(|_| gtk::main_quit());
        menu.append(&quit_item);

        indicator.set_menu(&mut menu);
        menu.show_all();

        Self {
            indicator,
            mute_item,
            show_label: app.settings().r().app().show_tooltip,
            guard,
        }
    }

    pub(super) fn update(&mut self, info: &StatusInfo) {
        let volume = info.volume.first().copied().unwrap_or(0);
        let label = icons::volume_label(volume, info.muted);

        self.indicator
            .set_icon_full(icons::icon_name(volume, info.muted), &label);
        if self.show_label {
            self.indicator.set_label(&label, "100%");
        }

        self.guard.set(true);
        self.mute_item.set_active(info.muted);
        self.guard.set(false);
    }
}
