use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mixer::CardId;

/// What a left click on the tray icon does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    /// Toggle the volume slider popup
    Mixer,
    /// Toggle mute on the active control
    Mute,
}

impl Default for ToggleAction {
    fn default() -> Self {
        ToggleAction::Mixer
    }
}

/// The mixer element a card was last configured to drive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSelection {
    pub control: String,
    pub cid: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Active sound card (driver index)
    pub card_index: CardId,
    /// Remembered control selection per card
    pub card_controls: BTreeMap<CardId, ControlSelection>,
    /// External mixer application launched from the tray menu
    pub mixer_app: String,
    /// Run the mixer application inside a terminal emulator
    pub run_in_terminal: bool,
    /// Draw numeric values next to the popup sliders
    pub mixer_show_values: bool,
    /// Volume step for scroll and menu nudges, in percent
    pub scale_increment: i64,
    /// Show the status tooltip on the tray icon
    pub show_tooltip: bool,
    /// Left-click behaviour of the tray icon
    pub toggle: ToggleAction,
    /// Pop desktop notifications on external changes
    pub show_notify: bool,
    /// Notification display time in milliseconds
    pub notify_timeout_ms: u32,
    /// Force software mute even when the element has a mute switch
    pub emulate_mute: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            card_index: 0,
            card_controls: BTreeMap::new(),
            mixer_app: "alsamixer".to_string(),
            run_in_terminal: true,
            mixer_show_values: true,
            scale_increment: 5,
            show_tooltip: true,
            toggle: ToggleAction::default(),
            show_notify: true,
            notify_timeout_ms: 3000,
            emulate_mute: false,
        }
    }
}

impl AppSettings {
    pub fn selection(&self, card: CardId) -> Option<(String, u32)> {
        self.card_controls
            .get(&card)
            .map(|s| (s.control.clone(), s.cid))
    }

    pub fn set_selection(&mut self, card: CardId, control: String, cid: u32) {
        self.card_controls
            .insert(card, ControlSelection { control, cid });
    }
}
