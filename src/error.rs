use std::fmt;

/// Errors surfaced at the hardware mixer boundary. None of these are fatal;
/// the engine converts them into inert reads or a fallback state flag.
#[derive(Debug)]
pub enum MixerError {
    /// The card or control vanished (unplugged, renamed, driver reload).
    HardwareUnavailable(String),
    /// The element has no working hardware mute switch.
    MuteUnsupported,
    /// The element has no recording switch.
    RecordingUnsupported,
    /// Anything else the ALSA layer reports.
    Alsa(alsa::Error),
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareUnavailable(what) => write!(f, "hardware unavailable: {}", what),
            Self::MuteUnsupported => write!(f, "element has no mute switch"),
            Self::RecordingUnsupported => write!(f, "element has no recording switch"),
            Self::Alsa(e) => write!(f, "alsa: {}", e),
        }
    }
}

impl From<alsa::Error> for MixerError {
    fn from(e: alsa::Error) -> Self {
        Self::Alsa(e)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {}", e),
            Self::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
