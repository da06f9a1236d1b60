//! Status icon and label selection for the tray.

use crate::mixer::Volume;

/// Freedesktop icon name for a volume/mute pair. Mute wins over any
/// volume value.
pub fn icon_name(volume: Volume, muted: bool) -> &'static str {
    if muted || volume == 0 {
        "audio-volume-muted"
    } else if volume <= 33 {
        "audio-volume-low"
    } else if volume <= 66 {
        "audio-volume-medium"
    } else {
        "audio-volume-high"
    }
}

pub fn volume_label(volume: Volume, muted: bool) -> String {
    if muted {
        "Muted".to_string()
    } else {
        format!("{}%", volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert_eq!(icon_name(0, false), "audio-volume-muted");
        assert_eq!(icon_name(80, true), "audio-volume-muted");
        assert_eq!(icon_name(33, false), "audio-volume-low");
        assert_eq!(icon_name(34, false), "audio-volume-medium");
        assert_eq!(icon_name(67, false), "audio-volume-high");
    }

    #[test]
    fn labels() {
        assert_eq!(volume_label(42, false), "42%");
        assert_eq!(volume_label(42, true), "Muted");
    }
}
