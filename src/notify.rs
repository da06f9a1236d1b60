//! Desktop notifications over the `org.freedesktop.Notifications` bus
//! interface, without pulling in a notification crate.

use std::collections::HashMap;
use std::time::Duration;

use dbus::arg::Variant;
use dbus::blocking::Connection;
use dbus::Error as DBusError;
use tracing::debug;

use crate::icons;
use crate::mixer::StatusInfo;

const BUS_NAME: &str = "org.freedesktop.Notifications";
const BUS_PATH: &str = "/org/freedesktop/Notifications";

/// One reusable notification bubble. Re-showing with the id of the
/// previous bubble replaces it in place instead of stacking a new one.
pub struct Notification {
    connection: Connection,
    timeout_ms: u32,
    last_id: u32,
    icon: &'static str,
    body: String,
}

impl Notification {
    pub fn open(timeout_ms: u32) -> Result<Self, DBusError> {
        let connection = Connection::new_session()?;
        Ok(Self {
            connection,
            timeout_ms,
            last_id: 0,
            icon: icon_fallback(),
            body: String::new(),
        })
    }

    /// Refresh the cached body and icon from the mixer state. Cheap; no
    /// bus traffic until [`show`](Self::show) is called.
    pub fn update(&mut self, status: &StatusInfo) {
        let volume = status.volume.first().copied().unwrap_or(0);
        self.icon = icons::icon_name(volume, status.muted);
        self.body = format!(
            "{}: {}\n<small>{}</small>",
            status.mixer_name,
            icons::volume_label(volume, status.muted),
            status.card_name
        );
    }

    pub fn show(&mut self) -> Result<(), DBusError> {
        let proxy = self
            .connection
            .with_proxy(BUS_NAME, BUS_PATH, Duration::from_millis(500));
        let hints: HashMap<&str, Variant<u8>> =
            vec![("urgency", Variant(0u8))].into_iter().collect();
        let (id,): (u32,) = proxy.method_call(
            BUS_NAME,
            "Notify",
            (
                "voltray",
                self.last_id,
                self.icon,
                "Volume",
                self.body.as_str(),
                Vec::<String>::new(),
                hints,
                self.timeout_ms as i32,
            ),
        )?;
        debug!("notification {} shown", id);
        self.last_id = id;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.last_id == 0 {
            return;
        }
        let proxy = self
            .connection
            .with_proxy(BUS_NAME, BUS_PATH, Duration::from_millis(500));
        let _: Result<(), _> = proxy.method_call(BUS_NAME, "CloseNotification", (self.last_id,));
        self.last_id = 0;
    }
}

impl Drop for Notification {
    fn drop(&mut self) {
        self.close();
    }
}

fn icon_fallback() -> &'static str {
    icons::icon_name(0, true)
}
