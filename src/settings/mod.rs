//! Voltray settings handling
//!
//! ## Application/ user settings
//!
//! - Which card and mixer control the tray slider drives
//! - Tray, slider and notification behaviour
//! - External mixer application to launch
//!
//! ## Mixer storage
//!
//! - Per-card lock flags, so multi-channel controls remember whether
//!   their channels move together
//!
//! ## Usage
//!
//! First initialise the settings tree by calling `Settings::init(...)`,
//! giving it a path under which the configurations are stored. Afterwards
//! you can access settings via [`Settings::r()`](Settings::r()) and
//! [`Settings::w()`](Settings::w()).
//!
//! After applying changes to the settings, don't forget to call
//! [`sync()`](Settings::sync)!

mod app;
mod mixers;

pub use app::{AppSettings, ControlSelection, ToggleAction};
pub use mixers::MixerSettings;

use crate::error::SettingsError;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Create the required directories
pub fn scaffold() -> ProjectDirs {
    let dir = ProjectDirs::from("net", "voltray", "voltray").unwrap();
    let _ = fs::create_dir_all(&dir.config_dir());
    dir
}

/// Main settings tree
#[derive(Default, Debug)]
pub struct Settings {
    base: PathBuf,
    app: RwLock<app::AppSettings>,
    mixers: RwLock<mixers::MixerSettings>,
}

impl Settings {
    /// Create a new settings tree from a config path
    pub fn init<'p>(path: impl Into<&'p Path>) -> Result<Arc<Settings>, SettingsError> {
        let base = path.into().to_path_buf();

        let this = Arc::new(Self {
            app: RwLock::new(load_path(base.join("app.json"))),
            mixers: RwLock::new(load_path(base.join("mixers.json"))),
            base,
        });
        this.sync()?;
        Ok(this)
    }

    /// Sync any changes back to disk
    pub fn sync(self: &Arc<Self>) -> Result<(), SettingsError> {
        for (path, json) in vec![
            ("app.json", serde_json::to_string_pretty(&self.app)?),
            ("mixers.json", serde_json::to_string_pretty(&self.mixers)?),
        ] {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(self.base.join(path))
                .and_then(|mut f| f.write_all(json.as_bytes()))?;
        }
        Ok(())
    }

    /// Get read access to any stored setting
    pub fn r<'this>(self: &'this Arc<Self>) -> ReadSettings<'this> {
        ReadSettings { inner: self }
    }

    /// Wait to get exclusive write access to any settings
    pub(crate) fn w<'this>(self: &'this Arc<Self>) -> WriteSettings<'this> {
        WriteSettings { inner: self }
    }
}

fn load_path<T: Default + DeserializeOwned>(path: PathBuf) -> T {
    File::open(path)
        .and_then(|mut f| {
            let mut c = String::new();
            f.read_to_string(&mut c).map(|_| c)
        })
        .and_then(|s| serde_json::from_str(&s).map_err(Into::into))
        .unwrap_or_else(|_| T::default())
}

pub struct ReadSettings<'settings> {
    inner: &'settings Arc<Settings>,
}

impl<'s> ReadSettings<'s> {
    /// Get read access to the `app` settings
    pub fn app(self) -> RwLockReadGuard<'s, app::AppSettings> {
        self.inner.app.read().unwrap()
    }

    /// Get read access to the `mixers` settings
    pub fn mixers(self) -> RwLockReadGuard<'s, mixers::MixerSettings> {
        self.inner.mixers.read().unwrap()
    }
}

pub struct WriteSettings<'settings> {
    inner: &'settings Arc<Settings>,
}

impl<'s> WriteSettings<'s> {
    /// Get write access to the `app` settings
    pub fn app(self) -> RwLockWriteGuard<'s, app::AppSettings> {
        self.inner.app.write().unwrap()
    }

    /// Get write access to the `mixers` settings
    pub fn mixers(self) -> RwLockWriteGuard<'s, mixers::MixerSettings> {
        self.inner.mixers.write().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::init(dir.path()).unwrap();
        assert_eq!(settings.r().app().card_index, 0);
        assert_eq!(settings.r().app().mixer_app, "alsamixer");
        assert_eq!(settings.r().mixers().lock(0, "Master_0"), None);
    }

    #[test]
    fn lock_flags_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::init(dir.path()).unwrap();
        assert!(settings.w().mixers().set_lock(0, "PCM_1", true));
        settings.sync().unwrap();
        drop(settings);

        let settings = Settings::init(dir.path()).unwrap();
        assert_eq!(settings.r().mixers().lock(0, "PCM_1"), Some(true));
        assert_eq!(settings.r().mixers().lock(0, "PCM_0"), None);
    }

    #[test]
    fn app_settings_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::init(dir.path()).unwrap();
        {
            let mut app = settings.w().app();
            app.card_index = 2;
            app.set_selection(2, "PCM".to_string(), 1);
        }
        settings.sync().unwrap();
        drop(settings);

        let settings = Settings::init(dir.path()).unwrap();
        assert_eq!(settings.r().app().card_index, 2);
        assert_eq!(
            settings.r().app().selection(2),
            Some(("PCM".to_string(), 1))
        );
    }

    #[test]
    fn init_fails_on_a_missing_base() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        assert!(Settings::init(missing.as_path()).is_err());
    }
}
