//! Logging utilities

use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

pub(crate) fn init() {
    let filter = EnvFilter::try_from_env("VOLTRAY_LOG")
        .unwrap_or_default()
        .add_directive(LevelFilter::INFO.into());

    fmt().with_env_filter(filter).init();
    info!("Initialised logger: welcome to voltray!");
}
