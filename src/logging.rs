//! Process-wide logger setup.
//!
//! On Android, records go to logcat under the `VoicevoxJNI` tag. Elsewhere
//! `env_logger` reads `RUST_LOG` and defaults to `info`.

use std::sync::Once;

/// Logcat tag for every record emitted by this library.
pub const LOG_TAG: &str = "VoicevoxJNI";

static INIT: Once = Once::new();

/// Install the platform logger. Later calls do nothing.
pub fn init() {
    INIT.call_once(install);
}

#[cfg(target_os = "android")]
fn install() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_tag(LOG_TAG)
            .with_max_level(log::LevelFilter::Debug),
    );
}

#[cfg(not(target_os = "android"))]
fn install() {
    // Another logger may already be installed by the host process.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}
