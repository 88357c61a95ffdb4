use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{project_dirs, AppConfig};

// stdout carries the host protocol, so logs go to a file or stderr.
pub fn log_path() -> Option<PathBuf> {
    let dir = project_dirs()?.data_dir().to_path_buf();
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("kan-vod.log"))
}

fn open_log_file() -> Option<File> {
    OpenOptions::new().create(true).append(true).open(log_path()?).ok()
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(cfg: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let file = if cfg.log_file { open_log_file() } else { None };
    let installed = match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(e) = installed {
        eprintln!("logging disabled: {e}");
    }
}
