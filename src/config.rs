use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;
use kan_vod_core::CoreConfig;

const CONFIG_FILE: &str = "kan-vod.conf";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub log_level: String,
    pub log_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { core: CoreConfig::default(), log_level: "info".to_string(), log_file: true }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("il.org", "kan", "kan-vod")
}

fn config_file_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
}

/// Read the config file from the platform config dir, then the working dir.
/// No file at all means defaults.
pub fn read_config() -> Result<AppConfig, io::Error> {
    let candidates = config_file_path().into_iter().chain(Some(PathBuf::from(CONFIG_FILE)));
    for path in candidates {
        match fs::read_to_string(&path) {
            Ok(content) => return Ok(parse_config(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(AppConfig::default())
}

/// `key=value` lines; `#` comments, unknown keys and bad numbers are ignored.
pub fn parse_config(content: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else { continue };
        let v = v.trim();
        let core = &mut cfg.core;
        match k.trim() {
            "api_base" => core.api_base = v.to_string(),
            "main_category_id" => core.main_category_id = v.parse().unwrap_or(core.main_category_id),
            "catalog_type" => core.catalog_type = v.parse().unwrap_or(core.catalog_type),
            "category_from" => core.category_from = v.parse().unwrap_or(core.category_from),
            "category_to" => core.category_to = v.parse().unwrap_or(core.category_to),
            "user_agent" => core.user_agent = v.to_string(),
            "timeout_secs" => core.timeout_secs = v.parse().unwrap_or(core.timeout_secs),
            "embed_base" => core.embed_base = v.to_string(),
            "partner_id" => core.partner_id = v.parse().unwrap_or(core.partner_id),
            "uiconf_id" => core.uiconf_id = v.parse().unwrap_or(core.uiconf_id),
            "quality_threshold" => core.quality_threshold = v.parse().unwrap_or(core.quality_threshold),
            "plugin_title" => core.plugin_title = v.to_string(),
            "log_level" => cfg.log_level = v.to_string(),
            "log_file" => cfg.log_file = v.parse::<u8>().map(|n| n != 0).unwrap_or(cfg.log_file),
            _ => {}
        }
    }
    cfg
}
