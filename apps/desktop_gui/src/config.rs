use std::{collections::HashMap, fs, path::PathBuf};

use clap::Parser;
use client_core::uploads::MAX_UPLOAD_BYTES;
use storage::IN_MEMORY_SESSION_URL;

const SETTINGS_FILE: &str = "risk_console.toml";
const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Parser, Debug, Default)]
#[command(name = "risk-console", about = "Financial risk analysis console")]
pub struct StartupArgs {
    /// Base URL of the file service, including the `/api` prefix.
    #[arg(long)]
    pub backend_url: Option<String>,
    /// Session store database URL (`sqlite::memory:` keeps it per process).
    #[arg(long)]
    pub session_db: Option<String>,
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
    #[arg(long)]
    pub max_upload_mb: Option<u64>,
    /// Alternate settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub session_db_url: String,
    pub assets_dir: PathBuf,
    pub download_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000/api".into(),
            session_db_url: IN_MEMORY_SESSION_URL.into(),
            assets_dir: PathBuf::from("assets"),
            download_dir: dirs::download_dir()
                .unwrap_or_else(|| PathBuf::from("downloads"))
                .join("risk_console"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then the settings file, then environment, then startup flags.
pub fn load_settings(args: &StartupArgs) -> Settings {
    let mut settings = Settings::default();

    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(&path) {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    apply_args(&mut settings, args);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    let text = |key: &str| file_cfg.get(key).and_then(toml::Value::as_str).map(str::to_string);

    if let Some(v) = text("backend_url") {
        settings.backend_url = v;
    }
    if let Some(v) = text("session_db") {
        settings.session_db_url = v;
    }
    if let Some(v) = text("assets_dir") {
        settings.assets_dir = PathBuf::from(v);
    }
    if let Some(v) = text("download_dir") {
        settings.download_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("max_upload_mb").and_then(toml::Value::as_integer) {
        if let Ok(mb) = u64::try_from(v) {
            settings.max_upload_bytes = mb.saturating_mul(BYTES_PER_MB);
        }
    }
    if let Some(v) = text("log") {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("RISK_CONSOLE_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("RISK_CONSOLE_SESSION_DB") {
        settings.session_db_url = v;
    }
    if let Some(v) = var("RISK_CONSOLE_ASSETS_DIR") {
        settings.assets_dir = PathBuf::from(v);
    }
    if let Some(v) = var("RISK_CONSOLE_DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = var("RISK_CONSOLE_MAX_UPLOAD_MB") {
        if let Ok(mb) = v.trim().parse::<u64>() {
            settings.max_upload_bytes = mb.saturating_mul(BYTES_PER_MB);
        }
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
}

fn apply_args(settings: &mut Settings, args: &StartupArgs) {
    if let Some(v) = &args.backend_url {
        settings.backend_url = v.clone();
    }
    if let Some(v) = &args.session_db {
        settings.session_db_url = v.clone();
    }
    if let Some(v) = &args.assets_dir {
        settings.assets_dir = v.clone();
    }
    if let Some(v) = &args.download_dir {
        settings.download_dir = v.clone();
    }
    if let Some(mb) = args.max_upload_mb {
        settings.max_upload_bytes = mb.saturating_mul(BYTES_PER_MB);
    }
    if let Some(v) = &args.log {
        settings.log_filter = v.clone();
    }
}
