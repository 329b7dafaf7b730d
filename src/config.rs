//! Runtime settings.
//!
//! Settings come from an optional JSON file named by `ORDER_DESK_CONFIG`,
//! followed by a couple of environment overrides for the values staff change
//! most often. Every field has a default so an empty file (or no file) gives a
//! working setup against a backend on `localhost:3000`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DeskError;
use crate::sync::DiffMode;

pub const CONFIG_ENV: &str = "ORDER_DESK_CONFIG";
pub const API_URL_ENV: &str = "ORDER_DESK_API_URL";
pub const POLL_SECS_ENV: &str = "ORDER_DESK_POLL_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub sync: SyncSettings,
    pub printer: PrinterSettings,
    pub receipt: ReceiptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Per-request timeout. `None` keeps reqwest's default of no timeout, so a
    /// hung backend stalls the loop until the transport gives up.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    pub poll_interval_secs: u64,
    pub diff_mode: DiffMode,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            diff_mode: DiffMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrinterTransportKind {
    /// USB printer-class device, written through its `usblp` device node.
    Usb,
    /// USB device that exposes a serial port (CDC or USB-serial bridge).
    UsbSerial,
    Tcp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrinterSettings {
    pub transport: PrinterTransportKind,
    pub vendor_id: u16,
    pub product_id: u16,
    pub baud_rate: u32,
    pub host: String,
    pub port: u16,
    pub paper_width_mm: i32,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            transport: PrinterTransportKind::Usb,
            vendor_id: 0x04b8,
            product_id: 0x0e28,
            baud_rate: 9600,
            host: "127.0.0.1".to_string(),
            port: 9100,
            paper_width_mm: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReceiptSettings {
    pub merchant_name: String,
    pub address: String,
    pub phone: String,
    pub contact_url: String,
    pub thank_you_lines: Vec<String>,
    /// Print each line item's real quantity instead of the fixed `1` the
    /// receipt has always shown.
    pub use_item_quantity: bool,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self {
            merchant_name: "Puesto BASAÑEZ".to_string(),
            address: "Cristóbal Colón 401, Zona Centro, 89000 Tampico.".to_string(),
            phone: "Tel: 833 315 3054".to_string(),
            contact_url: "https://wa.me/message/JBQLUVO2WXMJJ1".to_string(),
            thank_you_lines: vec![
                "¡Gracias por su compra!".to_string(),
                "¡Regrese pronto!".to_string(),
            ],
            use_item_quantity: false,
        }
    }
}

impl Settings {
    /// Load settings from `ORDER_DESK_CONFIG` (if set) and apply environment
    /// overrides.
    pub fn load() -> Result<Self, DeskError> {
        let mut settings = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, DeskError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| DeskError::Config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| DeskError::Config(format!("cannot parse {}: {e}", path.display())))?;
        info!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<(), DeskError> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(raw) = std::env::var(POLL_SECS_ENV) {
            self.sync.poll_interval_secs = raw
                .trim()
                .parse()
                .map_err(|_| DeskError::Config(format!("{POLL_SECS_ENV}={raw} is not a number")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DeskError> {
        if self.api.base_url.trim().is_empty() {
            return Err(DeskError::Config("api.base_url must not be empty".into()));
        }
        if self.sync.poll_interval_secs == 0 {
            return Err(DeskError::Config(
                "sync.poll_interval_secs must be > 0".into(),
            ));
        }
        if self.api.request_timeout_secs == Some(0) {
            return Err(DeskError::Config(
                "api.request_timeout_secs must be > 0 when set".into(),
            ));
        }
        if self.printer.transport == PrinterTransportKind::Tcp && self.printer.host.trim().is_empty()
        {
            return Err(DeskError::Config(
                "printer.host is required for the tcp transport".into(),
            ));
        }
        Ok(())
    }
}

/// Directory for rolling log files.
pub fn log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join("com.thesmall.orderdesk").join("logs")
}
