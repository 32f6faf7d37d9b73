use serde::Deserialize;
use std::fmt;

/// Swap size the installer uses when no `--swap-size` is given
pub const DEFAULT_SWAP_GB: u32 = 4;
pub const MIN_SWAP_GB: u32 = 1;
pub const MAX_SWAP_GB: u32 = 32;

/// Desktop environment installed on top of the base system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesktopEnvironment {
    #[default]
    #[serde(alias = "kde", alias = "plasma")]
    KdePlasma,
    Gnome,
    Xfce,
    Minimal,
}

impl DesktopEnvironment {
    pub const ALL: [DesktopEnvironment; 4] = [
        DesktopEnvironment::KdePlasma,
        DesktopEnvironment::Gnome,
        DesktopEnvironment::Xfce,
        DesktopEnvironment::Minimal,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DesktopEnvironment::KdePlasma => "KDE Plasma",
            DesktopEnvironment::Gnome => "GNOME",
            DesktopEnvironment::Xfce => "XFCE",
            DesktopEnvironment::Minimal => "Minimal",
        }
    }

    /// Next entry in [`Self::ALL`], wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous entry in [`Self::ALL`], wrapping around
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Every setting needed to drive one installation.
///
/// The wizard builds this step by step. Once it is handed to the
/// supervisor it is moved by value and never touched again; changing
/// anything means starting a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Target block device name as reported by the inventory (e.g. `sda`)
    pub device: String,
    pub username: String,
    pub hostname: String,
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
    pub encrypt: bool,
    pub swap_gb: u32,
    pub desktop: DesktopEnvironment,
    pub ssh: bool,
    pub firewall: bool,
    pub bluetooth: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            username: String::new(),
            hostname: "archfusion".to_string(),
            timezone: "Europe/Paris".to_string(),
            locale: "fr_FR.UTF-8".to_string(),
            keymap: "fr".to_string(),
            encrypt: false,
            swap_gb: DEFAULT_SWAP_GB,
            desktop: DesktopEnvironment::default(),
            ssh: false,
            firewall: true,
            bluetooth: true,
        }
    }
}

impl InstallConfig {
    /// Device path shown to the operator
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.device)
    }

    /// Swap size as passed to the installer (`4G`)
    pub fn swap_size(&self) -> String {
        format!("{}G", self.swap_gb)
    }
}

pub fn clamp_swap(gb: u32) -> u32 {
    gb.clamp(MIN_SWAP_GB, MAX_SWAP_GB)
}
