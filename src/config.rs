use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::install::{DesktopEnvironment, InstallConfig};
use crate::install::model::{DEFAULT_SWAP_GB, clamp_swap};
use crate::system::CompletionAction;

const DEFAULT_CONFIG_PATH: &str = "/etc/archfusion/installer.toml";

/// Prints the phase markers with pauses so dry runs exercise the real supervisor
const DRYRUN_SCRIPT: &str = r#"
echo "Installateur ArchFusion (simulation) $*"
for phase in "Partitionnement de /dev/$3" "Formatage des partitions" "Montage des systèmes de fichiers" \
             "Installation du système de base" "Configuration du système" \
             "Installation de l'environnement de bureau" "Finalisation"; do
    echo "$phase"
    sleep 1
    echo "  ok"
done
echo "Installation terminée"
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    pub general: GeneralConfig,
    pub installer: InstallerCommandConfig,
    pub defaults: DefaultsConfig,
    pub choices: ChoicesConfig,
    pub completion: CompletionConfig,
}

impl InstallerSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: InstallerSettings = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(settings)
    }

    pub fn is_dryrun(&self) -> bool {
        self.general.dryrun
    }

    /// Installer invocation prefix; in dry-run mode a harmless simulation
    pub fn installer_command(&self) -> Vec<String> {
        if self.general.dryrun {
            return vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                DRYRUN_SCRIPT.to_string(),
                "install.sh".to_string(),
            ];
        }
        self.installer.command.clone()
    }

    /// Starting values for a new wizard session
    pub fn initial_config(&self) -> InstallConfig {
        let d = &self.defaults;
        InstallConfig {
            device: String::new(),
            username: String::new(),
            hostname: d.hostname.clone(),
            timezone: d.timezone.clone(),
            locale: d.locale.clone(),
            keymap: d.keymap.clone(),
            encrypt: d.encrypt,
            swap_gb: clamp_swap(d.swap_gb),
            desktop: d.desktop,
            ssh: d.ssh,
            firewall: d.firewall,
            bluetooth: d.bluetooth,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    pub subtitle: String,
    /// Simulate everything: sample disks, scripted installer, no power actions
    pub dryrun: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "ArchFusion OS Installer".to_string(),
            subtitle: "Install ArchFusion OS on this computer".to_string(),
            dryrun: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerCommandConfig {
    /// Program and leading arguments. The first element may be a privilege
    /// wrapper such as `sudo`.
    pub command: Vec<String>,
}

impl Default for InstallerCommandConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "sudo".to_string(),
                "/usr/share/archfusion/install.sh".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub hostname: String,
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
    pub swap_gb: u32,
    pub desktop: DesktopEnvironment,
    pub encrypt: bool,
    pub ssh: bool,
    pub firewall: bool,
    pub bluetooth: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let model = InstallConfig::default();
        Self {
            hostname: model.hostname,
            timezone: model.timezone,
            locale: model.locale,
            keymap: model.keymap,
            swap_gb: DEFAULT_SWAP_GB,
            desktop: model.desktop,
            encrypt: model.encrypt,
            ssh: model.ssh,
            firewall: model.firewall,
            bluetooth: model.bluetooth,
        }
    }
}

/// Values the user step cycles through
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChoicesConfig {
    pub timezones: Vec<String>,
    pub locales: Vec<String>,
    pub keymaps: Vec<String>,
}

impl Default for ChoicesConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            timezones: owned(&[
                "Europe/Paris",
                "Europe/London",
                "America/New_York",
                "America/Los_Angeles",
                "Asia/Tokyo",
                "Australia/Sydney",
            ]),
            locales: owned(&[
                "fr_FR.UTF-8",
                "en_US.UTF-8",
                "de_DE.UTF-8",
                "es_ES.UTF-8",
                "it_IT.UTF-8",
                "pt_PT.UTF-8",
            ]),
            keymaps: owned(&["fr", "us", "de", "es", "it", "pt", "uk"]),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub action: CompletionAction,
}
