use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("The installer must be run as root (effective uid {euid}). Use: sudo archfusion-installer")]
    InsufficientPrivileges { euid: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, InstallerError>;
