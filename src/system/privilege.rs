use nix::unistd::Uid;
use tracing::error;

use crate::error::{InstallerError, Result};

/// Fail unless the process runs with root privileges.
///
/// Checked once at startup, before any terminal or wizard state exists.
pub fn ensure_privileged() -> Result<()> {
    check_uid(Uid::effective())
}

fn check_uid(uid: Uid) -> Result<()> {
    if uid.is_root() {
        return Ok(());
    }
    error!("Installer started without root privileges (euid {uid})");
    Err(InstallerError::InsufficientPrivileges { euid: uid.as_raw() })
}
