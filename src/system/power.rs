use serde::Deserialize;
use std::process::Command;
use tracing::{error, info};

/// What to offer once the installation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionAction {
    #[default]
    Reboot,
    Poweroff,
    None,
}

impl CompletionAction {
    pub fn label(&self) -> &'static str {
        match self {
            CompletionAction::Reboot => "Reboot",
            CompletionAction::Poweroff => "Power off",
            CompletionAction::None => "Quit",
        }
    }

    /// Run the action. In dry-run mode only log it.
    pub fn run(self, dryrun: bool) -> std::io::Result<()> {
        let args: &[&str] = match self {
            CompletionAction::Reboot => &["systemctl", "reboot"],
            CompletionAction::Poweroff => &["systemctl", "poweroff"],
            CompletionAction::None => return Ok(()),
        };

        if dryrun {
            info!("Dry run: skipping {}", args.join(" "));
            return Ok(());
        }

        info!("Executing {}", args.join(" "));
        let status = Command::new(args[0]).args(&args[1..]).status()?;
        if status.success() {
            Ok(())
        } else {
            error!("{} failed with status: {:?}", args.join(" "), status);
            Err(std::io::Error::other(format!("{} failed", args.join(" "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dryrun_never_executes() {
        assert!(CompletionAction::Reboot.run(true).is_ok());
        assert!(CompletionAction::Poweroff.run(true).is_ok());
        assert!(CompletionAction::None.run(false).is_ok());
    }
}
