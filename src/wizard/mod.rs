//! The configuration wizard as an explicit state machine.
//!
//! Each step owns a form the front-end edits freely. Moving forward runs
//! the step's validation and merges its form into the [`InstallConfig`];
//! the Summary step can only be left towards Installing through
//! [`Wizard::confirm_installation`], after which the session is frozen.

mod error;
mod input;
mod step;

pub use error::{Result, ValidationError, WizardError};
pub use input::TextField;
pub use step::{Nav, Step};

use tokio::sync::mpsc;
use tracing::info;

use crate::install::model::clamp_swap;
use crate::install::{DesktopEnvironment, InstallConfig, Supervisor, SupervisorEvent};

const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskForm {
    /// Device name from the inventory (e.g. `nvme0n1`)
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub username: TextField,
    pub hostname: TextField,
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedForm {
    pub encrypt: bool,
    pub swap_gb: u32,
    pub desktop: DesktopEnvironment,
    pub ssh: bool,
    pub firewall: bool,
    pub bluetooth: bool,
}

impl AdvancedForm {
    pub fn grow_swap(&mut self) {
        self.swap_gb = clamp_swap(self.swap_gb.saturating_add(1));
    }

    pub fn shrink_swap(&mut self) {
        self.swap_gb = clamp_swap(self.swap_gb.saturating_sub(1));
    }
}

/// Shown before installing. Must be acknowledged to get an [`Acknowledgement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructiveWarning {
    device_path: String,
}

impl DestructiveWarning {
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("ALL DATA ON {} WILL BE ERASED!", self.device_path),
            "Cancelling later stops the installer but does not undo".to_string(),
            "changes already written to the disk.".to_string(),
        ]
    }

    pub fn acknowledge(self) -> Acknowledgement {
        Acknowledgement {
            device_path: self.device_path,
        }
    }
}

/// Proof that the operator accepted the warning for one specific device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    device_path: String,
}

/// Wizard session state
#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    disk: DiskForm,
    user: UserForm,
    advanced: AdvancedForm,
    model: InstallConfig,
    /// Used when the hostname field is left blank
    default_hostname: String,
}

impl Wizard {
    /// Start a session at Welcome. `defaults` supplies the defaulted
    /// fields; its device and username are ignored.
    pub fn new(defaults: InstallConfig) -> Self {
        let model = InstallConfig {
            device: String::new(),
            username: String::new(),
            ..defaults
        };
        let mut wizard = Self::from_model(model);
        wizard.disk.selected = None;
        wizard.user.username.clear();
        wizard
    }

    /// Start a new session at Summary with every form filled from a
    /// previous configuration, e.g. to retry after a failed installation.
    pub fn resume(config: InstallConfig) -> Self {
        let mut wizard = Self::from_model(config);
        wizard.step = Step::Summary;
        info!("Resuming installer session at summary");
        wizard
    }

    fn from_model(model: InstallConfig) -> Self {
        Self {
            step: Step::Welcome,
            disk: DiskForm {
                selected: (!model.device.is_empty()).then(|| model.device.clone()),
            },
            user: UserForm {
                username: TextField::with_value(&model.username),
                hostname: TextField::with_value(&model.hostname),
                timezone: model.timezone.clone(),
                locale: model.locale.clone(),
                keymap: model.keymap.clone(),
            },
            advanced: AdvancedForm {
                encrypt: model.encrypt,
                swap_gb: clamp_swap(model.swap_gb),
                desktop: model.desktop,
                ssh: model.ssh,
                firewall: model.firewall,
                bluetooth: model.bluetooth,
            },
            default_hostname: model.hostname.clone(),
            model,
        }
    }

    pub fn current(&self) -> Step {
        self.step
    }

    pub fn is_installing(&self) -> bool {
        self.step == Step::Installing
    }

    /// Values merged so far
    pub fn model(&self) -> &InstallConfig {
        &self.model
    }

    pub fn disk_form(&self) -> &DiskForm {
        &self.disk
    }

    pub fn user_form(&self) -> &UserForm {
        &self.user
    }

    pub fn advanced_form(&self) -> &AdvancedForm {
        &self.advanced
    }

    /// Forms stay editable until installation starts
    pub fn disk_form_mut(&mut self) -> Option<&mut DiskForm> {
        (!self.is_installing()).then_some(&mut self.disk)
    }

    pub fn user_form_mut(&mut self) -> Option<&mut UserForm> {
        (!self.is_installing()).then_some(&mut self.user)
    }

    pub fn advanced_form_mut(&mut self) -> Option<&mut AdvancedForm> {
        (!self.is_installing()).then_some(&mut self.advanced)
    }

    /// Check whether `step`'s required input is present
    pub fn validate(&self, step: Step) -> std::result::Result<(), ValidationError> {
        match step {
            Step::DiskSelection => match self.disk.selected.as_deref() {
                Some(device) if !device.trim().is_empty() => Ok(()),
                _ => Err(ValidationError::MissingDevice),
            },
            Step::UserConfiguration => validate_username(self.user.username.content().trim()),
            _ => Ok(()),
        }
    }

    pub fn advance(&mut self) -> Result<Step> {
        let next = self.next_for(Nav::Forward)?;
        self.validate(self.step)?;
        self.merge(self.step);
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Staying at Welcome is not an error.
    pub fn retreat(&mut self) -> Result<Step> {
        if self.step == Step::Welcome {
            return Ok(Step::Welcome);
        }
        self.step = self.next_for(Nav::Back)?;
        Ok(self.step)
    }

    /// The warning to show before installing; only available on Summary
    pub fn destructive_warning(&self) -> Option<DestructiveWarning> {
        (self.step == Step::Summary && !self.model.device.is_empty()).then(|| DestructiveWarning {
            device_path: self.model.device_path(),
        })
    }

    /// Freeze the configuration, enter Installing and launch the installer.
    ///
    /// On any error the wizard stays on Summary.
    pub fn confirm_installation(
        &mut self,
        ack: Acknowledgement,
        supervisor: &Supervisor,
    ) -> Result<mpsc::UnboundedReceiver<SupervisorEvent>> {
        let next = self.next_for(Nav::Confirm)?;

        if self.model.device.is_empty() {
            return Err(ValidationError::MissingDevice.into());
        }
        validate_username(&self.model.username)?;

        let expected = self.model.device_path();
        if ack.device_path != expected {
            return Err(WizardError::Acknowledgement { expected });
        }

        let events = supervisor.start(self.model.clone())?;
        info!("Installation confirmed for {expected}");
        self.step = next;
        Ok(events)
    }

    fn next_for(&self, nav: Nav) -> Result<Step> {
        self.step
            .transition(nav)
            .ok_or(WizardError::InvalidTransition { from: self.step, nav })
    }

    fn merge(&mut self, step: Step) {
        match step {
            Step::DiskSelection => {
                self.model.device = self.disk.selected.clone().unwrap_or_default();
            }
            Step::UserConfiguration => {
                let hostname = self.user.hostname.content().trim();
                self.model.username = self.user.username.content().trim().to_string();
                self.model.hostname = if hostname.is_empty() {
                    self.default_hostname.clone()
                } else {
                    hostname.to_string()
                };
                self.model.timezone = self.user.timezone.clone();
                self.model.locale = self.user.locale.clone();
                self.model.keymap = self.user.keymap.clone();
            }
            Step::AdvancedOptions => {
                let form = &self.advanced;
                self.model.encrypt = form.encrypt;
                self.model.swap_gb = form.swap_gb;
                self.model.desktop = form.desktop;
                self.model.ssh = form.ssh;
                self.model.firewall = form.firewall;
                self.model.bluetooth = form.bluetooth;
            }
            _ => {}
        }
    }
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let Some(first) = username.chars().next() else {
        return Err(ValidationError::MissingUsername);
    };

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong);
    }

    let valid_first = first.is_ascii_alphabetic() || first == '_';
    let valid_rest = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_first || !valid_rest {
        return Err(ValidationError::InvalidUsername);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::ProcessOutcome;
    use rstest::rstest;

    fn wizard_at(step: Step) -> Wizard {
        let mut wizard = Wizard::new(InstallConfig::default());
        wizard.disk_form_mut().unwrap().selected = Some("sda".to_string());
        wizard.user_form_mut().unwrap().username.set("alice");
        while wizard.current() != step {
            wizard.advance().expect("advance");
        }
        wizard
    }

    fn finishing_supervisor() -> Supervisor {
        Supervisor::new(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "echo 'Installation terminée'".to_string(),
            "install.sh".to_string(),
        ])
    }

    #[test]
    fn starts_at_welcome() {
        assert_eq!(Wizard::new(InstallConfig::default()).current(), Step::Welcome);
    }

    #[rstest]
    #[case::none(None)]
    #[case::empty(Some(""))]
    #[case::blank(Some("  "))]
    fn disk_step_requires_a_device(#[case] selected: Option<&str>) {
        let mut wizard = wizard_at(Step::DiskSelection);
        wizard.disk_form_mut().unwrap().selected = selected.map(str::to_string);

        let err = wizard.advance().unwrap_err();
        assert_eq!(err, WizardError::Validation(ValidationError::MissingDevice));
        assert_eq!(wizard.current(), Step::DiskSelection);
    }

    #[rstest]
    #[case::empty("", ValidationError::MissingUsername)]
    #[case::whitespace("   ", ValidationError::MissingUsername)]
    #[case::leading_digit("1alice", ValidationError::InvalidUsername)]
    #[case::space("al ice", ValidationError::InvalidUsername)]
    #[case::too_long(&"a".repeat(33), ValidationError::UsernameTooLong)]
    fn user_step_rejects_bad_names(#[case] name: &str, #[case] expected: ValidationError) {
        let mut wizard = wizard_at(Step::UserConfiguration);
        wizard.user_form_mut().unwrap().username.set(name);

        assert_eq!(wizard.advance().unwrap_err(), WizardError::Validation(expected));
        assert_eq!(wizard.current(), Step::UserConfiguration);
    }

    #[test]
    fn advancing_merges_each_step() {
        let mut wizard = wizard_at(Step::UserConfiguration);
        let user = wizard.user_form_mut().unwrap();
        user.username.set("  alice ");
        user.hostname.set("");
        user.timezone = "Asia/Tokyo".to_string();
        wizard.advance().unwrap();

        let advanced = wizard.advanced_form_mut().unwrap();
        advanced.encrypt = true;
        advanced.grow_swap();
        advanced.desktop = DesktopEnvironment::Gnome;
        wizard.advance().unwrap();

        let model = wizard.model();
        assert_eq!(wizard.current(), Step::Summary);
        assert_eq!(model.device, "sda");
        assert_eq!(model.username, "alice");
        assert_eq!(model.hostname, "archfusion");
        assert_eq!(model.timezone, "Asia/Tokyo");
        assert!(model.encrypt);
        assert_eq!(model.swap_gb, 5);
        assert_eq!(model.desktop, DesktopEnvironment::Gnome);
    }

    #[test]
    fn welcome_and_options_always_validate() {
        let wizard = Wizard::new(InstallConfig::default());
        assert!(wizard.validate(Step::Welcome).is_ok());
        assert!(wizard.validate(Step::AdvancedOptions).is_ok());
        assert!(wizard.validate(Step::Summary).is_ok());
    }

    #[test]
    fn retreat_at_welcome_is_a_no_op() {
        let mut wizard = Wizard::new(InstallConfig::default());
        assert_eq!(wizard.retreat(), Ok(Step::Welcome));
        assert_eq!(wizard.current(), Step::Welcome);
    }

    #[test]
    fn retreat_moves_one_step_back() {
        let mut wizard = wizard_at(Step::Summary);
        assert_eq!(wizard.retreat(), Ok(Step::AdvancedOptions));
        assert_eq!(wizard.retreat(), Ok(Step::UserConfiguration));
    }

    #[test]
    fn summary_cannot_advance_without_confirmation() {
        let mut wizard = wizard_at(Step::Summary);
        assert_eq!(
            wizard.advance().unwrap_err(),
            WizardError::InvalidTransition { from: Step::Summary, nav: Nav::Forward }
        );
    }

    #[test]
    fn warning_only_on_summary() {
        assert!(wizard_at(Step::AdvancedOptions).destructive_warning().is_none());
        let warning = wizard_at(Step::Summary).destructive_warning().expect("warning");
        assert_eq!(warning.device_path(), "/dev/sda");
        assert!(warning.lines()[0].contains("/dev/sda"));
    }

    #[tokio::test]
    async fn confirm_freezes_session_and_starts_installer() {
        let mut wizard = wizard_at(Step::Summary);
        let supervisor = finishing_supervisor();
        let ack = wizard.destructive_warning().unwrap().acknowledge();

        let mut events = wizard.confirm_installation(ack, &supervisor).expect("confirm");
        assert_eq!(wizard.current(), Step::Installing);

        let mut outcome = None;
        while let Some(event) = events.recv().await {
            if let SupervisorEvent::Finished(o) = event {
                outcome = Some(o);
            }
        }
        assert_eq!(outcome, Some(ProcessOutcome::Succeeded));

        assert!(wizard.user_form_mut().is_none());
        assert!(matches!(
            wizard.retreat(),
            Err(WizardError::InvalidTransition { from: Step::Installing, .. })
        ));
        assert!(wizard.advance().is_err());
        assert_eq!(wizard.current(), Step::Installing);
    }

    #[tokio::test]
    async fn acknowledgement_must_name_the_target() {
        let mut wizard = wizard_at(Step::Summary);
        let other = wizard_at(Step::Summary);
        wizard.retreat().unwrap();
        wizard.retreat().unwrap();
        wizard.retreat().unwrap();
        wizard.disk_form_mut().unwrap().selected = Some("nvme0n1".to_string());
        while wizard.current() != Step::Summary {
            wizard.advance().unwrap();
        }

        let stale = other.destructive_warning().unwrap().acknowledge();
        let err = wizard.confirm_installation(stale, &finishing_supervisor()).unwrap_err();
        assert_eq!(
            err,
            WizardError::Acknowledgement { expected: "/dev/nvme0n1".to_string() }
        );
        assert_eq!(wizard.current(), Step::Summary);
    }

    #[tokio::test]
    async fn busy_supervisor_keeps_wizard_on_summary() {
        let supervisor = Supervisor::new(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "sleep 30".to_string(),
        ]);
        let mut first = wizard_at(Step::Summary);
        let ack = first.destructive_warning().unwrap().acknowledge();
        let mut events = first.confirm_installation(ack, &supervisor).expect("first run");

        let mut second = wizard_at(Step::Summary);
        let ack = second.destructive_warning().unwrap().acknowledge();
        let err = second.confirm_installation(ack, &supervisor).unwrap_err();
        assert!(matches!(err, WizardError::Supervisor(_)));
        assert_eq!(second.current(), Step::Summary);

        supervisor.cancel();
        while events.recv().await.is_some() {}
    }

    #[test]
    fn confirm_outside_summary_is_rejected() {
        let mut wizard = wizard_at(Step::AdvancedOptions);
        let ack = wizard_at(Step::Summary).destructive_warning().unwrap().acknowledge();
        let err = wizard
            .confirm_installation(ack, &finishing_supervisor())
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition { .. }));
    }

    #[test]
    fn resume_reopens_at_summary_with_same_model() {
        let previous = wizard_at(Step::Summary).model().clone();
        let wizard = Wizard::resume(previous.clone());
        assert_eq!(wizard.current(), Step::Summary);
        assert_eq!(wizard.model(), &previous);
        assert_eq!(wizard.user_form().username.content(), "alice");
        assert_eq!(wizard.disk_form().selected.as_deref(), Some("sda"));
    }
}
