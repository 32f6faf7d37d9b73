use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::InstallerSettings;
use crate::install::{ProcessOutcome, Supervisor, SupervisorEvent};
use crate::system::{CompletionAction, Disk, DiskInventory};
use crate::ui::Theme;
use crate::wizard::{DestructiveWarning, Step, Wizard};

/// Installer output lines kept for the log pane
pub const LOG_CAPACITY: usize = 500;

/// Work the event loop must do on the app's behalf
#[derive(Debug)]
pub enum InstallerAction {
    /// Feed events from this installation run back into the app
    Watch(mpsc::UnboundedReceiver<SupervisorEvent>),
    /// Installation succeeded and the operator chose the completion action
    Complete(CompletionAction),
}

/// Confirm action dialog state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Install(DestructiveWarning),
    Quit,
    Complete(CompletionAction),
}

/// Message displayed to the user
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub time: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Hostname,
    Timezone,
    Locale,
    Keymap,
}

impl UserField {
    pub const ALL: [UserField; 5] = [
        UserField::Username,
        UserField::Hostname,
        UserField::Timezone,
        UserField::Locale,
        UserField::Keymap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UserField::Username => "Username",
            UserField::Hostname => "Hostname",
            UserField::Timezone => "Timezone",
            UserField::Locale => "Locale",
            UserField::Keymap => "Keyboard",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, UserField::Username | UserField::Hostname)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Encrypt,
    Swap,
    Desktop,
    Ssh,
    Firewall,
    Bluetooth,
}

impl OptionField {
    pub const ALL: [OptionField; 6] = [
        OptionField::Encrypt,
        OptionField::Swap,
        OptionField::Desktop,
        OptionField::Ssh,
        OptionField::Firewall,
        OptionField::Bluetooth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OptionField::Encrypt => "Disk encryption (LUKS)",
            OptionField::Swap => "Swap size",
            OptionField::Desktop => "Desktop environment",
            OptionField::Ssh => "SSH server",
            OptionField::Firewall => "Firewall",
            OptionField::Bluetooth => "Bluetooth",
        }
    }
}

/// Move to the neighbouring entry of a fixed field list, wrapping around
fn step_field<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let idx = all.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    all[next]
}

fn cycle_choice(choices: &[String], current: &str, forward: bool) -> Option<String> {
    let len = choices.len();
    if len == 0 {
        return None;
    }
    let next = match choices.iter().position(|c| c == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(choices[next].clone())
}

/// Main installer application state
pub struct InstallerApp {
    pub settings: InstallerSettings,
    pub theme: Theme,
    pub wizard: Wizard,
    supervisor: Supervisor,
    inventory: Arc<dyn DiskInventory>,

    // Disk step
    pub disks: Vec<Disk>,
    pub disk_cursor: usize,
    /// Why the last scan produced nothing usable, shown on the disk step
    pub inventory_error: Option<String>,

    // Form focus
    pub user_field: UserField,
    pub option_field: OptionField,

    // Installation progress
    pub progress: u8,
    pub status_line: String,
    pub log: VecDeque<LogLine>,
    pub outcome: Option<ProcessOutcome>,

    // UI state
    pub message: Option<Message>,
    pub confirm_action: Option<ConfirmAction>,
    pub should_exit: bool,
    exit_when_finished: bool,
    spinner_frame: usize,
}

impl InstallerApp {
    pub fn new(settings: InstallerSettings, inventory: Arc<dyn DiskInventory>) -> Self {
        let supervisor = Supervisor::new(settings.installer_command());
        let wizard = Wizard::new(settings.initial_config());

        Self {
            settings,
            theme: Theme::default(),
            wizard,
            supervisor,
            inventory,
            disks: Vec::new(),
            disk_cursor: 0,
            inventory_error: None,
            user_field: UserField::Username,
            option_field: OptionField::Encrypt,
            progress: 0,
            status_line: String::new(),
            log: VecDeque::with_capacity(LOG_CAPACITY),
            outcome: None,
            message: None,
            confirm_action: None,
            should_exit: false,
            exit_when_finished: false,
            spinner_frame: 0,
        }
    }

    pub fn is_dryrun(&self) -> bool {
        self.settings.is_dryrun()
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    pub fn refresh_disks(&mut self) {
        match self.inventory.list_disks() {
            Ok(disks) => {
                self.inventory_error = disks
                    .is_empty()
                    .then(|| "No installable disks found".to_string());
                self.disks = disks;
                self.disk_cursor = self.disk_cursor.min(self.disks.len().saturating_sub(1));
            }
            Err(e) => {
                warn!("Disk detection failed: {e}");
                self.disks.clear();
                self.disk_cursor = 0;
                self.inventory_error = Some(e.to_string());
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        // Clear message on any key, except the outcome of an installation
        if self.message.is_some() && !self.wizard.is_installing() {
            self.message = None;
        }

        // Handle confirm dialog first
        if let Some(action) = self.confirm_action.take() {
            return self.handle_confirm_key(key, action);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.request_quit();
            return None;
        }

        match self.wizard.current() {
            Step::Welcome => self.handle_welcome_key(key),
            Step::DiskSelection => self.handle_disk_key(key),
            Step::UserConfiguration => self.handle_user_key(key),
            Step::AdvancedOptions => self.handle_options_key(key),
            Step::Summary => self.handle_summary_key(key),
            Step::Installing => self.handle_installing_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, action: ConfirmAction) -> Option<InstallerAction> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => match action {
                ConfirmAction::Install(warning) => self.start_installation(warning),
                ConfirmAction::Quit => {
                    self.quit();
                    None
                }
                ConfirmAction::Complete(action) => Some(InstallerAction::Complete(action)),
            },
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => None,
            _ => {
                self.confirm_action = Some(action);
                None
            }
        }
    }

    fn handle_welcome_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        match key.code {
            KeyCode::Enter => self.advance(),
            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),
            _ => {}
        }
        None
    }

    fn handle_disk_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.disk_cursor = self.disk_cursor.saturating_sub(1);
                self.select_disk_at_cursor();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.disk_cursor + 1 < self.disks.len() {
                    self.disk_cursor += 1;
                }
                self.select_disk_at_cursor();
            }
            KeyCode::Char('r') => self.enter_disk_step(),
            KeyCode::Enter => self.advance(),
            KeyCode::Esc => self.retreat(),
            KeyCode::Char('q') => self.request_quit(),
            _ => {}
        }
        None
    }

    fn handle_user_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        let field = self.user_field;

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.user_field = step_field(&UserField::ALL, field, true);
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.user_field = step_field(&UserField::ALL, field, false);
                return None;
            }
            KeyCode::Enter => {
                self.advance();
                return None;
            }
            KeyCode::Esc => {
                self.retreat();
                return None;
            }
            _ => {}
        }

        if field.is_text() {
            self.edit_text_field(field, key);
        } else {
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.cycle_user_choice(field, false),
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                    self.cycle_user_choice(field, true)
                }
                KeyCode::Char('q') => self.request_quit(),
                _ => {}
            }
        }
        None
    }

    fn edit_text_field(&mut self, field: UserField, key: KeyEvent) {
        let Some(form) = self.wizard.user_form_mut() else {
            return;
        };
        let buffer = match field {
            UserField::Username => &mut form.username,
            UserField::Hostname => &mut form.hostname,
            _ => return,
        };

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('u') {
                buffer.clear();
            }
            return;
        }

        match key.code {
            KeyCode::Char(c) => buffer.insert(c),
            KeyCode::Backspace => {
                buffer.delete_back();
            }
            KeyCode::Delete => {
                buffer.delete_forward();
            }
            KeyCode::Left => buffer.move_left(),
            KeyCode::Right => buffer.move_right(),
            KeyCode::Home => buffer.move_start(),
            KeyCode::End => buffer.move_end(),
            _ => {}
        }
    }

    fn cycle_user_choice(&mut self, field: UserField, forward: bool) {
        let choices = &self.settings.choices;
        let Some(form) = self.wizard.user_form_mut() else {
            return;
        };
        let (list, value) = match field {
            UserField::Timezone => (&choices.timezones, &mut form.timezone),
            UserField::Locale => (&choices.locales, &mut form.locale),
            UserField::Keymap => (&choices.keymaps, &mut form.keymap),
            _ => return,
        };
        if let Some(next) = cycle_choice(list, value, forward) {
            *value = next;
        }
    }

    fn handle_options_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        let field = self.option_field;

        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
                self.option_field = step_field(&OptionField::ALL, field, true);
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                self.option_field = step_field(&OptionField::ALL, field, false);
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust_option(field, false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                self.adjust_option(field, true)
            }
            KeyCode::Enter => self.advance(),
            KeyCode::Esc => self.retreat(),
            KeyCode::Char('q') => self.request_quit(),
            _ => {}
        }
        None
    }

    fn adjust_option(&mut self, field: OptionField, forward: bool) {
        let Some(form) = self.wizard.advanced_form_mut() else {
            return;
        };
        match field {
            OptionField::Encrypt => form.encrypt = !form.encrypt,
            OptionField::Swap if forward => form.grow_swap(),
            OptionField::Swap => form.shrink_swap(),
            OptionField::Desktop if forward => form.desktop = form.desktop.next(),
            OptionField::Desktop => form.desktop = form.desktop.prev(),
            OptionField::Ssh => form.ssh = !form.ssh,
            OptionField::Firewall => form.firewall = !form.firewall,
            OptionField::Bluetooth => form.bluetooth = !form.bluetooth,
        }
    }

    fn handle_summary_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        match key.code {
            KeyCode::Enter => match self.wizard.destructive_warning() {
                Some(warning) => self.confirm_action = Some(ConfirmAction::Install(warning)),
                None => self.set_error("Select the disk to install on".to_string()),
            },
            KeyCode::Esc => self.retreat(),
            KeyCode::Char('q') => self.request_quit(),
            _ => {}
        }
        None
    }

    fn handle_installing_key(&mut self, key: KeyEvent) -> Option<InstallerAction> {
        let Some(outcome) = &self.outcome else {
            match key.code {
                KeyCode::Char('c') => {
                    if self.supervisor.cancel() {
                        self.set_info("Cancelling installation...".to_string());
                    }
                }
                KeyCode::Char('q') => self.request_quit(),
                _ => {}
            }
            return None;
        };

        let succeeded = outcome.success();
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') if succeeded => {
                let action = self.settings.completion.action;
                if action == CompletionAction::None {
                    self.should_exit = true;
                } else {
                    self.confirm_action = Some(ConfirmAction::Complete(action));
                }
            }
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_exit = true,
            _ => {}
        }
        None
    }

    fn advance(&mut self) {
        match self.wizard.advance() {
            Ok(step) => {
                info!("Entered step {step}");
                if step == Step::DiskSelection {
                    self.enter_disk_step();
                }
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn retreat(&mut self) {
        match self.wizard.retreat() {
            Ok(Step::DiskSelection) => self.enter_disk_step(),
            Ok(_) => {}
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Rescan on every visit so hot-plugged disks and inventory errors show up
    fn enter_disk_step(&mut self) {
        self.refresh_disks();
        self.sync_disk_selection();
    }

    /// Point the cursor at the chosen disk, or choose the disk under the cursor
    fn sync_disk_selection(&mut self) {
        let selected = self.wizard.disk_form().selected.clone();
        if let Some(idx) = selected.and_then(|name| self.disks.iter().position(|d| d.name == name)) {
            self.disk_cursor = idx;
        }
        self.select_disk_at_cursor();
    }

    fn select_disk_at_cursor(&mut self) {
        let name = self.disks.get(self.disk_cursor).map(|d| d.name.clone());
        if let Some(form) = self.wizard.disk_form_mut() {
            form.selected = name;
        }
    }

    fn start_installation(&mut self, warning: DestructiveWarning) -> Option<InstallerAction> {
        let ack = warning.acknowledge();
        match self.wizard.confirm_installation(ack, &self.supervisor) {
            Ok(events) => {
                self.progress = 0;
                self.log.clear();
                self.outcome = None;
                self.status_line = "Starting installation...".to_string();
                Some(InstallerAction::Watch(events))
            }
            Err(e) => {
                warn!("Could not start installation: {e}");
                self.set_error(e.to_string());
                None
            }
        }
    }

    /// Open a new session at the summary with the failed run's configuration
    fn retry(&mut self) {
        let previous = self.wizard.model().clone();
        self.wizard = Wizard::resume(previous);
        self.outcome = None;
        self.progress = 0;
        self.status_line.clear();
        self.set_info("Review the configuration and press Enter to try again".to_string());
    }

    fn request_quit(&mut self) {
        if self.supervisor.is_running() {
            self.confirm_action = Some(ConfirmAction::Quit);
        } else {
            self.should_exit = true;
        }
    }

    fn quit(&mut self) {
        if self.supervisor.cancel() {
            self.exit_when_finished = true;
            self.set_info("Stopping the installer before exiting...".to_string());
        } else {
            self.should_exit = true;
        }
    }

    pub fn handle_supervisor_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Log(line) => self.push_log(line),
            SupervisorEvent::Progress { percent, message } => {
                self.progress = percent;
                self.status_line = message;
            }
            SupervisorEvent::Finished(outcome) => {
                if outcome.success() {
                    self.progress = 100;
                    self.set_info(outcome.message());
                } else {
                    self.set_error(outcome.message());
                }
                self.outcome = Some(outcome);
                if self.exit_when_finished {
                    self.should_exit = true;
                }
            }
        }
    }

    fn push_log(&mut self, text: String) {
        if self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            text,
        });
    }

    pub fn set_error(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: true,
        });
    }

    pub fn set_info(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: false,
        });
    }

    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 4;
    }

    pub fn spinner_char(&self) -> char {
        const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
        SPINNER[self.spinner_frame]
    }

    /// Key hints for the status bar
    pub fn key_hints(&self) -> &'static str {
        if self.confirm_action.is_some() {
            return "y:confirm  n:cancel";
        }
        match self.wizard.current() {
            Step::Welcome => "Enter:start  q:quit",
            Step::DiskSelection => "j/k:select  r:rescan  Enter:next  Esc:back",
            Step::UserConfiguration => "Tab:field  Left/Right:change  Enter:next  Esc:back",
            Step::AdvancedOptions => "j/k:field  Space/Left/Right:change  Enter:next  Esc:back",
            Step::Summary => "Enter:install  Esc:back  q:quit",
            Step::Installing => match &self.outcome {
                None => "c:cancel  q:quit",
                Some(outcome) if outcome.success() => "Enter:finish  q:quit",
                Some(_) => "r:retry  q:quit",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::InstallFailure;
    use crate::system::{DryrunInventory, InventoryError};
    use std::time::Duration;

    fn app_with(script: &str) -> InstallerApp {
        let mut settings = InstallerSettings::default();
        settings.installer.command = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "install.sh".to_string(),
        ];
        InstallerApp::new(settings, Arc::new(DryrunInventory))
    }

    struct MissingLsblk;

    impl DiskInventory for MissingLsblk {
        fn list_disks(&self) -> Result<Vec<Disk>, InventoryError> {
            Err(InventoryError::Failed("lsblk: command not found".to_string()))
        }
    }

    struct NoDisks;

    impl DiskInventory for NoDisks {
        fn list_disks(&self) -> Result<Vec<Disk>, InventoryError> {
            Ok(Vec::new())
        }
    }

    fn press(app: &mut InstallerApp, code: KeyCode) -> Option<InstallerAction> {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut InstallerApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn walk_to_summary(app: &mut InstallerApp) {
        press(app, KeyCode::Enter);
        press(app, KeyCode::Enter);
        type_text(app, "alice");
        press(app, KeyCode::Enter);
        press(app, KeyCode::Enter);
        assert_eq!(app.wizard.current(), Step::Summary);
    }

    fn confirm_install(app: &mut InstallerApp) -> mpsc::UnboundedReceiver<SupervisorEvent> {
        press(app, KeyCode::Enter);
        match press(app, KeyCode::Char('y')) {
            Some(InstallerAction::Watch(events)) => events,
            other => panic!("expected Watch, got {other:?}"),
        }
    }

    async fn pump(app: &mut InstallerApp, mut events: mpsc::UnboundedReceiver<SupervisorEvent>) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(event) = events.recv().await {
                app.handle_supervisor_event(event);
            }
        })
        .await
        .expect("installer run did not finish");
    }

    #[test]
    fn entering_disk_step_selects_first_disk() {
        let mut app = app_with("true");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.current(), Step::DiskSelection);
        assert_eq!(app.wizard.disk_form().selected.as_deref(), Some("sda"));

        press(&mut app, KeyCode::Down);
        assert_eq!(app.wizard.disk_form().selected.as_deref(), Some("nvme0n1"));
    }

    #[test]
    fn inventory_error_stays_on_disk_step() {
        let mut app = InstallerApp::new(InstallerSettings::default(), Arc::new(MissingLsblk));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.current(), Step::DiskSelection);
        assert_eq!(
            app.inventory_error.as_deref(),
            Some("Disk detection failed: lsblk: command not found")
        );

        // Still visible after further keys clear the message panel
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.current(), Step::DiskSelection);
        assert!(app.inventory_error.is_some());
    }

    #[test]
    fn empty_inventory_is_explained_on_disk_step() {
        let mut app = InstallerApp::new(InstallerSettings::default(), Arc::new(NoDisks));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.inventory_error.as_deref(), Some("No installable disks found"));
        assert!(app.wizard.disk_form().selected.is_none());
    }

    #[test]
    fn rescan_clears_a_previous_error() {
        let mut app = app_with("true");
        app.inventory_error = Some("stale".to_string());
        press(&mut app, KeyCode::Enter);
        assert!(app.inventory_error.is_none());
        assert_eq!(app.disks.len(), 3);
    }

    #[test]
    fn success_fills_the_gauge_but_failure_keeps_last_value() {
        let mut app = app_with("true");
        app.handle_supervisor_event(SupervisorEvent::Progress {
            percent: 95,
            message: "Finalisation".to_string(),
        });
        app.handle_supervisor_event(SupervisorEvent::Finished(ProcessOutcome::Succeeded));
        assert_eq!(app.progress, 100);

        let mut app = app_with("true");
        app.handle_supervisor_event(SupervisorEvent::Progress {
            percent: 85,
            message: "Installation de l'environnement de bureau".to_string(),
        });
        app.handle_supervisor_event(SupervisorEvent::Finished(ProcessOutcome::Failed(
            InstallFailure::Exit { code: Some(1), context: None },
        )));
        assert_eq!(app.progress, 85);
    }

    #[test]
    fn q_in_username_field_is_text() {
        let mut app = app_with("true");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "q");

        assert!(!app.should_exit);
        assert_eq!(app.wizard.user_form().username.content(), "q");
    }

    #[test]
    fn invalid_username_shows_error_and_stays() {
        let mut app = app_with("true");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.wizard.current(), Step::UserConfiguration);
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn choice_fields_cycle_configured_values() {
        let mut app = app_with("true");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.user_field, UserField::Timezone);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.wizard.user_form().timezone, "Europe/London");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.wizard.user_form().timezone, "Australia/Sydney");
    }

    #[test]
    fn options_adjust_swap_within_bounds() {
        let mut app = app_with("true");
        walk_to_summary(&mut app);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.option_field, OptionField::Swap);

        for _ in 0..40 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.wizard.advanced_form().swap_gb, 32);
    }

    #[test]
    fn declining_the_warning_stays_on_summary() {
        let mut app = app_with("true");
        walk_to_summary(&mut app);

        press(&mut app, KeyCode::Enter);
        match &app.confirm_action {
            Some(ConfirmAction::Install(warning)) => assert_eq!(warning.device_path(), "/dev/sda"),
            other => panic!("expected install confirmation, got {other:?}"),
        }

        assert!(press(&mut app, KeyCode::Char('n')).is_none());
        assert!(app.confirm_action.is_none());
        assert_eq!(app.wizard.current(), Step::Summary);
    }

    #[test]
    fn log_tail_is_bounded() {
        let mut app = app_with("true");
        for i in 0..600 {
            app.handle_supervisor_event(SupervisorEvent::Log(format!("line {i}")));
        }
        assert_eq!(app.log.len(), LOG_CAPACITY);
        assert_eq!(app.log.front().map(|l| l.text.as_str()), Some("line 100"));
    }

    #[test]
    fn progress_shows_latest_raw_value() {
        let mut app = app_with("true");
        app.handle_supervisor_event(SupervisorEvent::Progress {
            percent: 70,
            message: "Configuration du système".to_string(),
        });
        app.handle_supervisor_event(SupervisorEvent::Progress {
            percent: 30,
            message: "Montage".to_string(),
        });
        assert_eq!(app.progress, 30);
        assert_eq!(app.status_line, "Montage");
    }

    #[tokio::test]
    async fn successful_run_offers_completion_action() {
        let mut app = app_with("echo 'Partitionnement de /dev/sda'; echo 'Installation terminée'");
        walk_to_summary(&mut app);
        let events = confirm_install(&mut app);
        assert_eq!(app.wizard.current(), Step::Installing);

        pump(&mut app, events).await;
        assert_eq!(app.outcome, Some(ProcessOutcome::Succeeded));
        assert_eq!(app.progress, 100);
        assert_eq!(app.log.len(), 2);

        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.confirm_action,
            Some(ConfirmAction::Complete(CompletionAction::Reboot))
        );
        assert!(matches!(
            press(&mut app, KeyCode::Char('y')),
            Some(InstallerAction::Complete(CompletionAction::Reboot))
        ));
    }

    #[tokio::test]
    async fn failed_run_can_be_retried_from_summary() {
        let mut app = app_with("echo 'disk busy' >&2; exit 3");
        walk_to_summary(&mut app);
        let events = confirm_install(&mut app);
        pump(&mut app, events).await;

        let message = app.message.as_ref().expect("failure message");
        assert!(message.is_error);
        assert!(message.text.contains("exit code 3"));
        assert!(message.text.contains("disk busy"));

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.wizard.current(), Step::Summary);
        assert_eq!(app.wizard.model().username, "alice");
        assert!(app.outcome.is_none());

        let events = confirm_install(&mut app);
        pump(&mut app, events).await;
        assert!(matches!(
            app.outcome,
            Some(ProcessOutcome::Failed(InstallFailure::Exit { code: Some(3), .. }))
        ));
    }

    #[tokio::test]
    async fn quitting_during_install_cancels_first() {
        let mut app = app_with("echo Partitionnement; sleep 30");
        walk_to_summary(&mut app);
        let events = confirm_install(&mut app);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.confirm_action, Some(ConfirmAction::Quit));
        assert!(!app.should_exit);

        press(&mut app, KeyCode::Char('y'));
        pump(&mut app, events).await;

        assert!(app.should_exit);
        assert_eq!(
            app.outcome,
            Some(ProcessOutcome::Failed(InstallFailure::Cancelled))
        );
    }
}
