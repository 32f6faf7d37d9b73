use archfusion_installer::app::{InstallerAction, InstallerApp};
use archfusion_installer::config::InstallerSettings;
use archfusion_installer::error::{InstallerError, Result};
use archfusion_installer::event::{Event, EventHandler};
use archfusion_installer::install::SupervisorEvent;
use archfusion_installer::system;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "archfusion-installer")]
#[command(author, version, about = "Terminal installer for ArchFusion OS")]
struct Args {
    /// Path to installer config file (default: /etc/archfusion/installer.toml)
    #[arg(long)]
    config: Option<String>,

    /// Simulate all operations without touching any disk
    #[arg(long)]
    dryrun: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

/// Whatever woke the event loop up
enum Incoming {
    Terminal(Option<Event>),
    Installer(SupervisorEvent),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting archfusion-installer");
        }
    }

    // Load config from specified path, default path, or use defaults
    let loaded = match args.config.as_deref() {
        Some(path) => InstallerSettings::load_from(path),
        None => InstallerSettings::load(),
    };
    let mut settings = loaded.unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {e}");
        InstallerSettings::default()
    });

    // --dryrun flag overrides config
    if args.dryrun {
        settings.general.dryrun = true;
    }

    // Refuse to start before touching the terminal
    if !settings.is_dryrun() {
        if let Err(e) = system::ensure_privileged() {
            error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let result = run_installer(&mut terminal, settings).await;

    restore_terminal()?;

    if let Err(ref e) = result {
        error!("Installer error: {}", e);
    }

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| InstallerError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| InstallerError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).map_err(|e| InstallerError::Terminal(e.to_string()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| InstallerError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen)
        .map_err(|e| InstallerError::Terminal(e.to_string()))?;
    Ok(())
}

/// Next event of the current installation run; pends forever when none is running
async fn recv_installer(
    events: &mut Option<mpsc::UnboundedReceiver<SupervisorEvent>>,
) -> Option<SupervisorEvent> {
    let Some(rx) = events.as_mut() else {
        return std::future::pending().await;
    };
    let event = rx.recv().await;
    if event.is_none() {
        *events = None;
    }
    event
}

async fn run_installer(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: InstallerSettings,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);
    let mut installer_events: Option<mpsc::UnboundedReceiver<SupervisorEvent>> = None;

    let inventory = system::create_inventory(settings.is_dryrun());
    let mut app = InstallerApp::new(settings, inventory);

    loop {
        terminal
            .draw(|frame| archfusion_installer::ui::draw(frame, &app))
            .map_err(|e| InstallerError::Terminal(e.to_string()))?;

        let incoming = tokio::select! {
            event = events.next() => Incoming::Terminal(event),
            Some(event) = recv_installer(&mut installer_events) => Incoming::Installer(event),
        };

        match incoming {
            Incoming::Terminal(None) => break,
            Incoming::Terminal(Some(Event::Key(key))) => match app.handle_key(key) {
                Some(InstallerAction::Watch(rx)) => installer_events = Some(rx),
                Some(InstallerAction::Complete(action)) => {
                    match action.run(app.is_dryrun()) {
                        Ok(()) => app.should_exit = true,
                        Err(e) => app.set_error(format!("{} failed: {}", action.label(), e)),
                    }
                }
                None => {}
            },
            Incoming::Terminal(Some(Event::Resize)) => {}
            Incoming::Terminal(Some(Event::Tick)) => app.tick(),
            Incoming::Installer(event) => app.handle_supervisor_event(event),
        }

        if app.should_exit {
            break;
        }
    }

    Ok(())
}
