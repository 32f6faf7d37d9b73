mod install;
mod layout;
mod steps;
mod theme;

pub use layout::{Layout, center_rect};
pub use theme::Theme;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{ConfirmAction, InstallerApp};
use crate::wizard::Step;

/// Main draw function for the installer
pub fn draw(frame: &mut Frame, app: &InstallerApp) {
    let layout = Layout::new(frame.area());
    frame.render_widget(Clear, frame.area());

    draw_header(frame, layout.header, app);
    draw_sidebar(frame, layout.sidebar, app);
    draw_content(frame, layout.content, app);
    draw_message(frame, layout.message, app);
    draw_status_bar(frame, layout.status, app);

    // Overlays
    if let Some(action) = &app.confirm_action {
        draw_confirm_dialog(frame, action, app);
    }
}

/// 1-line header: title on the left, dry-run marker on the right
fn draw_header(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let title = format!(
        " {} (v{}) ",
        app.settings.general.title,
        env!("CARGO_PKG_VERSION")
    );
    frame.render_widget(
        Paragraph::new(title).style(app.theme.primary_style().add_modifier(Modifier::BOLD)),
        area,
    );

    if app.is_dryrun() {
        frame.render_widget(
            Paragraph::new("[DRY RUN] ")
                .style(app.theme.warning_style())
                .alignment(Alignment::Right),
            area,
        );
    }
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style())
        .title(" Steps ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let current = app.wizard.current();
    for (idx, step) in Step::ALL.iter().enumerate() {
        if idx as u16 >= inner.height {
            break;
        }

        let (marker, style) = if *step == current {
            (">", app.theme.selected_style())
        } else if step.ordinal() < current.ordinal() {
            ("x", app.theme.secondary_style())
        } else {
            (" ", app.theme.muted_style())
        };

        frame.render_widget(
            Paragraph::new(format!(" [{marker}] {}", step.short_name())).style(style),
            Rect::new(inner.x, inner.y + idx as u16, inner.width, 1),
        );
    }
}

fn draw_content(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let current = app.wizard.current();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style())
        .title(format!(" {} ", current.title()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match current {
        Step::Welcome => steps::draw_welcome(frame, inner, app),
        Step::DiskSelection => steps::draw_disks(frame, inner, app),
        Step::UserConfiguration => steps::draw_user(frame, inner, app),
        Step::AdvancedOptions => steps::draw_options(frame, inner, app),
        Step::Summary => steps::draw_summary(frame, inner, app),
        Step::Installing => install::draw_install(frame, inner, app),
    }
}

fn draw_message(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let Some(msg) = &app.message else {
        return;
    };

    let (title, border_style, text_style) = if msg.is_error {
        (" Error ", app.theme.error_style(), app.theme.error_style())
    } else {
        (" Info ", app.theme.secondary_style(), app.theme.style())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_style(border_style.add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(Line::from(Span::styled(msg.text.as_str(), text_style)))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let step = app.wizard.current();
    let left = Line::from(vec![
        Span::styled(
            format!(" {} ", step.short_name().to_uppercase()),
            app.theme.primary_style().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(app.key_hints(), app.theme.muted_style()),
    ]);
    frame.render_widget(Paragraph::new(left), area);

    let right = format!("{}/{} ", step.ordinal() + 1, Step::ALL.len());
    frame.render_widget(
        Paragraph::new(right)
            .style(app.theme.muted_style())
            .alignment(Alignment::Right),
        area,
    );
}

fn draw_confirm_dialog(frame: &mut Frame, action: &ConfirmAction, app: &InstallerApp) {
    let (title, lines, border_style): (&str, Vec<String>, Style) = match action {
        ConfirmAction::Install(warning) => (
            "Confirm Installation",
            warning.lines().to_vec(),
            app.theme.error_style(),
        ),
        ConfirmAction::Quit => (
            "Quit",
            vec![
                "An installation is running.".to_string(),
                "Stop it and quit the installer?".to_string(),
            ],
            app.theme.primary_style(),
        ),
        ConfirmAction::Complete(completion) => (
            completion.label(),
            vec![format!("{} now?", completion.label())],
            app.theme.primary_style(),
        ),
    };

    let width = 60.min(frame.area().width.saturating_sub(4));
    let height = lines.len() as u16 + 5;
    let area = center_rect(frame.area(), width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {title} "));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    for (i, line) in lines.iter().enumerate() {
        let style = if i == 0 {
            border_style.add_modifier(Modifier::BOLD)
        } else {
            app.theme.style()
        };
        frame.render_widget(
            Paragraph::new(line.as_str())
                .style(style)
                .alignment(Alignment::Center),
            Rect::new(inner.x, inner.y + 1 + i as u16, inner.width, 1),
        );
    }

    let hints = Line::from(vec![
        Span::styled("[", app.theme.style()),
        Span::styled("Y", app.theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::styled("]es / [", app.theme.style()),
        Span::styled("N", app.theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::styled("]o", app.theme.style()),
    ]);

    frame.render_widget(
        Paragraph::new(hints).alignment(Alignment::Center),
        Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerSettings;
    use crate::system::{Disk, DiskInventory, DryrunInventory, InventoryError};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn render(app: &InstallerApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn welcome_screen_renders_title_and_steps() {
        let app = InstallerApp::new(InstallerSettings::default(), Arc::new(DryrunInventory));
        let screen = render(&app);
        assert!(screen.contains("ArchFusion OS Installer"));
        assert!(screen.contains("Disk"));
        assert!(screen.contains("Enter:start"));
    }

    #[test]
    fn disk_step_lists_inventory() {
        let mut app = InstallerApp::new(InstallerSettings::default(), Arc::new(DryrunInventory));
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("/dev/sda"));
        assert!(screen.contains("476.9G"));
        assert!(screen.contains("WD_BLACK"));
    }

    struct MissingLsblk;

    impl DiskInventory for MissingLsblk {
        fn list_disks(&self) -> Result<Vec<Disk>, InventoryError> {
            Err(InventoryError::Failed("lsblk: command not found".to_string()))
        }
    }

    #[test]
    fn disk_step_shows_inventory_failure() {
        let mut app = InstallerApp::new(InstallerSettings::default(), Arc::new(MissingLsblk));
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("Disk detection failed: lsblk: command not found"));
        assert!(screen.contains("Press r to scan again."));
    }
}
