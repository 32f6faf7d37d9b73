use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::{InstallerApp, OptionField, UserField};
use crate::install::InstallConfig;
use crate::wizard::TextField;

fn row(area: Rect, y: u16) -> Rect {
    Rect::new(area.x + 2, y, area.width.saturating_sub(4), 1)
}

fn fits(area: Rect, y: u16) -> bool {
    y < area.y + area.height
}

pub fn draw_welcome(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let mut y = area.y + 1;

    frame.render_widget(
        Paragraph::new(app.settings.general.subtitle.as_str())
            .style(app.theme.primary_style().add_modifier(Modifier::BOLD)),
        row(area, y),
    );
    y += 2;

    let welcome_text = [
        "This wizard will guide you through:",
        "",
        "  * Choosing the disk to install on",
        "  * Creating your user account",
        "  * Selecting timezone, language and keyboard",
        "  * Encryption, swap, desktop and services",
        "",
        "The selected disk will be completely erased.",
    ];

    for (i, line) in welcome_text.iter().enumerate() {
        if !fits(area, y) {
            return;
        }
        let style = if i == welcome_text.len() - 1 {
            app.theme.warning_style()
        } else {
            app.theme.style()
        };
        frame.render_widget(Paragraph::new(*line).style(style), row(area, y));
        y += 1;
    }

    let button_y = area.y + area.height.saturating_sub(2);
    let button_text = " [Enter] Start ";
    frame.render_widget(
        Paragraph::new(button_text).style(app.theme.selected_style()),
        Rect::new(area.x + 2, button_y, button_text.len() as u16, 1),
    );
}

pub fn draw_disks(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let mut y = area.y + 1;

    frame.render_widget(
        Paragraph::new("Select the disk to install ArchFusion OS on:").style(app.theme.style()),
        row(area, y),
    );
    y += 2;

    if let Some(error) = &app.inventory_error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(app.theme.error_style()),
            row(area, y),
        );
        y += 1;
    }

    if app.disks.is_empty() {
        if fits(area, y) {
            frame.render_widget(
                Paragraph::new("Press r to scan again.").style(app.theme.muted_style()),
                row(area, y),
            );
        }
        return;
    }

    let selected = app.wizard.disk_form().selected.as_deref();
    for (idx, disk) in app.disks.iter().enumerate() {
        if !fits(area, y) {
            break;
        }
        let is_cursor = idx == app.disk_cursor;
        let checkbox = if selected == Some(disk.name.as_str()) { "(*)" } else { "( )" };
        let style = if is_cursor {
            app.theme.selected_style()
        } else {
            app.theme.style()
        };

        frame.render_widget(
            Paragraph::new(format!(
                "{checkbox} {:<14} {:>8}  {}",
                disk.path(),
                disk.size,
                disk.model
            ))
            .style(style),
            row(area, y),
        );
        y += 1;
    }

    y += 1;
    if fits(area, y) {
        frame.render_widget(
            Paragraph::new("All data on the selected disk will be erased.")
                .style(app.theme.warning_style()),
            row(area, y),
        );
    }
}

/// Render a text field, with a `|` cursor when focused
fn text_field_line<'a>(field: &'a TextField, focused: bool, app: &InstallerApp) -> Line<'a> {
    if !focused {
        return Line::from(Span::styled(field.content(), app.theme.style()));
    }
    let (before, after) = field.split_at_cursor();
    Line::from(vec![
        Span::styled(before, app.theme.style()),
        Span::styled("|", app.theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::styled(after, app.theme.style()),
    ])
}

pub fn draw_user(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let form = app.wizard.user_form();
    let mut y = area.y + 1;

    for field in UserField::ALL {
        if !fits(area, y) {
            return;
        }
        let focused = app.user_field == field;
        let label_style = if focused {
            app.theme.primary_style().add_modifier(Modifier::BOLD)
        } else {
            app.theme.style()
        };
        frame.render_widget(
            Paragraph::new(field.label()).style(label_style),
            Rect::new(area.x + 2, y, 12, 1),
        );

        let value = match field {
            UserField::Username => text_field_line(&form.username, focused, app),
            UserField::Hostname => text_field_line(&form.hostname, focused, app),
            UserField::Timezone => choice_line(&form.timezone, focused, app),
            UserField::Locale => choice_line(&form.locale, focused, app),
            UserField::Keymap => choice_line(&form.keymap, focused, app),
        };
        frame.render_widget(
            Paragraph::new(value),
            Rect::new(area.x + 15, y, area.width.saturating_sub(17), 1),
        );
        y += 2;
    }

    if fits(area, y) {
        frame.render_widget(
            Paragraph::new("Username: letters, digits, '_' and '-'; hostname defaults when empty")
                .style(app.theme.muted_style()),
            row(area, y),
        );
    }
}

fn choice_line<'a>(value: &'a str, focused: bool, app: &InstallerApp) -> Line<'a> {
    if focused {
        Line::from(Span::styled(format!("< {value} >"), app.theme.primary_style()))
    } else {
        Line::from(Span::styled(value, app.theme.style()))
    }
}

pub fn draw_options(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let form = app.wizard.advanced_form();
    let mut y = area.y + 1;

    let check = |on: bool| if on { "[x]" } else { "[ ]" };

    for field in OptionField::ALL {
        if !fits(area, y) {
            return;
        }
        let value = match field {
            OptionField::Encrypt => check(form.encrypt).to_string(),
            OptionField::Swap => format!("< {} GB >", form.swap_gb),
            OptionField::Desktop => format!("< {} >", form.desktop),
            OptionField::Ssh => check(form.ssh).to_string(),
            OptionField::Firewall => check(form.firewall).to_string(),
            OptionField::Bluetooth => check(form.bluetooth).to_string(),
        };
        let style = if app.option_field == field {
            app.theme.selected_style()
        } else {
            app.theme.style()
        };
        frame.render_widget(
            Paragraph::new(format!("{:<24} {value}", field.label())).style(style),
            row(area, y),
        );
        y += 1;
    }
}

fn yes_no(on: bool) -> &'static str {
    if on { "Yes" } else { "No" }
}

fn summary_rows(config: &InstallConfig) -> Vec<(&'static str, String)> {
    vec![
        ("Disk", config.device_path()),
        ("Username", config.username.clone()),
        ("Hostname", config.hostname.clone()),
        ("Timezone", config.timezone.clone()),
        ("Locale", config.locale.clone()),
        ("Keyboard", config.keymap.clone()),
        ("Encryption", yes_no(config.encrypt).to_string()),
        ("Swap", format!("{} GB", config.swap_gb)),
        ("Desktop", config.desktop.to_string()),
        ("SSH server", yes_no(config.ssh).to_string()),
        ("Firewall", yes_no(config.firewall).to_string()),
        ("Bluetooth", yes_no(config.bluetooth).to_string()),
    ]
}

pub fn draw_summary(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let mut y = area.y + 1;

    for (label, value) in summary_rows(app.wizard.model()) {
        if !fits(area, y) {
            return;
        }
        let line = Line::from(vec![
            Span::styled(format!("{label:<12}"), app.theme.muted_style()),
            Span::styled(value, app.theme.secondary_style()),
        ]);
        frame.render_widget(Paragraph::new(line), row(area, y));
        y += 1;
    }

    let button_y = area.y + area.height.saturating_sub(2);
    let button_text = " [Enter] Install ";
    frame.render_widget(
        Paragraph::new(button_text).style(app.theme.selected_style()),
        Rect::new(area.x + 2, button_y, button_text.len() as u16, 1),
    );
}
