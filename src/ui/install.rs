use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};

use crate::app::InstallerApp;

pub fn draw_install(frame: &mut Frame, area: Rect, app: &InstallerApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status line
            Constraint::Length(1),
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Min(3), // Log
        ])
        .split(area.inner(Margin::new(1, 0)));

    let status = match &app.outcome {
        Some(outcome) if outcome.success() => Line::from(Span::styled(
            outcome.message(),
            app.theme.success_style().add_modifier(Modifier::BOLD),
        )),
        Some(outcome) => Line::from(Span::styled(
            outcome.message(),
            app.theme.error_style().add_modifier(Modifier::BOLD),
        )),
        None => Line::from(vec![
            Span::styled(format!("{} ", app.spinner_char()), app.theme.primary_style()),
            Span::styled(app.status_line.as_str(), app.theme.style()),
        ]),
    };
    frame.render_widget(Paragraph::new(status), chunks[0]);

    let gauge_style = match &app.outcome {
        Some(outcome) if !outcome.success() => app.theme.error_style(),
        Some(_) => app.theme.success_style(),
        None => app.theme.primary_style(),
    };
    frame.render_widget(
        Gauge::default()
            .gauge_style(gauge_style)
            .percent(u16::from(app.progress.min(100))),
        chunks[2],
    );

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(app.theme.border_style())
        .title(" Installer output ");
    let visible = block.inner(chunks[4]).height as usize;

    // Tail of the log, newest line at the bottom
    let skip = app.log.len().saturating_sub(visible);
    let items: Vec<ListItem> = app
        .log
        .iter()
        .skip(skip)
        .map(|line| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", line.time), app.theme.muted_style()),
                Span::styled(line.text.as_str(), app.theme.style()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), chunks[4]);
}
