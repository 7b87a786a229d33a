//! Main usage panel: count, cost, gauge, percentage, and connection status.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph},
    Frame,
};

use tokentrack_core::config::UiSettings;
use tokentrack_core::refresh::{ConnectionStatus, UsageDisplay};
use tokentrack_core::usage::{ColorBand, UsageView};

/// Rows used inside the border
const CONTENT_ROWS: u16 = 12;

/// Usage panel widget
pub struct UsagePanel;

impl UsagePanel {
    /// Height needed to show every row (content + border)
    pub fn height() -> u16 {
        CONTENT_ROWS + 2
    }

    /// Render the panel
    pub fn render(frame: &mut Frame, area: Rect, display: &UsageDisplay, ui: &UiSettings) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", ui.title),
                Self::style(ui, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            ))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Self::style(ui, Style::default().fg(Color::Gray)));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // spacer
                Constraint::Length(1), // current
                Constraint::Length(1), // cost
                Constraint::Length(1), // spacer
                Constraint::Length(1), // gauge
                Constraint::Length(1), // spacer
                Constraint::Length(1), // total / remaining
                Constraint::Length(1), // percent
                Constraint::Length(1), // spacer
                Constraint::Length(1), // status
                Constraint::Length(1), // last update
                Constraint::Min(0),
            ])
            .split(inner);

        let view = display.view.as_ref();

        let current = match view {
            Some(v) => format!("Current: {} tokens", format_count(v.current as i64)),
            None => "Current: --".to_string(),
        };
        Self::centered(frame, rows[1], current, Self::style(ui, Style::default().fg(Color::White)));

        let cost = format!("Cost: ${:.2}", view.map_or(0.0, |v| v.estimated_cost_usd));
        Self::centered(
            frame,
            rows[2],
            cost,
            Self::style(ui, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        );

        let gauge_area = Self::gauge_area(rows[4]);
        let gauge = Gauge::default()
            .gauge_style(Self::style(ui, Style::default().fg(Color::Cyan).bg(Color::Black)))
            .ratio(view.map_or(0.0, UsageView::display_ratio))
            .label("");
        frame.render_widget(gauge, gauge_area);

        let totals = Line::from(vec![
            Span::raw(format!(
                "Total: {}",
                format_count(view.map_or(0, |v| v.total as i64))
            )),
            Span::raw("    "),
            Span::raw(match view {
                Some(v) => format!("Remaining: {}", format_count(v.remaining)),
                None => "Remaining: --".to_string(),
            }),
        ])
        .style(Self::style(ui, Style::default().fg(Color::Gray)));
        frame.render_widget(Paragraph::new(totals).alignment(Alignment::Center), rows[6]);

        let percent = view.map_or(0.0, |v| v.percent);
        let band = view.map_or(ColorBand::Low, |v| v.color_band);
        Self::centered(
            frame,
            rows[7],
            format!("{:.1}%", percent),
            Self::style(ui, Style::default().fg(band_color(band)).add_modifier(Modifier::BOLD)),
        );

        let status = match (&display.status, &display.last_error) {
            (ConnectionStatus::ConnectionError, Some(reason)) => {
                format!("{} ({})", display.status.label(), reason)
            }
            (status, _) => status.label().to_string(),
        };
        Self::centered(
            frame,
            rows[9],
            status,
            Self::style(ui, Style::default().fg(status_color(display.status))),
        );

        let last_update = match display.last_update {
            Some(at) => format!("Last update: {}", at.format("%H:%M:%S")),
            None => "Last update: --".to_string(),
        };
        Self::centered(
            frame,
            rows[10],
            last_update,
            Self::style(ui, Style::default().fg(Color::DarkGray)),
        );
    }

    /// Single centered line
    fn centered(frame: &mut Frame, area: Rect, text: String, style: Style) {
        let line = Line::from(Span::styled(text, style));
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }

    /// Gauge row with a small horizontal margin
    fn gauge_area(row: Rect) -> Rect {
        let margin = (row.width / 10).min(4);
        Rect {
            x: row.x + margin,
            width: row.width.saturating_sub(margin * 2),
            ..row
        }
    }

    /// Drop colors when disabled in settings
    fn style(ui: &UiSettings, style: Style) -> Style {
        if ui.color {
            style
        } else {
            Style::default().add_modifier(style.add_modifier)
        }
    }
}

/// Color for a usage band
pub fn band_color(band: ColorBand) -> Color {
    match band {
        ColorBand::Low => Color::Green,
        ColorBand::Medium => Color::Yellow,
        ColorBand::High => Color::Red,
    }
}

/// Color for a connection status
pub fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connecting => Color::DarkGray,
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::ConnectionError => Color::Red,
    }
}

/// Format a count with thousands separators: 1234567 -> "1,234,567"
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};
    use tokentrack_core::config::SourceKind;
    use tokentrack_core::refresh::RefreshEvent;
    use tokentrack_core::source::Unavailable;
    use tokentrack_core::usage::{compute, Pricing, UsageBudget};

    fn render_to_string(display: &UsageDisplay) -> String {
        let backend = TestBackend::new(60, UsagePanel::height());
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                UsagePanel::render(frame, area, display, &UiSettings::default());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn updated(count: u64) -> UsageDisplay {
        let mut display = UsageDisplay::for_source(SourceKind::Remote);
        display.apply(RefreshEvent::Update {
            view: compute(count, &UsageBudget::default(), &Pricing::default()),
            status: ConnectionStatus::Connected,
            at: Local::now(),
        });
        display
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(200_000), "200,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(-50_000), "-50,000");
        assert_eq!(format_count(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_band_colors() {
        assert_eq!(band_color(ColorBand::Low), Color::Green);
        assert_eq!(band_color(ColorBand::Medium), Color::Yellow);
        assert_eq!(band_color(ColorBand::High), Color::Red);
    }

    #[test]
    fn test_render_placeholder_before_first_sample() {
        let text = render_to_string(&UsageDisplay::for_source(SourceKind::Remote));
        assert!(text.contains("Current: --"));
        assert!(text.contains("Connecting..."));
        assert!(text.contains("Last update: --"));
    }

    #[test]
    fn test_render_usage() {
        let text = render_to_string(&updated(12_345));
        assert!(text.contains("Current: 12,345 tokens"));
        assert!(text.contains("Cost: $0.12"));
        assert!(text.contains("Total: 200,000"));
        assert!(text.contains("Remaining: 187,655"));
        assert!(text.contains("6.2%"));
        assert!(text.contains("Connected"));
    }

    #[test]
    fn test_render_overrun() {
        let text = render_to_string(&updated(250_000));
        assert!(text.contains("Remaining: -50,000"));
        assert!(text.contains("125.0%"));
    }

    #[test]
    fn test_render_error_keeps_numbers() {
        let mut display = updated(100_000);
        display.apply(RefreshEvent::Error {
            status: ConnectionStatus::ConnectionError,
            reason: Unavailable::Status(500),
        });
        let text = render_to_string(&display);
        assert!(text.contains("Current: 100,000 tokens"));
        assert!(text.contains("Connection error"));
        assert!(text.contains("50.0%"));
    }
}
