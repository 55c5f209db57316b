// ============================================================================
// Filter Panel - Popup de filtre par type
// ============================================================================
// Panneau modal au-dessus de la liste : sélection staged, appliquée
// uniquement sur confirmation explicite, reset séparé vers "All assets"
//
// CONCEPT RATATUI : Popup
// - Clear efface la zone sous le popup avant de dessiner
// - Le rect est centré dans le terminal
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::TypeFilter;

/// Dessine le panneau de filtre par-dessus la liste
pub fn render_filter_panel(frame: &mut Frame, app: &App) {
    let area = centered_rect(56, (TypeFilter::OPTIONS.len() + 5) as u16, frame.size());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" 🎛  Filter assets ")
        .title_alignment(Alignment::Center);

    // Une ligne par option : curseur surligné, sélection staged marquée
    let mut lines: Vec<Line> = TypeFilter::OPTIONS
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let staged = *option == app.staged_filter;
            let marker = if staged { "●" } else { "○" };

            let mut style = if staged {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            if index == app.filter_cursor {
                style = style
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::REVERSED);
            }

            Line::from(Span::styled(
                format!("  {} {:<20}  ", marker, option.label()),
                style,
            ))
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Space]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" Select "),
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Apply "),
        Span::styled("[r]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Reset "),
        Span::styled("[ESC]", Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left);

    // Efface la zone avant de dessiner le popup
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Calcule un rect centré de taille fixe, borné au terminal
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(56, 11, area);
        assert_eq!(popup.width, 56);
        assert_eq!(popup.height, 11);
        assert_eq!(popup.x, 22);
        assert_eq!(popup.y, 14);
    }

    #[test]
    fn test_centered_rect_clamped() {
        // Terminal plus petit que le popup : borné, pas de débordement
        let area = Rect::new(0, 0, 20, 8);
        let popup = centered_rect(56, 11, area);
        assert_eq!(popup.width, 20);
        assert_eq!(popup.height, 8);
    }
}
