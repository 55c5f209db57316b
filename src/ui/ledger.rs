// ============================================================================
// Ledger - Rendu de l'interface principale
// ============================================================================
// Dessine la liste virtualisée d'actifs en utilisant les widgets de ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Rendu absolu : chaque ligne visible est positionnée par son Rect,
//    seules les lignes de la fenêtre virtuelle sont matérialisées
// 4. Scrollbar : dimensionnée sur le total virtuel pour que les
//    proportions restent justes sans rendre toutes les lignes
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::Asset;
use crate::ui::filter_panel;
use crate::ui::virtual_list::ROW_HEIGHT;

/// Lignes de chrome autour de la zone liste : header (3) + footer (3)
/// + bordures du bloc liste (2)
const CHROME_ROWS: u16 = 8;

/// Hauteur utile de la liste pour un terminal de hauteur donnée
///
/// Utilisée par la boucle principale pour tenir App::viewport_rows à jour
pub fn list_viewport_rows(terminal_height: u16) -> usize {
    terminal_height.saturating_sub(CHROME_ROWS) as usize
}

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Pattern matching sur app.current_screen
/// - Le compilateur garantit l'exhaustivité (tous les cas gérés)
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);

    match app.current_screen {
        Screen::Ledger => render_footer(frame, app, chunks[2]),
        Screen::SearchInput => render_search_footer(frame, app, chunks[2]),
        Screen::FilterPanel => {
            render_footer(frame, app, chunks[2]);
            // Le panneau de filtre se dessine par-dessus la liste
            filter_panel::render_filter_panel(frame, app);
        }
    }
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : Titre et résumé de la requête
// ============================================================================

/// Dessine le header avec le titre et la requête commitée
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyLedger ")
        .title_alignment(Alignment::Center);

    // Résume la clé de requête active : terme, filtre, items chargés
    let key = app.cache.key();
    let mut spans = vec![Span::styled(
        "💼 Asset Overview",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )];

    if let Some(term) = key.search_term() {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(
            format!("🔍 \"{}\"", term),
            Style::default().fg(Color::Yellow),
        ));
    }

    if key.filter().is_active() {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(
            key.filter().label(),
            Style::default().fg(Color::Magenta),
        ));
    }

    spans.push(Span::raw("  ·  "));
    let loaded = app.cache.loaded_count();
    let more = if app.cache.has_more() { "+" } else { "" };
    spans.push(Span::styled(
        format!("{}{} assets", loaded, more),
        Style::default().fg(Color::Gray),
    ));

    let paragraph = Paragraph::new(vec![Line::from(spans)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Main Content : La liste virtualisée
// ============================================================================

/// Dessine la liste d'actifs
///
/// Seules les lignes de la fenêtre virtuelle sont construites : les
/// lignes hors viewport n'existent jamais, la scrollbar donne l'échelle.
fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📒 Assets ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Chargement initial : lignes squelettes en attendant la première page
    if app.cache.is_initial_load() {
        render_skeleton_rows(frame, inner);
        return;
    }

    // Requête commitée sans aucun résultat chargé
    if app.cache.loaded_count() == 0 {
        render_empty_state(frame, inner);
        return;
    }

    let loaded = app.cache.loaded_count();
    let items = app.cache.items();

    // CONCEPT : Rendu fenêtré
    // - app.visible_window() est la tranche d'indices à matérialiser
    // - Chaque ligne est positionnée en absolu : y = index - scroll
    // - Les lignes d'overscan au-dessus/en dessous du viewport sont
    //   ignorées au dessin (pas de surface hors écran dans un terminal)
    for index in app.visible_window() {
        let top = index * ROW_HEIGHT;
        if top < app.scroll_offset {
            continue;
        }
        let y = top - app.scroll_offset;
        if y >= inner.height as usize {
            continue;
        }

        let row_area = Rect {
            x: inner.x,
            y: inner.y + y as u16,
            width: inner.width.saturating_sub(1), // laisse la colonne scrollbar
            height: ROW_HEIGHT as u16,
        };

        if index < loaded {
            let selected = index == app.selected_index;
            frame.render_widget(asset_row(&items[index], selected), row_area);
        } else {
            // Ligne sentinelle : la page suivante arrive
            frame.render_widget(loading_row(), row_area);
        }
    }

    // Scrollbar proportionnée au total virtuel
    let mut scrollbar_state =
        ScrollbarState::new(app.total_rows()).position(app.scroll_offset);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        inner,
        &mut scrollbar_state,
    );
}

/// Construit la ligne d'un actif
///
/// Format : " Asset 42: Bitcoin            COIN-42    Crypto     4 182 530.00  ▲ +2.34%"
fn asset_row(asset: &Asset, selected: bool) -> Paragraph<'static> {
    let change_color = if asset.is_positive() { Color::Green } else { Color::Red };
    let arrow = if asset.is_positive() { "▲" } else { "▼" };

    // Tronque le nom pour éviter le débordement
    let name = truncate(&asset.name, 30);

    let mut style = Style::default();
    if selected {
        style = style
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED);
    }

    let line = Line::from(vec![
        Span::raw(format!(" {:<30} ", name)),
        Span::styled(
            format!("{:<10} ", asset.ticker),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:<13} ", asset.asset_type.label()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(format!("{:>14.2}  ", asset.value)),
        Span::styled(
            format!("{} {:+.2}%", arrow, asset.change_24h),
            Style::default().fg(change_color),
        ),
    ]);

    Paragraph::new(vec![line]).style(style)
}

/// Ligne sentinelle affichée pendant le fetch de la page suivante
fn loading_row() -> Paragraph<'static> {
    Paragraph::new(vec![Line::from(Span::styled(
        " ⏳ Loading more…",
        Style::default().fg(Color::Gray),
    ))])
}

/// Lignes squelettes du chargement initial
fn render_skeleton_rows(frame: &mut Frame, inner: Rect) {
    let style = Style::default().fg(Color::DarkGray);
    for y in 0..inner.height {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + y,
            width: inner.width,
            height: 1,
        };
        let line = Line::from(vec![
            Span::styled(" ░░░░░░░░░░░░░░░░░░░░", style),
            Span::raw("          "),
            Span::styled("░░░░░░░░░░", style),
        ]);
        frame.render_widget(Paragraph::new(vec![line]), row_area);
    }
}

/// Message affiché quand la requête ne retourne aucun actif
fn render_empty_state(frame: &mut Frame, inner: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assets found",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Ajustez la recherche (/) ou le filtre (f)",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        // Message de confirmation de quit
        // CONCEPT : Style avec BLINK pour attirer l'attention
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit  "),
            Span::styled("[/]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Search  "),
            Span::styled("[f]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Filter  "),
            Span::styled("[↑↓ / j k]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Navigate  "),
            Span::styled("[g / G]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Top / Bottom"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine le footer en mode recherche avec la ligne de saisie
///
/// CONCEPT : Modal input (Vim-like)
/// - La liste reste visible en arrière-plan et se met à jour au fil
///   des commits du debounce
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green)); // Vert pour indiquer mode input

    let input_line = Line::from(vec![
        Span::styled(
            "Search: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.search_input.clone(),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled(
            "[Enter]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Confirm  "),
        Span::styled(
            "[ESC]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Clear"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

/// Tronque une chaîne à max caractères avec une ellipse
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 1).collect();
        format!("{}…", truncated)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("court", 30), "court");
        let long = "Asset 123456: une très longue désignation d'actif";
        let cut = truncate(long, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_list_viewport_rows() {
        assert_eq!(list_viewport_rows(30), 22);
        // Terminal minuscule : pas de panique, viewport nul
        assert_eq!(list_viewport_rows(5), 0);
    }
}
