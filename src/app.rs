// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Encapsulation : les champs sensibles sont privés, accès via méthodes
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - L'App possède le QueryCache : pas de singleton global
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::api::PAGE_SIZE;
use crate::cache::{FetchJob, QueryCache};
use crate::models::{QueryKey, TypeFilter};
use crate::ui::virtual_list::{self, OVERSCAN, ROW_HEIGHT};

/// Délai de debounce de la recherche
///
/// Les frappes éditent un buffer local ; le terme trimé n'entre dans la
/// clé de requête qu'après ce délai sans nouvelle frappe. Évite un fetch
/// par frappe.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : la liste virtualisée des actifs
    Ledger,

    /// Mode saisie : édite le terme de recherche
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Capture les touches pour construire un buffer
    /// - Enter valide immédiatement, ESC efface et ressort
    SearchInput,

    /// Panneau de filtre : sélection staged, appliquée sur confirmation
    FilterPanel,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Cache de pagination (pages chargées, fetch en vol, génération)
    pub cache: QueryCache,

    /// Buffer de saisie de la recherche (vivant, pas encore commité)
    pub search_input: String,

    /// Dernière frappe dans le buffer de recherche (base du debounce)
    /// CONCEPT : Debounce par timestamp
    /// - Chaque frappe repousse l'échéance
    /// - tick() commite quand le délai s'est écoulé sans frappe
    search_dirty_at: Option<Instant>,

    /// Sélection staged du panneau de filtre (commitée par Apply seulement)
    pub staged_filter: TypeFilter,

    /// Option surlignée dans le panneau de filtre
    pub filter_cursor: usize,

    /// Ligne sélectionnée dans la liste (bornée aux lignes chargées)
    pub selected_index: usize,

    /// Offset de scroll de la liste, en lignes de terminal
    pub scroll_offset: usize,

    /// Hauteur de la zone liste, mise à jour à chaque itération de la boucle
    pub viewport_rows: usize,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,
}

impl App {
    /// Crée une nouvelle instance de App sur la requête par défaut
    pub fn new() -> Self {
        Self {
            running: true,
            current_screen: Screen::Ledger,
            cache: QueryCache::new(PAGE_SIZE),
            search_input: String::new(),
            search_dirty_at: None,
            staged_filter: TypeFilter::default(),
            filter_cursor: 0,
            selected_index: 0,
            scroll_offset: 0,
            viewport_rows: 0,
            confirm_quit: false,
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Écrans
    // ========================================================================

    /// Vérifie si on est sur la vue liste
    pub fn is_on_ledger(&self) -> bool {
        self.current_screen == Screen::Ledger
    }

    /// Vérifie si on est en mode saisie de recherche
    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::SearchInput
    }

    /// Vérifie si le panneau de filtre est ouvert
    pub fn is_on_filter_panel(&self) -> bool {
        self.current_screen == Screen::FilterPanel
    }

    /// Entre en mode saisie de recherche
    ///
    /// Le buffer existant est conservé : on édite le terme courant
    pub fn start_search(&mut self) {
        self.current_screen = Screen::SearchInput;
    }

    /// Ouvre le panneau de filtre
    ///
    /// CONCEPT : Staged selection
    /// - La sélection staged part du filtre commité
    /// - Rien n'est appliqué tant que l'utilisateur ne confirme pas
    pub fn open_filter_panel(&mut self) {
        self.staged_filter = self.cache.key().filter();
        self.filter_cursor = TypeFilter::OPTIONS
            .iter()
            .position(|o| *o == self.staged_filter)
            .unwrap_or(0);
        self.current_screen = Screen::FilterPanel;
    }

    /// Ferme le panneau de filtre sans appliquer
    pub fn close_filter_panel(&mut self) {
        self.current_screen = Screen::Ledger;
    }

    // ========================================================================
    // Recherche (buffer + debounce)
    // ========================================================================

    /// Ajoute un caractère au buffer de recherche et relance le debounce
    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.search_dirty_at = Some(Instant::now());
    }

    /// Supprime le dernier caractère du buffer et relance le debounce
    pub fn backspace_search(&mut self) {
        self.search_input.pop();
        self.search_dirty_at = Some(Instant::now());
    }

    /// Valide la recherche immédiatement et retourne à la liste
    pub fn submit_search(&mut self) {
        self.commit_search_now();
        self.current_screen = Screen::Ledger;
    }

    /// Efface la recherche (bouton "clear") et retourne à la liste
    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.commit_search_now();
        self.current_screen = Screen::Ledger;
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// CONCEPT : Event Loop Pattern
    /// - Appelé régulièrement (au plus toutes les 250ms)
    /// - C'est ici que le debounce de recherche échoit
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Variante testable de tick() avec une horloge explicite
    fn tick_at(&mut self, now: Instant) {
        if let Some(dirty_at) = self.search_dirty_at {
            if now.duration_since(dirty_at) >= SEARCH_DEBOUNCE {
                debug!(term = %self.search_input.trim(), "Search debounce elapsed");
                self.commit_search_now();
            }
        }
    }

    /// Commite le buffer de recherche dans la clé de requête
    ///
    /// Le filtre commité est conservé tel quel. Si la clé change, la vue
    /// repart en haut (l'ancien scroll n'a plus de sens).
    fn commit_search_now(&mut self) {
        self.search_dirty_at = None;
        let key = QueryKey::new(&self.search_input, self.cache.key().filter());
        if self.cache.set_key(key) {
            info!(term = %self.search_input.trim(), "Search committed");
            self.reset_view();
        }
    }

    // ========================================================================
    // Panneau de filtre (staged -> apply / reset)
    // ========================================================================

    /// Monte le curseur du panneau de filtre
    pub fn filter_cursor_up(&mut self) {
        self.filter_cursor = self.filter_cursor.saturating_sub(1);
    }

    /// Descend le curseur du panneau de filtre
    pub fn filter_cursor_down(&mut self) {
        let max = TypeFilter::OPTIONS.len() - 1;
        self.filter_cursor = (self.filter_cursor + 1).min(max);
    }

    /// Stage l'option surlignée
    pub fn stage_highlighted_filter(&mut self) {
        self.staged_filter = TypeFilter::OPTIONS[self.filter_cursor];
    }

    /// Remet la sélection staged sur "All assets" (reset explicite)
    pub fn reset_staged_filter(&mut self) {
        self.staged_filter = TypeFilter::default();
    }

    /// Applique la sélection staged à la clé de requête et ferme le panneau
    ///
    /// Le terme de recherche courant est commité en même temps (un
    /// debounce en attente n'a plus lieu d'être).
    pub fn apply_filter(&mut self) {
        self.search_dirty_at = None;
        let key = QueryKey::new(&self.search_input, self.staged_filter);
        if self.cache.set_key(key) {
            info!(filter = self.staged_filter.label(), "Filter applied");
            self.reset_view();
        }
        self.current_screen = Screen::Ledger;
    }

    // ========================================================================
    // Liste virtualisée (sélection, scroll, fenêtre)
    // ========================================================================

    /// Remet la vue en haut (changement de clé de requête)
    fn reset_view(&mut self) {
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    /// Met à jour la hauteur du viewport de la liste
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows;
        self.ensure_selected_visible();
    }

    /// Nombre total de lignes virtuelles (chargées + sentinelle)
    pub fn total_rows(&self) -> usize {
        virtual_list::total_rows(self.cache.loaded_count(), self.cache.has_more())
    }

    /// Tranche d'indices à matérialiser pour le rendu
    pub fn visible_window(&self) -> std::ops::Range<usize> {
        virtual_list::visible_range(
            self.scroll_offset,
            self.viewport_rows,
            ROW_HEIGHT,
            self.total_rows(),
            OVERSCAN,
        )
    }

    /// Navigue vers le haut dans la liste
    ///
    /// CONCEPT RUST : Saturating arithmetic
    /// - saturating_sub() : soustrait mais ne descend pas en dessous de 0
    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
        self.ensure_selected_visible();
    }

    /// Navigue vers le bas dans la liste
    ///
    /// La sélection est bornée aux lignes chargées ; la ligne sentinelle
    /// est atteignable par le scroll mais pas sélectionnable.
    pub fn select_next(&mut self) {
        let max = self.cache.loaded_count().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max);
        self.ensure_selected_visible();
    }

    /// Descend d'un viewport entier
    pub fn select_page_down(&mut self) {
        let max = self.cache.loaded_count().saturating_sub(1);
        self.selected_index = (self.selected_index + self.viewport_rows.max(1)).min(max);
        self.ensure_selected_visible();
    }

    /// Monte d'un viewport entier
    pub fn select_page_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(self.viewport_rows.max(1));
        self.ensure_selected_visible();
    }

    /// Saute à la première ligne
    pub fn select_first(&mut self) {
        self.selected_index = 0;
        self.ensure_selected_visible();
    }

    /// Saute à la dernière ligne chargée
    pub fn select_last(&mut self) {
        self.selected_index = self.cache.loaded_count().saturating_sub(1);
        self.ensure_selected_visible();
    }

    /// Ajuste le scroll pour garder la sélection dans le viewport
    fn ensure_selected_visible(&mut self) {
        if self.viewport_rows == 0 {
            return;
        }

        let top = self.selected_index * ROW_HEIGHT;
        let bottom = (self.selected_index + 1) * ROW_HEIGHT;

        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > self.scroll_offset + self.viewport_rows {
            self.scroll_offset = bottom - self.viewport_rows;
        }

        // Ne jamais scroller au-delà du bas de la liste virtuelle
        let max = virtual_list::max_scroll_offset(self.total_rows(), ROW_HEIGHT, self.viewport_rows);
        self.scroll_offset = self.scroll_offset.min(max);
    }

    /// Démarre le fetch de la page suivante si la fenêtre l'exige
    ///
    /// CONCEPT : Infinite scroll
    /// - Déclenché quand la ligne sentinelle entre dans la fenêtre rendue
    /// - Le cache fait respecter le single-flight et la fin de flux
    pub fn next_fetch(&mut self) -> Option<FetchJob> {
        let window = self.visible_window();
        if !virtual_list::reached_loading_edge(&window, self.cache.loaded_count()) {
            return None;
        }
        self.cache.begin_fetch()
    }
}

// ============================================================================
// Trait Default
// ============================================================================
// Convention Rust : si new() ne prend pas de paramètres, implémenter Default
// ============================================================================

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::generate_asset;
    use crate::models::{AssetPage, AssetType};

    /// Charge une page de n actifs dans le cache de l'app
    fn load_page(app: &mut App, n: usize, next: Option<u64>) {
        let job = app.cache.begin_fetch().expect("fetch should start");
        let page = AssetPage {
            items: (0..n).map(|i| generate_asset(i, job.request.cursor)).collect(),
            next_cursor: next,
        };
        assert!(app.cache.complete_fetch(job.generation, page));
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.is_on_ledger());
        assert_eq!(app.cache.loaded_count(), 0);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_app_quit_two_step() {
        let mut app = App::new();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());

        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());

        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_search_debounce_commits_after_delay() {
        let mut app = App::new();
        app.start_search();
        for c in "solana".chars() {
            app.push_search_char(c);
        }

        // Avant l'échéance : la clé n'a pas bougé
        let now = Instant::now();
        app.tick_at(now);
        assert_eq!(app.cache.key().search_term(), None);

        // Après 500ms sans frappe : le terme trimé est commité
        app.tick_at(now + SEARCH_DEBOUNCE + Duration::from_millis(100));
        assert_eq!(app.cache.key().search_term(), Some("solana"));
    }

    #[test]
    fn test_search_keystroke_restarts_debounce() {
        let mut app = App::new();
        app.start_search();
        app.push_search_char('g');

        // La frappe vient d'avoir lieu : pas de commit au tick immédiat
        app.tick_at(Instant::now());
        assert_eq!(app.cache.key().search_term(), None);
        assert!(app.search_dirty_at.is_some());
    }

    #[test]
    fn test_submit_search_commits_immediately() {
        let mut app = App::new();
        app.start_search();
        app.push_search_char('x');
        app.submit_search();

        assert!(app.is_on_ledger());
        assert_eq!(app.cache.key().search_term(), Some("x"));
        // Le debounce en attente est consommé
        assert!(app.search_dirty_at.is_none());
    }

    #[test]
    fn test_clear_search_commits_empty_term() {
        let mut app = App::new();
        app.start_search();
        app.push_search_char('x');
        app.submit_search();

        app.start_search();
        app.clear_search();
        assert_eq!(app.cache.key().search_term(), None);
        assert!(app.search_input.is_empty());
    }

    #[test]
    fn test_key_change_resets_view() {
        let mut app = App::new();
        app.set_viewport_rows(10);
        load_page(&mut app, 50, Some(50));

        app.select_last();
        assert!(app.scroll_offset > 0);

        // Nouvelle recherche : scroll et sélection repartent en haut
        app.start_search();
        app.push_search_char('z');
        app.submit_search();
        assert_eq!(app.scroll_offset, 0);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.cache.loaded_count(), 0);
    }

    #[test]
    fn test_staged_filter_not_applied_without_confirm() {
        let mut app = App::new();
        app.open_filter_panel();
        app.filter_cursor_down();
        app.filter_cursor_down();
        app.filter_cursor_down();
        app.stage_highlighted_filter();
        assert_eq!(app.staged_filter, TypeFilter::Only(AssetType::Crypto));

        // Fermer sans appliquer : le filtre commité ne bouge pas
        app.close_filter_panel();
        assert_eq!(app.cache.key().filter(), TypeFilter::All);
    }

    #[test]
    fn test_apply_filter_commits_staged_selection() {
        let mut app = App::new();
        app.open_filter_panel();
        app.filter_cursor_down();
        app.stage_highlighted_filter();
        app.apply_filter();

        assert!(app.is_on_ledger());
        assert_eq!(
            app.cache.key().filter(),
            TypeFilter::Only(AssetType::Equity)
        );
    }

    #[test]
    fn test_reset_staged_filter() {
        let mut app = App::new();
        app.open_filter_panel();
        app.filter_cursor_down();
        app.stage_highlighted_filter();
        app.reset_staged_filter();
        assert_eq!(app.staged_filter, TypeFilter::All);
    }

    #[test]
    fn test_reopening_panel_stages_committed_filter() {
        let mut app = App::new();
        app.open_filter_panel();
        app.filter_cursor_down();
        app.stage_highlighted_filter();
        app.apply_filter();

        app.open_filter_panel();
        assert_eq!(app.staged_filter, TypeFilter::Only(AssetType::Equity));
        assert_eq!(app.filter_cursor, 1);
    }

    #[test]
    fn test_navigation_clamped_to_loaded_rows() {
        let mut app = App::new();
        app.set_viewport_rows(10);
        load_page(&mut app, 3, Some(50));

        app.select_next();
        app.select_next();
        assert_eq!(app.selected_index, 2);

        // La sentinelle (indice 3) n'est pas sélectionnable
        app.select_next();
        assert_eq!(app.selected_index, 2);

        app.select_prev();
        app.select_prev();
        app.select_prev();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_scroll_follows_selection() {
        let mut app = App::new();
        app.set_viewport_rows(10);
        load_page(&mut app, 50, Some(50));

        for _ in 0..15 {
            app.select_next();
        }
        // Sélection 15, viewport 10 : la ligne 15 doit être la dernière visible
        assert_eq!(app.selected_index, 15);
        assert_eq!(app.scroll_offset, 6);

        app.select_first();
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_next_fetch_triggers_at_loading_edge() {
        let mut app = App::new();
        app.set_viewport_rows(10);

        // Chargement initial : rien de chargé, la sentinelle est visible
        let job = app.next_fetch().expect("initial fetch");
        assert_eq!(job.request.cursor, 0);

        // Single-flight : pas de second fetch tant que le premier est en vol
        assert!(app.next_fetch().is_none());
    }

    #[test]
    fn test_next_fetch_waits_for_scroll_proximity() {
        let mut app = App::new();
        app.set_viewport_rows(10);
        load_page(&mut app, 50, Some(50));

        // En haut de la liste : la sentinelle (indice 50) est loin
        assert!(app.next_fetch().is_none());

        // Près du bas : l'overscan fait entrer la sentinelle dans la fenêtre
        app.select_last();
        let job = app.next_fetch().expect("fetch near the end");
        assert_eq!(job.request.cursor, 50);
    }

    #[test]
    fn test_no_fetch_at_end_of_stream() {
        let mut app = App::new();
        app.set_viewport_rows(10);
        load_page(&mut app, 50, None);

        app.select_last();
        assert!(app.next_fetch().is_none());
    }
}
