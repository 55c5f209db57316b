// ============================================================================
// LazyLedger - Liste d'actifs virtualisée
// ============================================================================
// Programme TUI : liste infinie d'actifs financiers, recherche debouncée,
// filtre par type, pagination par curseur sur un générateur mock
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : worker thread + tokio::runtime::Runtime
// 4. Annulation coopérative : CancellationToken traverse les threads
// ============================================================================

use std::io;
use std::sync::mpsc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use lazyledger::api::{fetch_assets, FetchError};
use lazyledger::app::App;
use lazyledger::cache::FetchJob;
use lazyledger::models::AssetPage;
use lazyledger::ui::ledger::list_viewport_rows;
use lazyledger::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker thread exécute les tâches async (fetch simulé)
// - Communication via mpsc channels (multi-producer, single-consumer)
// ============================================================================

/// Commandes envoyées au worker thread pour exécuter des tâches async
#[derive(Debug)]
enum AppCommand {
    /// Fetch d'une page d'actifs
    /// - job embarque la requête, la génération et le token d'annulation :
    ///   l'UI peut annuler la latence et identifier un résultat périmé
    FetchPage { job: FetchJob },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Page chargée avec succès
    PageLoaded { generation: u64, page: AssetPage },

    /// Fetch échoué (annulation comprise)
    PageFailed { generation: u64, error: FetchError },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux/WSL : ~/.local/share/lazyledger/logs/lazyledger.log
/// - macOS : ~/Library/Application Support/lazyledger/logs/lazyledger.log
/// - Windows : C:\Users\<user>\AppData\Local\lazyledger\logs\lazyledger.log
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/lazyledger/logs/lazyledger.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=lazyledger=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // Répertoire de données de la plateforme, fallback ./logs
    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("lazyledger").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"));

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : lazyledger.log.2026-08-06, etc.
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazyledger.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: lazyledger::api::assets)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour async)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(
            // Filtre les logs par niveau
            // Par défaut : debug pour lazyledger, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazyledger=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging FIRST
    // - Si init échoue, on affiche l'erreur et continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    println!("LazyLedger starting up");
    info!("LazyLedger starting up");

    // Setup du terminal en mode TUI
    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // L'état vit entièrement sur le thread UI : le worker ne communique
    // que par channels, aucun lock n'est nécessaire
    let app = App::new();

    // Crée les channels pour communication avec le worker
    // - command_tx/rx : pour envoyer des commandes au worker
    // - result_tx/rx : pour recevoir les résultats du worker
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    // Lance le worker thread en arrière-plan
    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx);

    // Crée le gestionnaire d'événements
    let events = EventHandler::new();

    // Exécute l'event loop
    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Background async worker avec channels
// - Thread séparé qui traite les fetchs async
// - Reçoit des AppCommand via un channel (command_rx)
// - Envoie des AppResult via un autre channel (result_tx)
// - L'annulation arrive par le token embarqué dans le job : le select!
//   du fetcher se réveille même si le worker est bloqué dans block_on
// ============================================================================

/// Worker thread qui exécute les fetchs en arrière-plan
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        // Crée un runtime tokio pour ce thread
        // CONCEPT : Runtime per-thread
        // - Permet d'exécuter du code async dans un thread standard
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

        // Boucle de traitement des commandes
        loop {
            match command_rx.recv() {
                Ok(AppCommand::FetchPage { job }) => {
                    debug!(cursor = job.request.cursor, generation = job.generation, "Worker received fetch");

                    // block_on() bloque le thread worker (pas l'UI)
                    let generation = job.generation;
                    let result = runtime.block_on(async {
                        fetch_assets(&job.request, job.cancel).await
                    });

                    match result {
                        Ok(page) => {
                            info!(
                                generation,
                                items = page.len(),
                                "Page fetched successfully"
                            );
                            let _ = result_tx.send(AppResult::PageLoaded { generation, page });
                        }
                        Err(error) => {
                            // L'annulation est un déroulement normal (clé supplantée)
                            debug!(generation, %error, "Fetch did not complete");
                            let _ = result_tx.send(AppResult::PageFailed { generation, error });
                        }
                    }
                }
                Err(_) => {
                    // Channel fermé, on quitte
                    info!("Worker thread exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Game Loop / Event Loop Pattern
// - À chaque itération :
//   0. Traiter les résultats du worker
//   1. Dessiner l'interface (render)
//   2. Traiter les événements (input)
//   3. Mettre à jour l'état (update : debounce, fetch suivant)
// ============================================================================

/// Exécute la boucle principale de l'application
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        if !app.is_running() {
            break;
        }

        // ========================================
        // 0. RÉSULTATS : Draine les résultats du worker
        // ========================================
        // CONCEPT : Non-blocking receive avec try_recv
        // - Ok(result) : traite le résultat
        // - Empty : pas de résultat, continue
        // - Disconnected : worker mort (erreur)
        loop {
            match result_rx.try_recv() {
                Ok(AppResult::PageLoaded { generation, page }) => {
                    // Un résultat d'une génération périmée est écarté ici
                    if !app.cache.complete_fetch(generation, page) {
                        debug!(generation, "Stale page discarded");
                    }
                }
                Ok(AppResult::PageFailed { generation, error }) => {
                    match error {
                        // Annulation attendue : une requête plus fraîche a pris le relais
                        FetchError::Cancelled => debug!(generation, "Fetch cancelled"),
                    }
                    app.cache.fail_fetch(generation);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER : Dessine l'interface
        // ========================================
        // La hauteur du viewport suit la taille réelle du terminal
        let size = terminal.size()?;
        app.set_viewport_rows(list_viewport_rows(size.height));

        terminal.draw(|frame| render(frame, &app))?;

        // ========================================
        // 2. INPUT : Traite les événements
        // ========================================
        match events.next() {
            Ok(event) => handle_event(&mut app, event),
            Err(_) => {
                // Erreur lors de la lecture d'événement
            }
        }

        // ========================================
        // 3. UPDATE : Met à jour l'état
        // ========================================
        // Le tick fait échoir le debounce de recherche, puis la fenêtre
        // virtuelle décide si la page suivante doit partir
        app.tick();
        if let Some(job) = app.next_fetch() {
            let _ = command_tx.send(AppCommand::FetchPage { job });
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT : Event Handler Pattern
// - Sépare la logique de gestion des événements
// - Guard clauses sur l'écran courant : une touche n'a de sens que dans
//   son contexte (la recherche capture les caractères, par exemple)
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
fn handle_event(app: &mut App, event: lazyledger::ui::events::Event) {
    use lazyledger::ui::events::{
        get_char_from_event, is_backspace_event, is_bottom_event, is_down_event, is_enter_event,
        is_escape_event, is_filter_event, is_page_down_event, is_page_up_event, is_quit_event,
        is_reset_event, is_search_char_event, is_search_event, is_space_event, is_top_event,
        is_up_event, Event,
    };

    match event {
        // Touche 'q' : quit confirmation two-step (pas en mode saisie,
        // où 'q' est un caractère comme un autre)
        Event::Key(_) if is_quit_event(&event) && !app.is_in_search_mode() => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // ========================================
        // Ledger : navigation et ouverture des modes
        // ========================================

        // '/' : entrer en mode recherche
        Event::Key(_) if is_search_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            debug!("User entered search mode");
            app.start_search();
        }

        // 'f' : ouvrir le panneau de filtre
        Event::Key(_) if is_filter_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            debug!("User opened filter panel");
            app.open_filter_panel();
        }

        Event::Key(_) if is_up_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_prev();
        }
        Event::Key(_) if is_down_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_next();
        }
        Event::Key(_) if is_page_up_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_page_up();
        }
        Event::Key(_) if is_page_down_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_page_down();
        }
        Event::Key(_) if is_top_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_first();
        }
        Event::Key(_) if is_bottom_event(&event) && app.is_on_ledger() => {
            app.cancel_quit();
            app.select_last();
        }

        // ========================================
        // Search Input : Gestion de la saisie
        // ========================================

        // ESC : effacer la recherche et revenir à la liste
        Event::Key(_) if is_escape_event(&event) && app.is_in_search_mode() => {
            info!("User cleared search");
            app.clear_search();
        }

        // Enter : valider la recherche immédiatement
        Event::Key(_) if is_enter_event(&event) && app.is_in_search_mode() => {
            info!(term = %app.search_input.trim(), "User submitted search");
            app.submit_search();
        }

        // Backspace : supprimer le dernier caractère
        Event::Key(_) if is_backspace_event(&event) && app.is_in_search_mode() => {
            app.backspace_search();
        }

        // Caractères : ajouter au buffer (le debounce commitera)
        Event::Key(_) if is_search_char_event(&event) && app.is_in_search_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.push_search_char(c);
            }
        }

        // ========================================
        // Filter Panel : sélection staged
        // ========================================

        // ESC : fermer sans appliquer
        Event::Key(_) if is_escape_event(&event) && app.is_on_filter_panel() => {
            debug!("User closed filter panel without applying");
            app.close_filter_panel();
        }

        // Enter : appliquer la sélection staged
        Event::Key(_) if is_enter_event(&event) && app.is_on_filter_panel() => {
            info!(filter = app.staged_filter.label(), "User applied filter");
            app.apply_filter();
        }

        // Espace : stager l'option surlignée
        Event::Key(_) if is_space_event(&event) && app.is_on_filter_panel() => {
            app.stage_highlighted_filter();
        }

        // 'r' : reset de la sélection staged vers "All assets"
        Event::Key(_) if is_reset_event(&event) && app.is_on_filter_panel() => {
            debug!("User reset staged filter");
            app.reset_staged_filter();
        }

        Event::Key(_) if is_up_event(&event) && app.is_on_filter_panel() => {
            app.filter_cursor_up();
        }
        Event::Key(_) if is_down_event(&event) && app.is_on_filter_panel() => {
            app.filter_cursor_down();
        }

        Event::Tick => {
            // Tick régulier : le debounce échoit dans app.tick()
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation si active
            app.cancel_quit();
        }

        _ => {
            // Autres événements : ignorés
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// CONCEPT RUST : Terminal raw mode
// - Raw mode : on reçoit tous les caractères directement
// - Alternate screen : écran secondaire (ne pollue pas l'historique)
//
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture // Active la souris (optionnel)
    )?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
///
/// Appelé dans main() même en cas d'erreur, pour ne pas laisser le
/// terminal cassé
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
