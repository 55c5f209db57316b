// ============================================================================
// Module : api
// ============================================================================
// Ce module contient la couche "réseau" de l'application : un générateur
// mock déterministe qui se comporte comme une API de pagination distante
// (latence, filtrage côté serveur, curseur de continuation, annulation)
// ============================================================================

pub mod assets; // Générateur + fetcher paginé

// Re-export des fonctions principales
pub use assets::{fetch_assets, generate_asset, FetchError, FETCH_LATENCY, MAX_TOTAL_ITEMS, PAGE_SIZE};
