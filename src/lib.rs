// ============================================================================
// LazyLedger - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;    // Générateur mock + fetcher paginé
pub mod app;    // État de l'application
pub mod cache;  // Pilote de pagination par clé de requête
pub mod models; // Structures de données
pub mod ui;     // Interface utilisateur
