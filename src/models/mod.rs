// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod asset; // Déclaration du module asset (fichier asset.rs)
pub mod page;  // Déclaration du module page (fichier page.rs)
pub mod query; // Déclaration du module query (fichier query.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazyledger::models::asset::Asset;
// On peut faire : use lazyledger::models::Asset;
pub use asset::{Asset, AssetType, TypeProfile};
pub use page::{AssetPage, FetchRequest};
pub use query::{QueryKey, TypeFilter};
