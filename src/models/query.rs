// ============================================================================
// Structure : QueryKey
// ============================================================================
// Identité canonique d'une requête : (texte de recherche, filtre de type)
//
// CONCEPT : Query key
// - Une clé identifie un jeu de résultats paginé logique
// - Changer la clé invalide le scroll et repart du curseur 0
// - Sert de clé de map dans le cache (d'où Hash + Eq)
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::AssetType;

/// Filtre de type appliqué à la liste
///
/// CONCEPT RUST : Enum avec données
/// - All : pas de filtre ("all" dans le contrat JSON)
/// - Only(t) : uniquement les actifs du type t
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFilter {
    All,
    Only(AssetType),
}

impl TypeFilter {
    /// Les options du panneau de filtre, dans l'ordre d'affichage
    pub const OPTIONS: [TypeFilter; 6] = [
        TypeFilter::All,
        TypeFilter::Only(AssetType::Equity),
        TypeFilter::Only(AssetType::FixedIncome),
        TypeFilter::Only(AssetType::Crypto),
        TypeFilter::Only(AssetType::RealEstate),
        TypeFilter::Only(AssetType::Commodity),
    ];

    /// Retourne le label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            TypeFilter::All => "All assets",
            TypeFilter::Only(AssetType::Equity) => "Equities",
            TypeFilter::Only(AssetType::FixedIncome) => "Fixed income",
            TypeFilter::Only(AssetType::Crypto) => "Crypto",
            TypeFilter::Only(AssetType::RealEstate) => "Real estate",
            TypeFilter::Only(AssetType::Commodity) => "Commodities",
        }
    }

    /// Vérifie si un type d'actif passe le filtre
    pub fn matches(&self, asset_type: AssetType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => *t == asset_type,
        }
    }

    /// Retourne true si un filtre est actif (autre que All)
    pub fn is_active(&self) -> bool {
        !matches!(self, TypeFilter::All)
    }
}

impl Default for TypeFilter {
    fn default() -> Self {
        TypeFilter::All
    }
}

/// Clé canonique d'une requête paginée
///
/// CONCEPT : Canonicalisation
/// - Le texte de recherche est trimé et mis en minuscules à la construction
/// - "  BitCoin " et "bitcoin" identifient donc la même entrée de cache
///   (le matching du fetcher est insensible à la casse de toute façon)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryKey {
    /// Texte de recherche canonique (trimé, minuscules, possiblement vide)
    search: String,

    /// Filtre de type
    filter: TypeFilter,
}

impl QueryKey {
    /// Construit une clé canonique depuis une saisie brute
    pub fn new(raw_search: &str, filter: TypeFilter) -> Self {
        Self {
            search: raw_search.trim().to_lowercase(),
            filter,
        }
    }

    /// Texte de recherche, None si vide
    ///
    /// CONCEPT RUST : Option<&str>
    /// - Évite de passer une String vide au fetcher
    pub fn search_term(&self) -> Option<&str> {
        if self.search.is_empty() {
            None
        } else {
            Some(&self.search)
        }
    }

    /// Filtre de type de la clé
    pub fn filter(&self) -> TypeFilter {
        self.filter
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
