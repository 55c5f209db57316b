// ============================================================================
// Structures : AssetPage et FetchRequest
// ============================================================================
// Une page de résultats et les paramètres d'une requête de page
//
// CONCEPT : Pagination par curseur
// - Le curseur marque où la génération de la page suivante reprend
// - Pas de next_cursor = fin de flux (plafond d'univers atteint)
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::{Asset, QueryKey, TypeFilter};

/// Paramètres d'une requête de page
///
/// Équivalent local du contrat d'une API de pagination distante :
/// { cursor?, limit, search?, type? }
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Offset de génération (multiple de limit, 0 pour la première page)
    pub cursor: u64,

    /// Taille de page demandée (> 0)
    pub limit: usize,

    /// Terme de recherche optionnel (déjà canonique : trimé, minuscules)
    pub search: Option<String>,

    /// Filtre de type
    pub type_filter: TypeFilter,
}

impl FetchRequest {
    /// Construit la requête d'une page pour une clé donnée
    pub fn for_key(key: &QueryKey, cursor: u64, limit: usize) -> Self {
        Self {
            cursor,
            limit,
            search: key.search_term().map(str::to_string),
            type_filter: key.filter(),
        }
    }
}

/// Une page ordonnée d'actifs avec son curseur de continuation
///
/// CONCEPT RUST : Option<u64> pour la fin de flux
/// - Some(c) : la page suivante se fetch au curseur c
/// - None : plus rien à charger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPage {
    /// Les actifs de la page, dans l'ordre de génération
    pub items: Vec<Asset>,

    /// Curseur de la page suivante, absent en fin de flux
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
}

impl AssetPage {
    /// Nombre d'actifs dans la page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Vérifie si la page est vide
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Vérifie si une page suivante existe
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_for_key() {
        let key = QueryKey::new("  Gold ", TypeFilter::All);
        let request = FetchRequest::for_key(&key, 50, 50);

        assert_eq!(request.cursor, 50);
        assert_eq!(request.limit, 50);
        assert_eq!(request.search.as_deref(), Some("gold"));
        assert_eq!(request.type_filter, TypeFilter::All);
    }

    #[test]
    fn test_fetch_request_empty_search() {
        let key = QueryKey::default();
        let request = FetchRequest::for_key(&key, 0, 50);
        assert!(request.search.is_none());
    }

    #[test]
    fn test_page_end_of_stream() {
        let page = AssetPage {
            items: Vec::new(),
            next_cursor: None,
        };
        assert!(!page.has_more());
        assert!(page.is_empty());

        // nextCursor absent du JSON en fin de flux, pas null
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("nextCursor"));
    }
}
