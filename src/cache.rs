// ============================================================================
// Structure : QueryCache
// ============================================================================
// Pilote de pagination : possède les pages chargées par clé de requête et
// fait respecter le contrat de concurrence du fetch
//
// CONTRAT :
// - au plus un fetch en vol par clé (begin_fetch refuse sinon)
// - changer de clé annule le fetch en vol et jette les pages supplantées
// - un résultat d'une génération périmée est écarté, jamais fusionné
//
// CONCEPT : Map explicite clé canonique -> état de pagination
// - Pas de singleton global : l'App possède le cache
// - La génération est un compteur monotone, incrémenté à chaque
//   changement de clé, embarqué dans chaque job de fetch
// ============================================================================

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{Asset, AssetPage, FetchRequest, QueryKey};

/// État de pagination d'une clé de requête
///
/// CONCEPT : Vue aplatie
/// - Les pages successives sont concaténées dans `items` au fil des
///   complétions : c'est la séquence logique ordonnée que le renderer lit
#[derive(Debug)]
struct PaginationState {
    /// Tous les actifs chargés, pages concaténées dans l'ordre
    items: Vec<Asset>,

    /// Nombre de pages chargées
    page_count: usize,

    /// Curseur de la prochaine page (Some(0) au départ, None en fin de flux)
    next_cursor: Option<u64>,

    /// Un fetch est-il en vol pour cette clé ?
    is_fetching: bool,
}

impl PaginationState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            page_count: 0,
            next_cursor: Some(0),
            is_fetching: false,
        }
    }
}

/// Un job de fetch prêt à partir vers le worker
///
/// Embarque la génération (pour identifier les résultats périmés) et le
/// token d'annulation (pour interrompre la phase de latence)
#[derive(Debug)]
pub struct FetchJob {
    pub request: FetchRequest,
    pub generation: u64,
    pub cancel: CancellationToken,
}

/// Cache de requêtes paginées
pub struct QueryCache {
    /// États de pagination par clé canonique
    entries: HashMap<QueryKey, PaginationState>,

    /// Clé actuellement active (celle que la vue affiche)
    active: QueryKey,

    /// Génération courante, incrémentée à chaque changement de clé
    generation: u64,

    /// Token du fetch en vol, s'il y en a un
    inflight: Option<CancellationToken>,

    /// Taille de page demandée au fetcher
    limit: usize,
}

impl QueryCache {
    /// Crée un cache vide sur la clé par défaut (pas de recherche, All)
    pub fn new(limit: usize) -> Self {
        let active = QueryKey::default();
        let mut entries = HashMap::new();
        entries.insert(active.clone(), PaginationState::new());

        Self {
            entries,
            active,
            generation: 0,
            inflight: None,
            limit,
        }
    }

    /// Clé active
    pub fn key(&self) -> &QueryKey {
        &self.active
    }

    /// Génération courante
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========================================================================
    // Vues sur l'entrée active
    // ========================================================================

    fn active_state(&self) -> Option<&PaginationState> {
        self.entries.get(&self.active)
    }

    fn active_state_mut(&mut self) -> &mut PaginationState {
        self.entries
            .entry(self.active.clone())
            .or_insert_with(PaginationState::new)
    }

    /// Vue aplatie : tous les actifs chargés, pages concaténées
    pub fn items(&self) -> &[Asset] {
        self.active_state().map(|s| s.items.as_slice()).unwrap_or(&[])
    }

    /// Nombre d'actifs chargés
    pub fn loaded_count(&self) -> usize {
        self.items().len()
    }

    /// Nombre de pages chargées
    pub fn page_count(&self) -> usize {
        self.active_state().map(|s| s.page_count).unwrap_or(0)
    }

    /// Une page suivante existe-t-elle ?
    pub fn has_more(&self) -> bool {
        self.active_state()
            .map(|s| s.next_cursor.is_some())
            .unwrap_or(false)
    }

    /// Un fetch est-il en vol pour la clé active ?
    pub fn is_fetching(&self) -> bool {
        self.active_state().map(|s| s.is_fetching).unwrap_or(false)
    }

    /// Chargement initial : fetch en vol sans aucune page chargée
    pub fn is_initial_load(&self) -> bool {
        self.active_state()
            .map(|s| s.is_fetching && s.page_count == 0)
            .unwrap_or(false)
    }

    // ========================================================================
    // Cycle de vie d'un fetch
    // ========================================================================

    /// Change de clé de requête
    ///
    /// Annule le fetch en vol, incrémente la génération (son résultat
    /// éventuel sera écarté), jette les pages de la clé supplantée et
    /// repart du curseur 0 pour la nouvelle clé.
    ///
    /// Retourne true si la clé a effectivement changé.
    pub fn set_key(&mut self, key: QueryKey) -> bool {
        if key == self.active {
            return false;
        }

        // Annule le fetch en vol de l'ancienne clé
        if let Some(token) = self.inflight.take() {
            debug!("Cancelling in-flight fetch for superseded key");
            token.cancel();
        }

        // Les résultats de l'ancienne génération seront écartés
        self.generation += 1;

        // Jette les pages supplantées et repart de zéro
        self.entries.remove(&self.active);
        self.entries.insert(key.clone(), PaginationState::new());

        info!(generation = self.generation, ?key, "Query key changed");
        self.active = key;
        true
    }

    /// Démarre un fetch pour la clé active si le contrat l'autorise
    ///
    /// Refuse (None) si un fetch est déjà en vol pour la clé (single-flight)
    /// ou si le flux est terminé (plus de curseur de continuation).
    pub fn begin_fetch(&mut self) -> Option<FetchJob> {
        let generation = self.generation;
        let limit = self.limit;
        let key = self.active.clone();
        let state = self.active_state_mut();

        if state.is_fetching {
            return None;
        }
        let cursor = state.next_cursor?;

        state.is_fetching = true;
        let cancel = CancellationToken::new();
        self.inflight = Some(cancel.clone());

        debug!(cursor, generation, "Beginning page fetch");
        Some(FetchJob {
            request: FetchRequest::for_key(&key, cursor, limit),
            generation,
            cancel,
        })
    }

    /// Applique le résultat d'un fetch terminé
    ///
    /// Un résultat d'une génération périmée (clé changée entre-temps) est
    /// écarté : retourne false sans toucher aux pages de la clé active.
    pub fn complete_fetch(&mut self, generation: u64, page: AssetPage) -> bool {
        if generation != self.generation {
            warn!(
                stale = generation,
                current = self.generation,
                "Discarding page from superseded query"
            );
            return false;
        }

        self.inflight = None;
        let state = self.active_state_mut();
        state.is_fetching = false;
        state.next_cursor = page.next_cursor;
        state.page_count += 1;
        state.items.extend(page.items);

        info!(
            loaded = state.items.len(),
            pages = state.page_count,
            has_more = state.next_cursor.is_some(),
            "Page appended"
        );
        true
    }

    /// Solde un fetch qui a échoué (annulation comprise)
    ///
    /// Retourne false si l'échec appartient à une génération périmée.
    pub fn fail_fetch(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }

        self.inflight = None;
        let state = self.active_state_mut();
        state.is_fetching = false;
        true
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::generate_asset;
    use crate::models::{AssetType, TypeFilter};

    /// Construit une page de n actifs avec un curseur de continuation
    fn page(cursor: u64, n: usize, next: Option<u64>) -> AssetPage {
        AssetPage {
            items: (0..n).map(|i| generate_asset(i, cursor)).collect(),
            next_cursor: next,
        }
    }

    #[test]
    fn test_initial_fetch_starts_at_cursor_zero() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().expect("first fetch should start");

        assert_eq!(job.request.cursor, 0);
        assert_eq!(job.request.limit, 50);
        assert!(cache.is_fetching());
        assert!(cache.is_initial_load());
    }

    #[test]
    fn test_single_flight_per_key() {
        let mut cache = QueryCache::new(50);
        let _job = cache.begin_fetch().unwrap();

        // Un fetch est en vol : le suivant est supprimé
        assert!(cache.begin_fetch().is_none());
    }

    #[test]
    fn test_complete_appends_and_advances() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();

        assert!(cache.complete_fetch(job.generation, page(0, 50, Some(50))));
        assert_eq!(cache.loaded_count(), 50);
        assert_eq!(cache.page_count(), 1);
        assert!(cache.has_more());
        assert!(!cache.is_fetching());

        // La page suivante part bien du curseur retourné
        let job = cache.begin_fetch().unwrap();
        assert_eq!(job.request.cursor, 50);
    }

    #[test]
    fn test_end_of_stream_stops_fetching() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();
        cache.complete_fetch(job.generation, page(0, 50, None));

        assert!(!cache.has_more());
        assert!(cache.begin_fetch().is_none());
    }

    #[test]
    fn test_key_change_cancels_and_discards() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();
        let stale_generation = job.generation;

        // Changement de clé pendant le fetch : le token tombe
        let changed = cache.set_key(QueryKey::new("solana", TypeFilter::All));
        assert!(changed);
        assert!(job.cancel.is_cancelled());
        assert!(!cache.is_fetching());

        // Le résultat périmé arrive quand même : écarté, jamais fusionné
        assert!(!cache.complete_fetch(stale_generation, page(0, 50, Some(50))));
        assert_eq!(cache.loaded_count(), 0);
    }

    #[test]
    fn test_key_change_restarts_from_zero() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();
        cache.complete_fetch(job.generation, page(0, 50, Some(50)));

        cache.set_key(QueryKey::new("gold", TypeFilter::Only(AssetType::Commodity)));

        // Pages supplantées jetées, pagination repartie de zéro
        assert_eq!(cache.loaded_count(), 0);
        assert_eq!(cache.page_count(), 0);
        let job = cache.begin_fetch().unwrap();
        assert_eq!(job.request.cursor, 0);
    }

    #[test]
    fn test_same_key_is_a_no_op() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();
        cache.complete_fetch(job.generation, page(0, 50, Some(50)));

        let unchanged = cache.set_key(QueryKey::default());
        assert!(!unchanged);
        assert_eq!(cache.loaded_count(), 50);
    }

    #[test]
    fn test_failed_fetch_clears_flag() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();

        assert!(cache.fail_fetch(job.generation));
        assert!(!cache.is_fetching());

        // Le fetch peut repartir (le curseur n'a pas bougé)
        let job = cache.begin_fetch().unwrap();
        assert_eq!(job.request.cursor, 0);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut cache = QueryCache::new(50);
        let job = cache.begin_fetch().unwrap();
        let stale_generation = job.generation;

        cache.set_key(QueryKey::new("btc", TypeFilter::All));
        let job = cache.begin_fetch().unwrap();

        // L'échec de l'ancienne génération ne solde pas le fetch courant
        assert!(!cache.fail_fetch(stale_generation));
        assert!(cache.is_fetching());
        assert_eq!(job.generation, cache.generation());
    }

    #[test]
    fn test_initial_load_transitions() {
        let mut cache = QueryCache::new(50);
        assert!(!cache.is_initial_load());

        let job = cache.begin_fetch().unwrap();
        assert!(cache.is_initial_load());

        cache.complete_fetch(job.generation, page(0, 50, Some(50)));
        assert!(!cache.is_initial_load());

        // Un fetch de page suivante n'est plus un chargement initial
        cache.begin_fetch().unwrap();
        assert!(cache.is_fetching());
        assert!(!cache.is_initial_load());
    }
}
