// ============================================================================
// API Client : Assets (générateur mock)
// ============================================================================
// Simule une API de pagination distante : latence fixe, filtrage côté
// "serveur", curseur de continuation. Les données sont synthétiques et
// déterministes, ce qui rend la pagination reproductible entre re-fetchs.
//
// CONCEPTS RUST :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. tokio::select! : course entre la latence et le token d'annulation
// 3. thiserror : erreur typée que l'appelant peut matcher
// ============================================================================

use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::models::{Asset, AssetPage, AssetType, FetchRequest};

/// Taille de page standard de l'application
pub const PAGE_SIZE: usize = 50;

/// Latence simulée d'un aller-retour "réseau"
pub const FETCH_LATENCY: time::Duration = time::Duration::from_millis(500);

/// Plafond de l'univers synthétique : plus aucun curseur de continuation
/// n'est émis une fois ce total atteint
pub const MAX_TOTAL_ITEMS: u64 = 1_000_000;

/// Facteur de sur-génération avant filtrage
///
/// On génère 4× la page demandée pour que les pages restent pleines après
/// filtrage. C'est un best-effort : un terme de recherche étroit peut quand
/// même retourner moins de `limit` items alors que d'autres correspondances
/// existent plus loin dans le flux. Le curseur avance de `limit` dans tous
/// les cas.
const BATCH_FACTOR: usize = 4;

/// Erreurs de la couche fetch
///
/// CONCEPT RUST : thiserror
/// - Une seule variante : l'annulation d'une requête supplantée
/// - Une page vide ou une fin de flux ne sont PAS des erreurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    /// La requête a été annulée avant résolution
    #[error("requête annulée avant résolution")]
    Cancelled,
}

// ============================================================================
// Générateur pseudo-aléatoire déterministe
// ============================================================================
// CONCEPT : Seed par index, jamais par horloge
// - frac(sin(seed + 12345) × 10000) donne un flottant dans [0, 1)
// - Le même seed produit toujours la même valeur
// ============================================================================

/// Valeur pseudo-aléatoire dans [0, 1), fonction pure du seed
fn pseudo_random(seed: u64) -> f64 {
    let x = ((seed as f64) + 12_345.0).sin() * 10_000.0;
    x - x.floor()
}

/// Génère un actif synthétique, fonction pure de (index, cursor)
///
/// - `index` : position dans le batch généré (seed du pseudo-aléatoire)
/// - `cursor` : offset de la page (entre dans l'identité, pas dans le seed)
///
/// Le type cycle par `index mod 5` ; le prix vaut le prix de base du type
/// multiplié par un facteur dans [0.8, 1.2) ; la quantité tombe dans
/// [0.1, 10.0) et la variation 24h dans [-10, +10).
pub fn generate_asset(index: usize, cursor: u64) -> Asset {
    let asset_type = AssetType::ALL[index % AssetType::ALL.len()];
    let profile = asset_type.profile();

    let price_var = 0.8 + pseudo_random(index as u64) * 0.4;
    let quantity = 0.1 + pseudo_random(index as u64 + 1) * 9.9;
    let price = (profile.base_price * price_var).round();
    let asset_num = cursor + index as u64 + 1;

    Asset {
        id: format!("asset-{}", asset_num),
        name: format!("Asset {}: {}", asset_num, profile.names[index % profile.names.len()]),
        ticker: format!("{}-{}", profile.prefix, asset_num),
        asset_type,
        price,
        quantity,
        value: price * quantity,
        change_24h: pseudo_random(index as u64 + 2) * 20.0 - 10.0,
    }
}

// ============================================================================
// Fetch d'une page
// ============================================================================

/// Récupère une page d'actifs (latence simulée, filtrage, curseur)
///
/// CONCEPT RUST : tokio::select!
/// - La phase de latence court contre le token d'annulation
/// - Si le token tombe pendant la latence : FetchError::Cancelled,
///   aucun travail de génération/filtrage n'est effectué
/// - Un fetch déjà passé la latence va jusqu'au bout (l'appelant
///   écarte alors son résultat obsolète)
///
/// # Arguments
/// * `request` - Paramètres de la page (curseur, limite, filtres)
/// * `cancel` - Token d'annulation coopérative
///
/// # Retourne
/// * `Ok(AssetPage)` - La page filtrée, tronquée à `limit`, avec son
///   curseur de continuation (absent si le plafond est atteint)
/// * `Err(FetchError::Cancelled)` - Requête annulée pendant la latence
#[instrument(skip(cancel), fields(cursor = request.cursor, limit = request.limit))]
pub async fn fetch_assets(
    request: &FetchRequest,
    cancel: CancellationToken,
) -> Result<AssetPage, FetchError> {
    // Token déjà tombé : on échoue avant même d'attendre
    if cancel.is_cancelled() {
        debug!("Fetch aborted before latency phase");
        return Err(FetchError::Cancelled);
    }

    // Phase de latence, annulable
    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Fetch cancelled during latency phase");
            return Err(FetchError::Cancelled);
        }
        _ = time::sleep(FETCH_LATENCY) => {}
    }

    // Sur-génère un batch de 4× la page demandée
    let batch_size = request.limit * BATCH_FACTOR;
    let mut assets: Vec<Asset> = (0..batch_size)
        .map(|i| generate_asset(i, request.cursor))
        .collect();

    // Filtre de type d'abord
    if let crate::models::TypeFilter::Only(wanted) = request.type_filter {
        assets.retain(|a| a.asset_type == wanted);
    }

    // Puis recherche insensible à la casse sur le nom OU le ticker
    if let Some(term) = request.search.as_deref() {
        let term = term.to_lowercase();
        assets.retain(|a| {
            a.name.to_lowercase().contains(&term) || a.ticker.to_lowercase().contains(&term)
        });
    }

    // Tronque à la taille de page demandée
    assets.truncate(request.limit);

    // Le curseur avance de `limit`, sauf si le plafond serait atteint
    let next = request.cursor + request.limit as u64;
    let next_cursor = if next < MAX_TOTAL_ITEMS { Some(next) } else { None };

    info!(
        returned = assets.len(),
        next_cursor = ?next_cursor,
        "Fetched asset page"
    );

    Ok(AssetPage {
        items: assets,
        next_cursor,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueryKey, TypeFilter};

    fn plain_request(cursor: u64, limit: usize) -> FetchRequest {
        FetchRequest::for_key(&QueryKey::default(), cursor, limit)
    }

    #[test]
    fn test_generate_asset_deterministic() {
        // Le même (index, cursor) produit exactement le même actif
        let a = generate_asset(7, 100);
        let b = generate_asset(7, 100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_asset_type_cycle() {
        // Le type cycle par index mod 5
        for (i, expected) in AssetType::ALL.iter().enumerate() {
            assert_eq!(generate_asset(i, 0).asset_type, *expected);
            assert_eq!(generate_asset(i + 5, 0).asset_type, *expected);
        }
    }

    #[test]
    fn test_generate_asset_ranges() {
        for index in 0..200 {
            let asset = generate_asset(index, 0);
            let base = asset.asset_type.profile().base_price;

            // Prix = base × [0.8, 1.2), arrondi à l'entier
            assert!(asset.price >= (base * 0.8).floor());
            assert!(asset.price <= (base * 1.2).ceil());

            assert!(asset.quantity >= 0.1 && asset.quantity < 10.0);
            assert!(asset.change_24h >= -10.0 && asset.change_24h < 10.0);
            assert_eq!(asset.value, asset.price * asset.quantity);
        }
    }

    #[test]
    fn test_generate_asset_identity() {
        let asset = generate_asset(0, 50);
        assert_eq!(asset.id, "asset-51");
        assert_eq!(asset.ticker, "NSE-51");
        assert!(asset.name.starts_with("Asset 51: "));
    }

    // CONCEPT RUST : #[tokio::test(start_paused = true)]
    // - Horloge virtuelle : la latence de 500ms s'écoule instantanément
    // - Les tests restent déterministes et rapides
    #[tokio::test(start_paused = true)]
    async fn test_fetch_first_page() {
        let request = plain_request(0, 50);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.len(), 50);
        assert_eq!(page.items[0].id, "asset-1");
        assert_eq!(page.items[49].id, "asset-50");
        assert_eq!(page.next_cursor, Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_type_filter() {
        let key = QueryKey::new("", TypeFilter::Only(AssetType::Crypto));
        let request = FetchRequest::for_key(&key, 0, 10);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        // Batch de 40 générés, 8 cryptos : la page reste sous la limite
        // (heuristique best-effort, pas de garantie de page pleine)
        assert!(page.len() <= 10);
        assert_eq!(page.len(), 8);
        assert!(page.items.iter().all(|a| a.asset_type == AssetType::Crypto));
        assert_eq!(page.next_cursor, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_search_matches_name() {
        let key = QueryKey::new("Solana", TypeFilter::All);
        let request = FetchRequest::for_key(&key, 0, 10);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        assert!(!page.is_empty());
        assert!(page.items.iter().all(|a| a.name.contains("Solana")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_search_matches_ticker_case_insensitive() {
        // Terme non canonique : le fetcher matche quand même sans casse
        let request = FetchRequest {
            cursor: 0,
            limit: 10,
            search: Some("goi".to_string()),
            type_filter: TypeFilter::All,
        };
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        assert!(!page.is_empty());
        assert!(page.items.iter().all(|a| a.ticker.starts_with("GOI-")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_empty_result_is_not_an_error() {
        // Aucune correspondance : page vide MAIS curseur présent,
        // distinguable d'une annulation et d'une fin de flux
        let key = QueryKey::new("zzzzzz", TypeFilter::All);
        let request = FetchRequest::for_key(&key, 0, 50);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.next_cursor, Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_universe_cap() {
        // Dernière page : curseur 999950 + 50 = 1 000 000, plafond atteint
        let request = plain_request(999_950, 50);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.len(), 50);
        assert!(page.next_cursor.is_none());

        // Avant-dernière page : la continuation est encore émise
        let request = plain_request(999_900, 50);
        let page = fetch_assets(&request, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.next_cursor, Some(999_950));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_cancelled_during_latency() {
        let token = CancellationToken::new();
        let request = plain_request(0, 50);

        let handle = {
            let token = token.clone();
            tokio::spawn(async move { fetch_assets(&request, token).await })
        };

        // Annule 10ms après le départ, bien avant les 500ms de latence
        time::sleep(time::Duration::from_millis(10)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(FetchError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();

        let request = plain_request(0, 50);
        let result = fetch_assets(&request, token).await;
        assert_eq!(result, Err(FetchError::Cancelled));
    }
}
