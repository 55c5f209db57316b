// ============================================================================
// Structure : Asset
// ============================================================================
// Représente un actif financier synthétique du ledger
//
// CONCEPTS RUST :
// 1. #[derive(...)] : génère automatiquement l'implémentation de traits
//    - Debug : permet d'afficher la structure avec {:?}
//    - Clone : permet de dupliquer la valeur
//    - Serialize/Deserialize : conversion JSON automatique via serde
//
// 2. Enum fermé : AssetType a exactement 5 variants
//    - Le compilateur force l'exhaustivité des match
//    - Ajouter un variant est une rupture de compatibilité du contrat JSON
// ============================================================================

use serde::{Deserialize, Serialize};

/// Type d'actif financier (taxonomie fermée)
///
/// CONCEPT RUST : #[serde(rename_all = "snake_case")]
/// - Equity -> "equity", FixedIncome -> "fixed_income", etc.
/// - C'est le tag utilisé par le contrat JSON, ne pas en ajouter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Equity,     // Action (ex: Reliance Ind, TCS)
    FixedIncome, // Obligation (ex: GOI Bond 2030)
    Crypto,     // Cryptomonnaie (ex: Bitcoin, Ethereum)
    RealEstate, // Immobilier (ex: Mumbai Apt)
    Commodity,  // Matière première (ex: Gold, Silver)
}

/// Profil de génération d'un type d'actif
///
/// Regroupe les constantes utilisées par le générateur :
/// préfixe de ticker, prix de base et pool de noms.
#[derive(Debug, Clone, Copy)]
pub struct TypeProfile {
    /// Préfixe du ticker (ex: "NSE" pour les actions)
    pub prefix: &'static str,

    /// Prix de base avant application du multiplicateur pseudo-aléatoire
    pub base_price: f64,

    /// Pool de noms affichés, cyclé par index
    pub names: &'static [&'static str],
}

impl AssetType {
    /// Les 5 types, dans l'ordre de cycle du générateur
    pub const ALL: [AssetType; 5] = [
        AssetType::Equity,
        AssetType::FixedIncome,
        AssetType::Crypto,
        AssetType::RealEstate,
        AssetType::Commodity,
    ];

    /// Retourne le label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            AssetType::Equity => "Equity",
            AssetType::FixedIncome => "Fixed income",
            AssetType::Crypto => "Crypto",
            AssetType::RealEstate => "Real estate",
            AssetType::Commodity => "Commodity",
        }
    }

    /// Retourne le profil de génération du type
    ///
    /// CONCEPT RUST : &'static
    /// - Les profils sont des littéraux dans le binaire
    /// - Pas d'allocation, très efficace
    pub fn profile(&self) -> TypeProfile {
        match self {
            AssetType::Equity => TypeProfile {
                prefix: "NSE",
                base_price: 2_500.0,
                names: &["Reliance Ind", "TCS", "HDFC Bank", "Infosys", "Tata Motors", "ITC Ltd"],
            },
            AssetType::FixedIncome => TypeProfile {
                prefix: "GOI",
                base_price: 10_000.0,
                names: &["GOI Bond 2030", "NHAI Tax Free", "REC Bond", "SGB Series"],
            },
            AssetType::Crypto => TypeProfile {
                prefix: "COIN",
                base_price: 3_500_000.0,
                names: &["Bitcoin", "Ethereum", "Solana", "Matic (Polygon)", "Tether"],
            },
            AssetType::RealEstate => TypeProfile {
                prefix: "PROP",
                base_price: 7_500_000.0,
                names: &["Mumbai Apt", "Bangalore Villa", "Gurgaon Office", "Goa Plot", "Hyd Tech Park"],
            },
            AssetType::Commodity => TypeProfile {
                prefix: "MCX",
                base_price: 60_000.0,
                names: &["Gold", "Silver", "Copper", "Platinum", "Zinc"],
            },
        }
    }
}

/// Un actif du ledger
///
/// Immutable une fois généré : le générateur est déterministe,
/// le même (index, cursor) produit toujours le même Asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Identifiant unique (ex: "asset-42")
    pub id: String,

    /// Nom affiché (ex: "Asset 42: Bitcoin")
    pub name: String,

    /// Ticker (ex: "COIN-42")
    pub ticker: String,

    /// Type d'actif
    /// CONCEPT RUST : #[serde(rename = "type")]
    /// - "type" est un mot-clé Rust, on renomme côté JSON seulement
    #[serde(rename = "type")]
    pub asset_type: AssetType,

    /// Prix unitaire
    pub price: f64,

    /// Quantité détenue
    pub quantity: f64,

    /// Valeur totale (price × quantity), dérivée à la génération
    pub value: f64,

    /// Variation sur 24h en pourcentage signé
    #[serde(rename = "change24h")]
    pub change_24h: f64,
}

impl Asset {
    /// Retourne true si l'actif est en hausse sur 24h
    pub fn is_positive(&self) -> bool {
        self.change_24h >= 0.0
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_labels() {
        assert_eq!(AssetType::Equity.label(), "Equity");
        assert_eq!(AssetType::FixedIncome.label(), "Fixed income");
        assert_eq!(AssetType::ALL.len(), 5);
    }

    #[test]
    fn test_asset_type_json_tags() {
        // Le contrat JSON utilise des tags snake_case
        let json = serde_json::to_string(&AssetType::FixedIncome).unwrap();
        assert_eq!(json, "\"fixed_income\"");

        let parsed: AssetType = serde_json::from_str("\"real_estate\"").unwrap();
        assert_eq!(parsed, AssetType::RealEstate);
    }

    #[test]
    fn test_asset_wire_shape() {
        // Vérifie la forme du contrat JSON : id, name, ticker, type,
        // price, quantity, value, change24h
        let asset = Asset {
            id: "asset-1".to_string(),
            name: "Asset 1: Gold".to_string(),
            ticker: "MCX-1".to_string(),
            asset_type: AssetType::Commodity,
            price: 60_000.0,
            quantity: 2.0,
            value: 120_000.0,
            change_24h: -3.5,
        };

        let json: serde_json::Value = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["id"], "asset-1");
        assert_eq!(json["type"], "commodity");
        assert_eq!(json["change24h"], -3.5);
        assert_eq!(json["value"], 120_000.0);
    }

    #[test]
    fn test_is_positive() {
        let mut asset = Asset {
            id: "asset-1".to_string(),
            name: "Asset 1: Bitcoin".to_string(),
            ticker: "COIN-1".to_string(),
            asset_type: AssetType::Crypto,
            price: 1.0,
            quantity: 1.0,
            value: 1.0,
            change_24h: 4.2,
        };
        assert!(asset.is_positive());

        asset.change_24h = -0.1;
        assert!(!asset.is_positive());
    }
}
