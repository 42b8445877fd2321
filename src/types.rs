//! Shared types for the ARREMATE analyzer.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that analysis, extraction,
//! storage, and server modules can depend on them without circular
//! references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which party carries a pre-existing debt after the auction.
///
/// The tag partitions debt liability: `Purchaser` puts the full debt on
/// the buyer's cost basis, `Shared` exactly half, `Seller` and `Unknown`
/// none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DebtResponsibility {
    Purchaser,
    Seller,
    Shared,
    #[default]
    Unknown,
}

impl DebtResponsibility {
    /// The share of `debt` the purchaser assumes under this tag.
    pub fn assumed_share(&self, debt: Decimal) -> Decimal {
        match self {
            DebtResponsibility::Purchaser => debt,
            DebtResponsibility::Shared => debt / dec!(2),
            DebtResponsibility::Seller | DebtResponsibility::Unknown => Decimal::ZERO,
        }
    }
}

impl fmt::Display for DebtResponsibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtResponsibility::Purchaser => write!(f, "Purchaser"),
            DebtResponsibility::Seller => write!(f, "Seller"),
            DebtResponsibility::Shared => write!(f, "Shared"),
            DebtResponsibility::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Attempt to parse a string into a DebtResponsibility (case-insensitive,
/// accepts the Portuguese terms auction notices use).
impl std::str::FromStr for DebtResponsibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "purchaser" | "arrematante" | "buyer" => Ok(DebtResponsibility::Purchaser),
            "seller" | "vendedor" | "comitente" => Ok(DebtResponsibility::Seller),
            "shared" | "rateado" | "split" => Ok(DebtResponsibility::Shared),
            "unknown" => Ok(DebtResponsibility::Unknown),
            _ => Err(anyhow::anyhow!("Unknown debt responsibility: {s}")),
        }
    }
}

/// Auction round kind (judicial vs extrajudicial sale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuctionType {
    Judicial,
    Extrajudicial,
    #[default]
    Unknown,
}

impl fmt::Display for AuctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionType::Judicial => write!(f, "Judicial"),
            AuctionType::Extrajudicial => write!(f, "Extrajudicial"),
            AuctionType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Whether the property is occupied at auction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OccupancyStatus {
    Occupied,
    Vacant,
    #[default]
    Unknown,
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyStatus::Occupied => write!(f, "Occupied"),
            OccupancyStatus::Vacant => write!(f, "Vacant"),
            OccupancyStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Auction facts
// ---------------------------------------------------------------------------

/// The facts of one auctioned property, immutable per computation call.
///
/// The descriptive fields (address, registry info, notes) ride along for
/// persistence and extraction; only the financial fields feed the math.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionFacts {
    pub address: String,
    pub building_name: String,
    /// Court/appraiser valuation, for reference only.
    pub appraisal_value: Decimal,
    /// Minimum acceptable second-auction bid — the amount being analyzed.
    pub bid: Decimal,
    pub auction_date: String,
    pub auction_type: AuctionType,
    pub iptu_debt: Decimal,
    pub iptu_responsible: DebtResponsibility,
    pub condo_debt: Decimal,
    pub condo_responsible: DebtResponsibility,
    pub other_debts: Decimal,
    pub other_debts_responsible: DebtResponsibility,
    pub occupancy_status: OccupancyStatus,
    /// Cost to remove occupants before resale.
    pub eviction_cost: Decimal,
    /// Land registry record (RGI / matrícula).
    pub rgi_info: String,
    /// Expected resale price.
    pub market_value: Decimal,
    pub monthly_condo_fee: Decimal,
    pub monthly_tax_fee: Decimal,
    pub estimated_renovation_cost: Decimal,
    /// Months held before resale. Divides ROI for annualization, so it is
    /// treated as >= 1 there; the holding-cost multiplication accepts 0.
    pub estimated_months_to_resale: u32,
    /// Broker commission on resale, 0–100 scale.
    pub selling_commission_rate: Decimal,
    /// Free-form legal/advisory fee: either a percentage ("4%") or a
    /// locale-formatted currency literal ("1.500,00"). See `analysis::fees`.
    pub legal_fees_input: String,
    /// Legal risk notes from the notice analysis.
    pub attention_notes: String,
}

impl Default for AuctionFacts {
    fn default() -> Self {
        Self {
            address: String::new(),
            building_name: String::new(),
            appraisal_value: Decimal::ZERO,
            bid: Decimal::ZERO,
            auction_date: String::new(),
            auction_type: AuctionType::Unknown,
            iptu_debt: Decimal::ZERO,
            iptu_responsible: DebtResponsibility::Unknown,
            condo_debt: Decimal::ZERO,
            condo_responsible: DebtResponsibility::Unknown,
            other_debts: Decimal::ZERO,
            other_debts_responsible: DebtResponsibility::Unknown,
            occupancy_status: OccupancyStatus::Unknown,
            eviction_cost: Decimal::ZERO,
            rgi_info: String::new(),
            market_value: Decimal::ZERO,
            monthly_condo_fee: Decimal::ZERO,
            monthly_tax_fee: Decimal::ZERO,
            estimated_renovation_cost: Decimal::ZERO,
            // Mirrors the blank-form defaults users start from.
            estimated_months_to_resale: 12,
            selling_commission_rate: dec!(5),
            legal_fees_input: "4%".to_string(),
            attention_notes: String::new(),
        }
    }
}

impl fmt::Display for AuctionFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (bid: R${} | market: R${} | {} | {})",
            if self.address.is_empty() { "<no address>" } else { self.address.as_str() },
            self.bid,
            self.market_value,
            self.auction_type,
            self.occupancy_status,
        )
    }
}

impl AuctionFacts {
    /// Helper to build a test facts record matching the worked example:
    /// bid 100k, market 180k, no debts, 4% legal fees, 5% selling
    /// commission, 12 months to resale.
    #[cfg(test)]
    pub fn sample() -> Self {
        AuctionFacts {
            address: "Rua das Laranjeiras 120, apto 501".to_string(),
            building_name: "Ed. Solar das Laranjeiras".to_string(),
            appraisal_value: dec!(200000),
            bid: dec!(100000),
            auction_date: "2026-03-15".to_string(),
            auction_type: AuctionType::Judicial,
            occupancy_status: OccupancyStatus::Vacant,
            rgi_info: "Matrícula 45.678 — 9º RGI".to_string(),
            market_value: dec!(180000),
            estimated_months_to_resale: 12,
            selling_commission_rate: dec!(5),
            legal_fees_input: "4%".to_string(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Rate settings
// ---------------------------------------------------------------------------

/// Acquisition-fee and tax percentages, all on a 0–100 scale.
///
/// The first three apply against the bid; the capital-gains rate applies
/// against positive gross profit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    pub auctioneer_commission_rate: Decimal,
    pub itbi_rate: Decimal,
    pub registry_rate: Decimal,
    pub capital_gains_tax_rate: Decimal,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            auctioneer_commission_rate: dec!(5), // 5% standard
            itbi_rate: dec!(3),                  // ~3% average in Brazil
            registry_rate: dec!(1),              // ~1% for RGI/deeds
            capital_gains_tax_rate: dec!(15),    // 15% on profit
        }
    }
}

// ---------------------------------------------------------------------------
// Investment result
// ---------------------------------------------------------------------------

/// Per-item cost decomposition of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub commission: Decimal,
    pub itbi: Decimal,
    pub registry: Decimal,
    pub legal_fees: Decimal,
    pub holding_costs: Decimal,
    pub selling_commission: Decimal,
    /// Pre-existing debts (IPTU + condo + other) assumed by the purchaser.
    pub debts_assumed: Decimal,
    pub eviction_cost: Decimal,
}

/// Output of the investment evaluator. A pure value computed fresh from
/// the inputs; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub total_acquisition_cost: Decimal,
    pub total_investment: Decimal,
    /// Post-tax profit.
    pub projected_profit: Decimal,
    pub roi_percent: Decimal,
    /// Linear annualization: roi / months * 12.
    pub annualized_roi: Decimal,
    /// Resale price at which pre-tax gross profit is exactly zero.
    pub break_even_price: Decimal,
    pub breakdown: CostBreakdown,
}

impl fmt::Display for InvestmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invest R${} → profit R${} (ROI {:.2}% | {:.2}% p.a.)",
            self.total_investment,
            self.projected_profit,
            self.roi_percent,
            self.annualized_roi,
        )
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// A saved analysis: the facts, the settings in force, and the result
/// they produced, keyed by an opaque id and the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub owner_id: String,
    pub saved_at: DateTime<Utc>,
    pub facts: AuctionFacts,
    pub settings: RateSettings,
    pub result: InvestmentResult,
}

/// An application user. The stored credential is an argon2 hash — the
/// plaintext never persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// What the API exposes about a user — everything except the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for ARREMATE.
///
/// The computation core never produces these — it is total over its
/// inputs. They classify failures at the collaborator boundaries so the
/// API can map them to meaningful statuses.
#[derive(Debug, thiserror::Error)]
pub enum ArremateError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Missing or invalid session token")]
    Unauthorized,

    #[error("Admin privileges required")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Extraction error ({provider}): {message}")]
    Extraction { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // -- DebtResponsibility tests --

    #[test]
    fn test_purchaser_assumes_full_debt() {
        let debt = dec!(10000);
        assert_eq!(DebtResponsibility::Purchaser.assumed_share(debt), dec!(10000));
    }

    #[test]
    fn test_shared_assumes_exactly_half() {
        let debt = dec!(10001);
        assert_eq!(DebtResponsibility::Shared.assumed_share(debt), dec!(5000.5));
    }

    #[test]
    fn test_seller_and_unknown_assume_nothing() {
        let debt = dec!(7500);
        assert_eq!(DebtResponsibility::Seller.assumed_share(debt), Decimal::ZERO);
        assert_eq!(DebtResponsibility::Unknown.assumed_share(debt), Decimal::ZERO);
    }

    #[test]
    fn test_responsibility_from_str() {
        assert_eq!(
            DebtResponsibility::from_str("purchaser").unwrap(),
            DebtResponsibility::Purchaser
        );
        assert_eq!(
            DebtResponsibility::from_str("Arrematante").unwrap(),
            DebtResponsibility::Purchaser
        );
        assert_eq!(
            DebtResponsibility::from_str("COMITENTE").unwrap(),
            DebtResponsibility::Seller
        );
        assert_eq!(
            DebtResponsibility::from_str("rateado").unwrap(),
            DebtResponsibility::Shared
        );
        assert!(DebtResponsibility::from_str("nonsense").is_err());
    }

    #[test]
    fn test_responsibility_serialization_roundtrip() {
        let json = serde_json::to_string(&DebtResponsibility::Shared).unwrap();
        assert_eq!(json, "\"Shared\"");
        let back: DebtResponsibility = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DebtResponsibility::Shared);
    }

    // -- AuctionFacts tests --

    #[test]
    fn test_facts_default_mirrors_blank_form() {
        let facts = AuctionFacts::default();
        assert_eq!(facts.bid, Decimal::ZERO);
        assert_eq!(facts.estimated_months_to_resale, 12);
        assert_eq!(facts.selling_commission_rate, dec!(5));
        assert_eq!(facts.legal_fees_input, "4%");
        assert_eq!(facts.iptu_responsible, DebtResponsibility::Unknown);
    }

    #[test]
    fn test_facts_deserialize_with_missing_fields() {
        // Partial payloads (user mid-typing) must still deserialize.
        let facts: AuctionFacts =
            serde_json::from_str(r#"{"bid": 50000, "market_value": 90000}"#).unwrap();
        assert_eq!(facts.bid, dec!(50000));
        assert_eq!(facts.market_value, dec!(90000));
        assert_eq!(facts.estimated_months_to_resale, 12);
    }

    #[test]
    fn test_facts_serialization_roundtrip() {
        let facts = AuctionFacts::sample();
        let json = serde_json::to_string(&facts).unwrap();
        let back: AuctionFacts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bid, facts.bid);
        assert_eq!(back.auction_type, AuctionType::Judicial);
        assert_eq!(back.rgi_info, facts.rgi_info);
    }

    // -- RateSettings tests --

    #[test]
    fn test_rate_settings_defaults() {
        let settings = RateSettings::default();
        assert_eq!(settings.auctioneer_commission_rate, dec!(5));
        assert_eq!(settings.itbi_rate, dec!(3));
        assert_eq!(settings.registry_rate, dec!(1));
        assert_eq!(settings.capital_gains_tax_rate, dec!(15));
    }

    // -- User tests --

    #[test]
    fn test_profile_hides_credential() {
        let user = User {
            id: "u-1".into(),
            email: "ana@example.com".into(),
            username: "ana".into(),
            password_hash: "$argon2id$...".into(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        };
        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ana@example.com"));
    }

    // -- ArremateError tests --

    #[test]
    fn test_error_display() {
        let e = ArremateError::EmailTaken("ana@example.com".into());
        assert!(e.to_string().contains("ana@example.com"));

        let e = ArremateError::Extraction {
            provider: "gemini".into(),
            message: "timeout".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("timeout"));
    }
}
