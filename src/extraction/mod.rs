//! Auction-notice data extraction.
//!
//! Defines the `NoticeExtractor` trait and the partial facts record an
//! extraction produces. The production implementation calls Gemini; the
//! core never depends on it — callers merge the extracted fields over a
//! defaulted facts record before evaluating.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AuctionFacts, AuctionType, DebtResponsibility, OccupancyStatus};

/// Raw material for an extraction: a base64 document (PDF notice)
/// and/or free text (pasted notice body or listing link).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeSource {
    pub document_base64: Option<String>,
    pub text: Option<String>,
}

impl NoticeSource {
    pub fn is_empty(&self) -> bool {
        self.document_base64.is_none() && self.text.is_none()
    }
}

/// Fields recovered from an auction notice. Every field is optional —
/// the extractor reports only what it actually found, and absent fields
/// keep whatever the caller already had.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFacts {
    pub address: Option<String>,
    pub building_name: Option<String>,
    pub appraisal_value: Option<Decimal>,
    /// Minimum second-auction bid.
    pub min_bid: Option<Decimal>,
    pub auction_date: Option<String>,
    pub auction_type: Option<AuctionType>,
    pub iptu_debt: Option<Decimal>,
    pub iptu_responsible: Option<DebtResponsibility>,
    pub condo_debt: Option<Decimal>,
    pub condo_responsible: Option<DebtResponsibility>,
    pub other_debts: Option<Decimal>,
    pub other_debts_responsible: Option<DebtResponsibility>,
    pub occupancy_status: Option<OccupancyStatus>,
    pub rgi_info: Option<String>,
    /// Legal risk commentary (liens, pending appeals, possession).
    pub attention_notes: Option<String>,
}

impl ExtractedFacts {
    /// Whether the extraction recovered anything at all.
    pub fn is_empty(&self) -> bool {
        self == &ExtractedFacts::default()
    }

    /// Merge the present fields over `facts`, leaving absent ones alone.
    pub fn apply_to(&self, facts: &mut AuctionFacts) {
        if let Some(v) = &self.address {
            facts.address = v.clone();
        }
        if let Some(v) = &self.building_name {
            facts.building_name = v.clone();
        }
        if let Some(v) = self.appraisal_value {
            facts.appraisal_value = v;
        }
        if let Some(v) = self.min_bid {
            facts.bid = v;
        }
        if let Some(v) = &self.auction_date {
            facts.auction_date = v.clone();
        }
        if let Some(v) = self.auction_type {
            facts.auction_type = v;
        }
        if let Some(v) = self.iptu_debt {
            facts.iptu_debt = v;
        }
        if let Some(v) = self.iptu_responsible {
            facts.iptu_responsible = v;
        }
        if let Some(v) = self.condo_debt {
            facts.condo_debt = v;
        }
        if let Some(v) = self.condo_responsible {
            facts.condo_responsible = v;
        }
        if let Some(v) = self.other_debts {
            facts.other_debts = v;
        }
        if let Some(v) = self.other_debts_responsible {
            facts.other_debts_responsible = v;
        }
        if let Some(v) = self.occupancy_status {
            facts.occupancy_status = v;
        }
        if let Some(v) = &self.rgi_info {
            facts.rgi_info = v.clone();
        }
        if let Some(v) = &self.attention_notes {
            facts.attention_notes = v.clone();
        }
    }
}

/// Abstraction over auction-notice extractors.
///
/// Implementors read a notice document or text and return the partial
/// facts record they could recover. Failures at this boundary are the
/// caller's to absorb — the API degrades to "no fields extracted".
#[async_trait]
pub trait NoticeExtractor: Send + Sync {
    /// Extract whatever facts the notice yields.
    async fn extract(&self, source: &NoticeSource) -> Result<ExtractedFacts>;

    /// Provider identifier for logging.
    fn provider_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_extraction_changes_nothing() {
        let mut facts = AuctionFacts::sample();
        let before = facts.clone();
        ExtractedFacts::default().apply_to(&mut facts);
        assert_eq!(facts.bid, before.bid);
        assert_eq!(facts.address, before.address);
        assert_eq!(facts.legal_fees_input, before.legal_fees_input);
    }

    #[test]
    fn test_present_fields_overwrite() {
        let mut facts = AuctionFacts::sample();
        let extracted = ExtractedFacts {
            min_bid: Some(dec!(75000)),
            iptu_debt: Some(dec!(4200)),
            iptu_responsible: Some(DebtResponsibility::Purchaser),
            occupancy_status: Some(OccupancyStatus::Occupied),
            ..Default::default()
        };
        extracted.apply_to(&mut facts);
        assert_eq!(facts.bid, dec!(75000));
        assert_eq!(facts.iptu_debt, dec!(4200));
        assert_eq!(facts.iptu_responsible, DebtResponsibility::Purchaser);
        assert_eq!(facts.occupancy_status, OccupancyStatus::Occupied);
        // Untouched fields survive.
        assert_eq!(facts.market_value, dec!(180000));
    }

    #[test]
    fn test_is_empty() {
        assert!(ExtractedFacts::default().is_empty());
        let some = ExtractedFacts {
            address: Some("Av. Atlântica 1702".to_string()),
            ..Default::default()
        };
        assert!(!some.is_empty());
    }

    #[test]
    fn test_deserializes_from_partial_json() {
        let extracted: ExtractedFacts = serde_json::from_str(
            r#"{"min_bid": 120000, "auction_type": "Extrajudicial", "iptu_responsible": "Seller"}"#,
        )
        .unwrap();
        assert_eq!(extracted.min_bid, Some(dec!(120000)));
        assert_eq!(extracted.auction_type, Some(AuctionType::Extrajudicial));
        assert_eq!(extracted.iptu_responsible, Some(DebtResponsibility::Seller));
        assert_eq!(extracted.condo_debt, None);
    }

    #[test]
    fn test_source_is_empty() {
        assert!(NoticeSource::default().is_empty());
        assert!(!NoticeSource {
            text: Some("Edital de leilão...".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
