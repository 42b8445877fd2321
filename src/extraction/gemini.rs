//! Gemini notice-extraction integration.
//!
//! Implements the `NoticeExtractor` trait using the Gemini
//! generateContent API with a constrained JSON response schema.
//! Handles prompt construction, response parsing, cost tracking, and
//! rate limiting with exponential backoff.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{ExtractedFacts, NoticeExtractor, NoticeSource};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Maximum retries on rate limit / server errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 1000;

/// Approximate cost per 1K input tokens (flash tier).
const INPUT_COST_PER_1K: f64 = 0.00015;
/// Approximate cost per 1K output tokens (flash tier).
const OUTPUT_COST_PER_1K: f64 = 0.0006;

const EXTRACTION_PROMPT: &str = "\
You are an investment analyst specialised in Brazilian real-estate \
auctions. Read the provided auction notice (edital de leilão) or listing \
text and extract the exact figures an investor needs: full address and \
building name, appraisal value, minimum second-auction bid, auction date, \
auction type (Judicial or Extrajudicial), outstanding IPTU / condominium / \
other debts and which party is responsible for each (Purchaser, Seller or \
Shared), occupancy status, and the land-registry (RGI) record.

In attention_notes, write a professional legal risk summary: whether the \
notice frees the buyer from prior debts, any liens or encumbrances \
(mortgage, fiduciary assignment, unavailability orders), pending appeals \
or related lawsuits that could void the sale, possession details, and any \
unusual clause that affects viability.

Return strictly the JSON object described by the response schema, \
omitting any field the notice does not state.";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn responsibility_schema() -> serde_json::Value {
    json!({
        "type": "STRING",
        "description": "Purchaser, Seller, Shared or Unknown"
    })
}

/// JSON schema constraining the model's output to the extraction record.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "address": { "type": "STRING" },
            "building_name": { "type": "STRING" },
            "appraisal_value": { "type": "NUMBER" },
            "min_bid": { "type": "NUMBER" },
            "auction_date": { "type": "STRING" },
            "auction_type": {
                "type": "STRING",
                "description": "Judicial, Extrajudicial or Unknown"
            },
            "iptu_debt": { "type": "NUMBER" },
            "iptu_responsible": responsibility_schema(),
            "condo_debt": { "type": "NUMBER" },
            "condo_responsible": responsibility_schema(),
            "other_debts": { "type": "NUMBER" },
            "other_debts_responsible": responsibility_schema(),
            "occupancy_status": {
                "type": "STRING",
                "description": "Occupied, Vacant or Unknown"
            },
            "rgi_info": { "type": "STRING" },
            "attention_notes": {
                "type": "STRING",
                "description": "Legal risk analysis and warnings"
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    model: String,
    total_cost: std::sync::atomic::AtomicU64, // stored as cost * 1_000_000
    total_calls: std::sync::atomic::AtomicU64,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            total_cost: std::sync::atomic::AtomicU64::new(0),
            total_calls: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Total API spend so far in USD (approximate).
    pub fn total_cost(&self) -> f64 {
        self.total_cost.load(std::sync::atomic::Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Number of extraction calls made.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(std::sync::atomic::Ordering::Relaxed)
    }

    fn record_usage(&self, usage: Option<&UsageMetadata>) {
        self.total_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        if let Some(usage) = usage {
            let cost = usage.prompt_token_count as f64 / 1000.0 * INPUT_COST_PER_1K
                + usage.candidates_token_count as f64 / 1000.0 * OUTPUT_COST_PER_1K;
            self.total_cost.fetch_add(
                (cost * 1_000_000.0) as u64,
                std::sync::atomic::Ordering::Relaxed,
            );
        }
    }

    /// Send a generateContent request with retry + backoff.
    async fn call_api(&self, request: &GenerateContentRequest) -> Result<String> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying Gemini API call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(&url)
                .query(&[("key", self.api_key.expose_secret())])
                .json(request)
                .send()
                .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, error = %e, "Gemini request failed");
                    last_error = Some(anyhow!(e).context("Gemini request failed"));
                    continue;
                }
            };

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                warn!(attempt, status = %status, "Gemini API throttled or erroring");
                last_error = Some(anyhow!("Gemini API returned {status}"));
                continue;
            }

            let body = resp.text().await.context("Failed to read Gemini response")?;
            if !status.is_success() {
                return Err(anyhow!("Gemini API error ({status}): {body}"));
            }

            let parsed: GenerateContentResponse =
                serde_json::from_str(&body).context("Failed to parse Gemini response")?;

            self.record_usage(parsed.usage_metadata.as_ref());

            let text = parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .and_then(|c| c.parts.into_iter().next())
                .and_then(|p| p.text)
                .ok_or_else(|| anyhow!("Gemini response contained no text"))?;

            return Ok(text);
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Gemini API call failed")))
    }
}

#[async_trait]
impl NoticeExtractor for GeminiClient {
    async fn extract(&self, source: &NoticeSource) -> Result<ExtractedFacts> {
        if source.is_empty() {
            return Ok(ExtractedFacts::default());
        }

        let mut parts = Vec::new();
        if let Some(doc) = &source.document_base64 {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "application/pdf".to_string(),
                    data: doc.clone(),
                }),
            });
        }
        if let Some(text) = &source.text {
            parts.push(Part::text(format!("Auction notice text/link: {text}")));
        }
        parts.push(Part::text(EXTRACTION_PROMPT));

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let text = self.call_api(&request).await?;

        // Models occasionally fence the JSON despite the mime-type hint.
        let trimmed = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let extracted: ExtractedFacts = serde_json::from_str(trimmed)
            .with_context(|| format!("Gemini returned unparseable extraction: {trimmed}"))?;

        info!(
            provider = self.provider_name(),
            found_bid = extracted.min_bid.is_some(),
            found_address = extracted.address.is_some(),
            "Notice extraction complete"
        );

        Ok(extracted)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
