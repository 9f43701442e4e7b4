//! Model Catalog - available (provider, model) entries
//!
//! The catalog is built once at startup and shared read-only (`Arc<Catalog>`)
//! between all concurrent routing calls.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a model can do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Task specializations (e.g. `document_summary`)
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Locale tags the model handles well (e.g. `pt-BR`)
    #[serde(default)]
    pub supported_languages: Vec<String>,
    /// Context window size
    pub max_context_tokens: u32,
    /// Native JSON output mode
    #[serde(default)]
    pub json_mode: bool,
    /// Function calling support
    #[serde(default)]
    pub function_calling: bool,
}

/// Observed performance figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Average time to a complete response (ms)
    pub avg_latency_ms: f64,
    /// Generation throughput
    pub tokens_per_second: f64,
    /// Success ratio, 0..=1
    pub reliability: f64,
}

/// Pricing in USD per 1K tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Input (prompt) price per 1K tokens
    pub input_per_1k: f64,
    /// Output (completion) price per 1K tokens
    pub output_per_1k: f64,
}

/// One (provider, model) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider id (`google`, `openai`, `anthropic`)
    pub provider: String,
    /// Provider-specific model id
    pub model: String,
    /// Declared capabilities
    pub capabilities: Capabilities,
    /// Quality rating, 1..=10
    pub quality_rating: f64,
    /// Performance stats
    pub performance: Performance,
    /// Token prices
    pub pricing: Pricing,
}

impl CatalogEntry {
    /// `provider/model`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }

    /// Whether the entry declares a specialization
    #[must_use]
    pub fn has_specialization(&self, tag: &str) -> bool {
        self.capabilities.specializations.iter().any(|s| s == tag)
    }

    /// Whether the entry supports a locale tag
    #[must_use]
    pub fn supports_language(&self, locale: &str) -> bool {
        self.capabilities
            .supported_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(locale))
    }

    /// Mean of input and output price
    #[must_use]
    pub fn average_price(&self) -> f64 {
        (self.pricing.input_per_1k + self.pricing.output_per_1k) / 2.0
    }

    /// Cost in USD for the given token counts
    #[must_use]
    pub fn cost_for(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        f64::from(input_tokens) * self.pricing.input_per_1k / 1000.0
            + f64::from(output_tokens) * self.pricing.output_per_1k / 1000.0
    }

    fn validate(&self) -> Result<()> {
        if self.provider.is_empty() || self.model.is_empty() {
            return Err(Error::Configuration(
                "catalog entry needs provider and model".to_string(),
            ));
        }
        if !(1.0..=10.0).contains(&self.quality_rating) {
            return Err(Error::Configuration(format!(
                "{}: quality_rating {} outside 1..=10",
                self.id(),
                self.quality_rating
            )));
        }
        if !(0.0..=1.0).contains(&self.performance.reliability) {
            return Err(Error::Configuration(format!(
                "{}: reliability {} outside 0..=1",
                self.id(),
                self.performance.reliability
            )));
        }
        if self.performance.tokens_per_second <= 0.0 {
            return Err(Error::Configuration(format!(
                "{}: tokens_per_second must be positive",
                self.id()
            )));
        }
        Ok(())
    }
}

/// Immutable, ordered list of catalog entries
///
/// Declaration order matters: it breaks scoring ties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists, invalid entries and duplicates
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Configuration("catalog is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            entry.validate()?;
            if !seen.insert((entry.provider.as_str(), entry.model.as_str())) {
                return Err(Error::Configuration(format!(
                    "duplicate catalog entry {}",
                    entry.id()
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in declaration order
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up an entry
    #[must_use]
    pub fn find(&self, provider: &str, model: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.provider == provider && e.model == model)
    }

    /// Distinct provider ids in declaration order
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.provider.as_str()) {
                out.push(&entry.provider);
            }
        }
        out
    }

    /// Built-in catalog
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    provider: &str,
    model: &str,
    specializations: &[&str],
    max_context_tokens: u32,
    quality_rating: f64,
    (avg_latency_ms, tokens_per_second, reliability): (f64, f64, f64),
    (input_per_1k, output_per_1k): (f64, f64),
) -> CatalogEntry {
    CatalogEntry {
        provider: provider.to_string(),
        model: model.to_string(),
        capabilities: Capabilities {
            specializations: specializations.iter().map(|s| s.to_string()).collect(),
            supported_languages: ["pt-BR", "en-US", "es-ES"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_context_tokens,
            json_mode: true,
            function_calling: true,
        },
        quality_rating,
        performance: Performance {
            avg_latency_ms,
            tokens_per_second,
            reliability,
        },
        pricing: Pricing {
            input_per_1k,
            output_per_1k,
        },
    }
}

fn builtin_entries() -> Vec<CatalogEntry> {
    const SUMMARY: &[&str] = &["document_summary", "data_extraction"];
    const DRAFTING: &[&str] = &["legal_analysis", "document_generation", "contract_review"];

    vec![
        // Google
        entry(
            "google",
            "gemini-1.5-flash",
            SUMMARY,
            1_000_000,
            8.0,
            (800.0, 120.0, 0.95),
            (0.000075, 0.0003),
        ),
        entry(
            "google",
            "gemini-1.5-pro",
            DRAFTING,
            2_000_000,
            9.0,
            (2500.0, 60.0, 0.95),
            (0.00125, 0.005),
        ),
        // OpenAI
        entry(
            "openai",
            "gpt-3.5-turbo",
            SUMMARY,
            16_385,
            7.0,
            (1500.0, 90.0, 0.97),
            (0.0015, 0.002),
        ),
        entry(
            "openai",
            "gpt-4o",
            DRAFTING,
            128_000,
            9.0,
            (2000.0, 80.0, 0.98),
            (0.0025, 0.01),
        ),
        // Anthropic
        entry(
            "anthropic",
            "claude-3-haiku",
            SUMMARY,
            200_000,
            7.0,
            (1000.0, 110.0, 0.97),
            (0.00025, 0.00125),
        ),
        entry(
            "anthropic",
            "claude-3-5-sonnet",
            DRAFTING,
            200_000,
            9.0,
            (2200.0, 75.0, 0.98),
            (0.003, 0.015),
        ),
    ]
}
