//! Heuristic text extraction
//!
//! Model answers are free text; these functions pull structure out of them
//! with fixed patterns. Every function has a safe default and never fails.

use regex::Regex;
use std::sync::OnceLock;

/// Fallback when no numbered points are found
pub const DEFAULT_PRIORITY_POINT: &str =
    "Analyze the facts presented and identify the applicable legal grounds";

/// Fallback when no strategy label is found
pub const DEFAULT_LEGAL_STRATEGY: &str = "Standard legal approach based on the facts presented";

/// Upper bound on extracted priority points
pub const MAX_PRIORITY_POINTS: usize = 5;

const PETITION_ORDER: &[&str] = &[
    "header",
    "parties",
    "facts",
    "legal_basis",
    "requests",
    "conclusion",
];
const CONTRACT_ORDER: &[&str] = &[
    "header",
    "parties",
    "object",
    "obligations",
    "payment",
    "term",
    "termination",
    "general_provisions",
    "signatures",
];
const LEGAL_OPINION_ORDER: &[&str] = &["header", "query", "analysis", "legal_basis", "conclusion"];
const APPEAL_ORDER: &[&str] = &[
    "header",
    "admissibility",
    "facts",
    "legal_basis",
    "requests",
    "conclusion",
];
const FALLBACK_ORDER: &[&str] = &[
    "header",
    "introduction",
    "development",
    "legal_basis",
    "conclusion",
    "signature",
];

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("extraction pattern must compile"))
}

/// Fixed section order for a document type
///
/// Unknown types get the six-section generic order.
#[must_use]
pub fn define_section_order(document_type: &str) -> &'static [&'static str] {
    match document_type.trim().to_ascii_lowercase().as_str() {
        "petition" => PETITION_ORDER,
        "contract" => CONTRACT_ORDER,
        "legal_opinion" => LEGAL_OPINION_ORDER,
        "appeal" => APPEAL_ORDER,
        _ => FALLBACK_ORDER,
    }
}

/// `legal_basis` -> `Legal Basis`
#[must_use]
pub fn section_title(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Numbered list items (`1. ...`, `2) ...`), at most five
#[must_use]
pub fn extract_priority_points(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let points: Vec<String> = pattern(&RE, r"(?m)^[ \t]*\d+[.)][ \t]+(.+?)[ \t]*$")
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim_matches('*').trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_PRIORITY_POINTS)
        .collect();

    if points.is_empty() {
        vec![DEFAULT_PRIORITY_POINT.to_string()]
    } else {
        points
    }
}

/// Text after a `Strategy:` label
#[must_use]
pub fn extract_legal_strategy(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"(?im)^[ \t*#-]*(?:legal[ \t]+)?strateg(?:y|ia)(?:[ \t]+jur[ií]dica)?\**[ \t]*[:\-][ \t]*(.+?)[ \t]*$",
    )
    .captures(text)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str().trim_matches('*').trim().to_string())
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| DEFAULT_LEGAL_STRATEGY.to_string())
}

/// `section_id: guidance` lines, ids lowercased
#[must_use]
pub fn extract_section_guidance(text: &str) -> Vec<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(?m)^[ \t*-]*([A-Za-z][A-Za-z_]*)\**[ \t]*:[ \t]*(.+?)[ \t]*$")
        .captures_iter(text)
        .filter_map(|c| Some((c.get(1)?, c.get(2)?)))
        .map(|(id, guidance)| (id.as_str().to_ascii_lowercase(), guidance.as_str().to_string()))
        .filter(|(_, guidance)| !guidance.is_empty())
        .collect()
}

/// Article and statute references, in order of first appearance
#[must_use]
pub fn extract_statute_references(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = pattern(
        &RE,
        r"(?i)\b(?:art\.|article|artigo)\s*\d+[º°]?(?:\s*,?\s*§\s*\d+[º°]?)?|\b(?:law|lei)\s+(?:n[º°o]?\.?\s*)?\d[\d.]*(?:/\d{2,4})?",
    );

    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let reference = m.as_str().trim().to_string();
        if !found.contains(&reference) {
            found.push(reference);
        }
    }
    found
}

/// Precedent labels followed by statute references found in `body`
#[must_use]
pub fn extract_citations<'a>(
    precedents: impl IntoIterator<Item = (Option<&'a str>, &'a str)>,
    body: &str,
) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    for (source, content) in precedents {
        let label = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| content.lines().map(str::trim).find(|l| !l.is_empty()));
        if let Some(label) = label {
            let label: String = label.chars().take(120).collect();
            if !citations.contains(&label) {
                citations.push(label);
            }
        }
    }
    for reference in extract_statute_references(body) {
        if !citations.contains(&reference) {
            citations.push(reference);
        }
    }
    citations
}

/// Collapse runs of three or more newlines into one blank line
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\n{3,}")
        .replace_all(text, "\n\n")
        .into_owned()
}
