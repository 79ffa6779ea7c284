//! Per-category algorithm tables.

use crate::models::{AlgorithmScore, AnalysisRecord, DEFAULT_ARCHITECTURE, TABLE_CATEGORIES};
use serde::Serialize;

pub const EMPTY_CATEGORY_MESSAGE: &str = "No algorithms detected in this category";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// >=80 high, >=60 medium, otherwise low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceTier::High
        } else if confidence >= 60.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmRow {
    pub name: String,
    pub architecture: String,
    pub confidence: f64,
    pub tier: ConfidenceTier,
    /// Row matches the record's overall detected algorithm.
    pub starred: bool,
}

impl AlgorithmRow {
    /// CSS-safe class derived from the algorithm name.
    pub fn css_class(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableRow {
    Placeholder { message: String },
    Algorithm(AlgorithmRow),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTable {
    pub category: String,
    pub rows: Vec<TableRow>,
}

impl CategoryTable {
    pub fn build(category: &str, scores: &[AlgorithmScore], detected: &str, architecture: &str) -> Self {
        if scores.is_empty() {
            return Self {
                category: category.to_string(),
                rows: vec![TableRow::Placeholder {
                    message: EMPTY_CATEGORY_MESSAGE.to_string(),
                }],
            };
        }

        let architecture = if architecture.is_empty() {
            DEFAULT_ARCHITECTURE
        } else {
            architecture
        };

        let mut sorted: Vec<&AlgorithmScore> = scores.iter().collect();
        // sort_by is stable: equal confidences keep source order
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let rows = sorted
            .into_iter()
            .map(|score| {
                TableRow::Algorithm(AlgorithmRow {
                    name: score.name.clone(),
                    architecture: architecture.to_string(),
                    confidence: score.confidence,
                    tier: ConfidenceTier::from_confidence(score.confidence),
                    starred: score.name == detected,
                })
            })
            .collect();

        Self {
            category: category.to_string(),
            rows,
        }
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &AlgorithmRow> {
        self.rows.iter().filter_map(|row| match row {
            TableRow::Algorithm(algorithm) => Some(algorithm),
            TableRow::Placeholder { .. } => None,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.rows.as_slice(), [TableRow::Placeholder { .. }])
    }

    pub fn starred_count(&self) -> usize {
        self.algorithms().filter(|row| row.starred).count()
    }
}

/// Tables for Symmetric Cipher, Hash Function and MAC Algorithm, in that order.
pub fn category_tables(record: &AnalysisRecord) -> Vec<CategoryTable> {
    TABLE_CATEGORIES
        .iter()
        .map(|category| {
            CategoryTable::build(
                category,
                record.scores(category),
                &record.detected,
                &record.architecture,
            )
        })
        .collect()
}
