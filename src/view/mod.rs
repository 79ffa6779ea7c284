//! View models for the dashboard.
//!
//! Turns one resolved [`AnalysisRecord`] into render-ready fragments:
//! - `tables`: per-category ranked algorithm tables
//! - `protocols`: protocol summary, statistics and detail cards
//! - `charts`: slice/bar chart data for the protocol tab
//! - `cfg`: control-flow-graph illustration
//!
//! Building a view never fails; missing fields already carry defaults.

pub mod cfg;
pub mod charts;
pub mod protocols;
pub mod tables;

pub use cfg::ControlFlowGraph;
pub use protocols::{ProtocolBreakdown, ProtocolStats, ProtocolSummary};
pub use tables::{CategoryTable, ConfidenceTier, TableRow};

use crate::models::{AnalysisRecord, FunctionEntry, UNKNOWN};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderMetrics {
    pub filename: String,
    /// "2.4 MB | ARM64 Architecture"; absent for empty files.
    pub file_line: Option<String>,
    pub crypto_functions: u32,
    pub non_crypto_functions: u32,
    pub avg_confidence: f64,
    pub protocol: String,
}

impl HeaderMetrics {
    pub fn from_record(record: &AnalysisRecord) -> Self {
        let file_line = (record.filesize > 0 && !record.architecture.is_empty()).then(|| {
            format!(
                "{:.1} MB | {} Architecture",
                record.filesize as f64 / (1024.0 * 1024.0),
                record.architecture
            )
        });

        Self {
            filename: record.filename.clone(),
            file_line,
            crypto_functions: record.metrics.crypto_functions,
            non_crypto_functions: record.metrics.non_crypto_functions,
            avg_confidence: record.metrics.avg_confidence,
            protocol: record
                .metrics
                .protocol
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    pub fn avg_confidence_display(&self) -> String {
        format!("{:.1}%", self.avg_confidence)
    }
}

/// Complete dashboard for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub header: HeaderMetrics,
    pub architecture: String,
    pub detected: String,
    pub category: String,
    pub confidence: f64,
    pub tables: Vec<CategoryTable>,
    pub protocol_summary: Vec<ProtocolSummary>,
    pub breakdown: Option<ProtocolBreakdown>,
    pub functions: Vec<FunctionEntry>,
    pub cfg: Option<ControlFlowGraph>,
}

impl DashboardView {
    pub fn build<R: Rng + ?Sized>(record: &AnalysisRecord, rng: &mut R) -> Self {
        let cfg = (!record.detected.is_empty())
            .then(|| ControlFlowGraph::for_algorithm(&record.detected));

        Self {
            header: HeaderMetrics::from_record(record),
            architecture: record.architecture.clone(),
            detected: record.detected.clone(),
            category: record.category.clone(),
            confidence: record.confidence,
            tables: tables::category_tables(record),
            protocol_summary: protocols::protocol_summaries(&record.protocols),
            breakdown: ProtocolBreakdown::build(&record.protocols, rng),
            functions: record.functions.clone(),
            cfg,
        }
    }

    pub fn starred_rows(&self) -> usize {
        self.tables.iter().map(CategoryTable::starred_count).sum()
    }
}
