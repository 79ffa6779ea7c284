//! Chart view models for the protocol tab.

use super::protocols::ProtocolStats;
use crate::models::ProtocolDescriptor;
use rand::Rng;
use serde::Serialize;

pub const CRYPTO_COLOR: &str = "#00d9ff";
pub const NON_CRYPTO_COLOR: &str = "#ff9500";
pub const HIGH_COLOR: &str = "#00ff88";
pub const MEDIUM_COLOR: &str = "#ffaa00";
pub const LOW_COLOR: &str = "#ff5555";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: &'static str,
    pub value: f64,
    /// Share of the total, rounded to a whole percent.
    pub percent: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceChart {
    pub slices: Vec<ChartSlice>,
}

impl SliceChart {
    pub fn new(items: &[(&'static str, f64, &'static str)]) -> Self {
        let total: f64 = items.iter().map(|(_, value, _)| value).sum();
        let slices = items
            .iter()
            .map(|&(label, value, color)| ChartSlice {
                label,
                value,
                percent: if total > 0.0 {
                    (value / total * 100.0).round() as u32
                } else {
                    0
                },
                color,
            })
            .collect();
        Self { slices }
    }

    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Slices that get drawn; a donut skips empty segments.
    pub fn visible_slices(&self) -> impl Iterator<Item = &ChartSlice> {
        self.slices.iter().filter(|s| s.value > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarKind {
    Crypto,
    NonCrypto,
}

impl BarKind {
    /// Plain-text protocols are the only non-crypto ones we recognize.
    pub fn for_protocol(name: &str) -> Self {
        if name.contains("HTTP") || name.contains("FTP") {
            BarKind::NonCrypto
        } else {
            BarKind::Crypto
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BarKind::Crypto => CRYPTO_COLOR,
            BarKind::NonCrypto => NON_CRYPTO_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Height relative to the tallest bar (0-1).
    pub height: f64,
    pub kind: BarKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// One bar per distinct label; a repeated label overwrites the value but
    /// keeps its first position.
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut values: Vec<(String, f64)> = Vec::new();
        for (label, value) in entries {
            match values.iter_mut().find(|(existing, _)| *existing == label) {
                Some(slot) => slot.1 = value,
                None => values.push((label, value)),
            }
        }

        let max = values.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let bars = values
            .into_iter()
            .map(|(label, value)| Bar {
                kind: BarKind::for_protocol(&label),
                height: if max > 0.0 { value / max } else { 0.0 },
                label,
                value,
            })
            .collect();
        Self { bars }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBar {
    pub label: &'static str,
    pub confidence: f64,
    pub kind: BarKind,
}

const STEP_CONFIDENCE: [(&str, f64, BarKind); 8] = [
    ("TLS Handshake", 96.2, BarKind::Crypto),
    ("Certificate Verify", 94.5, BarKind::Crypto),
    ("Session Key Derivation", 92.8, BarKind::Crypto),
    ("Data Encryption", 98.1, BarKind::Crypto),
    ("HMAC Authentication", 91.3, BarKind::Crypto),
    ("HTTP Request", 78.4, BarKind::NonCrypto),
    ("JSON Parsing", 82.6, BarKind::NonCrypto),
    ("MD5 Hash (Legacy)", 88.9, BarKind::Crypto),
];

/// Fixed confidence figures for typical protocol steps.
pub fn confidence_bars() -> Vec<ConfidenceBar> {
    STEP_CONFIDENCE
        .iter()
        .map(|&(label, confidence, kind)| ConfidenceBar {
            label,
            confidence,
            kind,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolCharts {
    /// Crypto vs non-crypto phase distribution.
    pub distribution: SliceChart,
    /// Security level donut.
    pub security: SliceChart,
    pub protocol_types: BarChart,
}

pub fn protocol_charts<R: Rng + ?Sized>(
    protocols: &[ProtocolDescriptor],
    stats: &ProtocolStats,
    rng: &mut R,
) -> ProtocolCharts {
    let distribution = SliceChart::new(&[
        ("Crypto", stats.crypto_steps as f64, CRYPTO_COLOR),
        ("Non-Crypto", stats.non_crypto_steps as f64, NON_CRYPTO_COLOR),
    ]);

    // Medium and low shares are fixed fractions of the protocol count.
    let total = protocols.len() as f64;
    let security = SliceChart::new(&[
        ("High", stats.high_security as f64, HIGH_COLOR),
        ("Medium", (total * 0.13).floor(), MEDIUM_COLOR),
        ("Low", (total * 0.25).floor(), LOW_COLOR),
        ("Deprecated", stats.deprecated as f64, LOW_COLOR),
    ]);

    let protocol_types = BarChart::new(
        protocols
            .iter()
            .map(|proto| (proto.name.clone(), rng.gen_range(0.75..1.0)))
            .collect::<Vec<_>>(),
    );

    ProtocolCharts {
        distribution,
        security,
        protocol_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_slice_percentages() {
        let chart = SliceChart::new(&[("Crypto", 3.0, CRYPTO_COLOR), ("Non-Crypto", 5.0, NON_CRYPTO_COLOR)]);
        let percents: Vec<_> = chart.slices.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![38, 63]);
        assert_eq!(chart.total(), 8.0);
    }

    #[test]
    fn test_empty_chart_has_zero_percentages() {
        let chart = SliceChart::new(&[("High", 0.0, HIGH_COLOR), ("Low", 0.0, LOW_COLOR)]);
        assert!(chart.slices.iter().all(|s| s.percent == 0));
        assert_eq!(chart.visible_slices().count(), 0);
    }

    #[test]
    fn test_security_donut_floors_fixed_fractions() {
        let protocols: Vec<_> = (0..8)
            .map(|i| ProtocolDescriptor::new(format!("P{}", i), [true; 4]))
            .collect();
        let stats = ProtocolStats::from_protocols(&protocols);
        let charts = protocol_charts(&protocols, &stats, &mut StdRng::seed_from_u64(7));

        let values: Vec<_> = charts.security.slices.iter().map(|s| s.value).collect();
        // 8 * 0.13 = 1.04 -> 1, 8 * 0.25 = 2
        assert_eq!(values, vec![8.0, 1.0, 2.0, 0.0]);
        assert_eq!(charts.security.visible_slices().count(), 3);
    }

    #[test]
    fn test_bar_chart_dedupes_and_classifies() {
        let chart = BarChart::new(vec![
            ("TLS 1.2".to_string(), 0.8),
            ("HTTP".to_string(), 0.9),
            ("TLS 1.2".to_string(), 0.6),
        ]);
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].label, "TLS 1.2");
        assert_eq!(chart.bars[0].value, 0.6);
        assert_eq!(chart.bars[0].kind, BarKind::Crypto);
        assert_eq!(chart.bars[1].kind, BarKind::NonCrypto);
        assert_eq!(chart.bars[1].height, 1.0);
    }

    #[test]
    fn test_bar_values_in_range() {
        let protocols = vec![
            ProtocolDescriptor::new("TLS", [true; 4]),
            ProtocolDescriptor::new("FTP", [false; 4]),
        ];
        let stats = ProtocolStats::from_protocols(&protocols);
        let charts = protocol_charts(&protocols, &stats, &mut StdRng::seed_from_u64(42));
        assert!(charts
            .protocol_types
            .bars
            .iter()
            .all(|bar| (0.75..1.0).contains(&bar.value)));
    }

    #[test]
    fn test_confidence_bars_fixed() {
        let bars = confidence_bars();
        assert_eq!(bars.len(), 8);
        assert_eq!(bars[0].label, "TLS Handshake");
        assert_eq!(bars[5].kind, BarKind::NonCrypto);
    }
}
