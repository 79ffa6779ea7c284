//! Protocol summary, statistics and per-protocol detail cards.

use super::charts::{confidence_bars, protocol_charts, ConfidenceBar, ProtocolCharts};
use crate::models::{ProtocolDescriptor, SecurityLevel};
use rand::Rng;
use serde::Serialize;

/// Generic description shown on every protocol card.
const CARD_DESCRIPTION: &str =
    "Certificate verification using signature validation and HMAC integrity check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialization,
    Handshake,
    KeyExchange,
    EncryptedPhase,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Initialization,
        Phase::Handshake,
        Phase::KeyExchange,
        Phase::EncryptedPhase,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Phase::Initialization => "Initialization",
            Phase::Handshake => "Handshake",
            Phase::KeyExchange => "Key Exchange",
            Phase::EncryptedPhase => "Encrypted Phase",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Phase::Initialization => "🔧",
            Phase::Handshake => "🤝",
            Phase::KeyExchange => "🔑",
            Phase::EncryptedPhase => "🔒",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Phase::Initialization => "Protocol initialization and setup phase",
            Phase::Handshake => "Secure handshake and negotiation phase",
            Phase::KeyExchange => "Cryptographic key exchange phase",
            Phase::EncryptedPhase => "Encrypted communication phase",
        }
    }

    /// Function names typically seen for an active phase.
    pub fn function_tags(&self) -> &'static [&'static str] {
        match self {
            Phase::Initialization => &[],
            Phase::Handshake => &["client_hello", "server_hello"],
            Phase::KeyExchange => &["key_share", "derive_session_key"],
            Phase::EncryptedPhase => &["aes_gcm_encrypt", "aes_gcm_decrypt"],
        }
    }

    pub fn is_active(&self, proto: &ProtocolDescriptor) -> bool {
        match self {
            Phase::Initialization => proto.initialization,
            Phase::Handshake => proto.handshake,
            Phase::KeyExchange => proto.key_exchange,
            Phase::EncryptedPhase => proto.encrypted_phase,
        }
    }
}

/// Compact card for the overview tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolSummary {
    pub name: String,
    pub active_phases: Vec<&'static str>,
}

pub fn protocol_summaries(protocols: &[ProtocolDescriptor]) -> Vec<ProtocolSummary> {
    protocols
        .iter()
        .map(|proto| ProtocolSummary {
            name: proto.name.clone(),
            active_phases: Phase::ALL
                .iter()
                .filter(|phase| phase.is_active(proto))
                .map(Phase::title)
                .collect(),
        })
        .collect()
}

/// Aggregate figures over the whole protocol list.
///
/// `non_crypto_steps` counts inactive phase flags across all protocols, not
/// protocols. Dashboards built against this output rely on that figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolStats {
    pub protocol_count: usize,
    pub crypto_steps: usize,
    pub non_crypto_steps: usize,
    pub high_security: usize,
    pub deprecated: usize,
}

impl ProtocolStats {
    pub fn from_protocols(protocols: &[ProtocolDescriptor]) -> Self {
        protocols.iter().fold(
            Self {
                protocol_count: protocols.len(),
                ..Self::default()
            },
            |mut stats, proto| {
                let active = proto.active_phases();
                stats.crypto_steps += active;
                stats.non_crypto_steps += 4 - active;
                if active >= 3 {
                    stats.high_security += 1;
                }
                if proto.is_deprecated() {
                    stats.deprecated += 1;
                }
                stats
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStatus {
    pub phase: Phase,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolCard {
    pub name: String,
    pub description: &'static str,
    pub security: SecurityLevel,
    /// Display-only figure, drawn from 85-95%.
    pub confidence: f64,
    pub phases: Vec<PhaseStatus>,
    pub function_tags: Vec<&'static str>,
}

impl ProtocolCard {
    pub fn build<R: Rng + ?Sized>(proto: &ProtocolDescriptor, rng: &mut R) -> Self {
        let phases = Phase::ALL
            .iter()
            .map(|&phase| PhaseStatus {
                phase,
                active: phase.is_active(proto),
            })
            .collect();

        let function_tags = Phase::ALL
            .iter()
            .filter(|phase| phase.is_active(proto))
            .flat_map(|phase| phase.function_tags().iter().copied())
            .collect();

        Self {
            name: proto.name.clone(),
            description: CARD_DESCRIPTION,
            security: proto.security_level(),
            confidence: rng.gen_range(85.0..95.0),
            phases,
            function_tags,
        }
    }
}

/// Everything the protocol tab shows. Only exists when protocols were found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolBreakdown {
    pub stats: ProtocolStats,
    pub cards: Vec<ProtocolCard>,
    pub charts: ProtocolCharts,
    pub confidence_bars: Vec<ConfidenceBar>,
}

impl ProtocolBreakdown {
    pub fn build<R: Rng + ?Sized>(protocols: &[ProtocolDescriptor], rng: &mut R) -> Option<Self> {
        if protocols.is_empty() {
            return None;
        }

        let stats = ProtocolStats::from_protocols(protocols);
        let charts = protocol_charts(protocols, &stats, rng);
        let cards = protocols
            .iter()
            .map(|proto| ProtocolCard::build(proto, rng))
            .collect();

        Some(Self {
            stats,
            cards,
            charts,
            confidence_bars: confidence_bars(),
        })
    }
}
