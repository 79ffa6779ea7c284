use crate::models::SessionResultEnvelope;
use serde::Serialize;

/// What the assistant knows about the current analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantContext {
    pub detected: String,
    pub confidence: f64,
}

impl Default for AssistantContext {
    fn default() -> Self {
        Self {
            detected: "AES".to_string(),
            confidence: 94.2,
        }
    }
}

impl AssistantContext {
    /// Context from the cached session result, defaults otherwise.
    pub fn from_envelope(envelope: Option<&SessionResultEnvelope>) -> Self {
        let defaults = Self::default();
        let Some(envelope) = envelope else {
            return defaults;
        };
        let payload = envelope.payload();
        Self {
            detected: payload
                .detected
                .filter(|d| !d.is_empty())
                .unwrap_or(defaults.detected),
            confidence: payload
                .confidence
                .filter(|c| *c != 0.0)
                .unwrap_or(defaults.confidence),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Keyword-driven assistant with canned answers.
#[derive(Debug, Default)]
pub struct CryptoAssistant {
    transcript: Vec<ChatMessage>,
}

impl CryptoAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Record the question and the reply. Blank input is ignored.
    pub fn ask(&mut self, message: &str, context: &AssistantContext) -> Option<String> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage {
            role: Role::User,
            content: message.to_string(),
        });
        let reply = Self::reply(message, context);
        self.transcript.push(ChatMessage {
            role: Role::Assistant,
            content: reply.clone(),
        });
        Some(reply)
    }

    pub fn reply(message: &str, context: &AssistantContext) -> String {
        let lower = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        let algo = &context.detected;
        let confidence = context.confidence;

        if has(&["aes", "algorithm"]) {
            return format!(
                "Based on the analysis, I detected {} with {:.1}% confidence. This algorithm is identified by characteristic patterns like S-box lookups (constant table access), round-based structure, and MixColumns operations. The control flow graph shows typical AES encryption rounds with substitution and permutation layers.",
                algo, confidence
            );
        }

        if has(&["function", "look like"]) {
            return format!(
                "The function exhibits classic cryptographic patterns:\n\n1. **S-Box Operations**: Constant table lookups indicating substitution operations\n2. **Round Structure**: Iterative processing typical of block ciphers\n3. **Bit Manipulation**: XOR operations and shifts common in crypto\n4. **Key Schedule**: Separate key expansion routines\n\nThese patterns strongly suggest {} implementation.",
                algo
            );
        }

        if has(&["protocol", "tls", "ssl"]) {
            return format!(
                "The firmware shows protocol implementation with:\n\n• **Handshake Phase**: Client/Server hello exchanges\n• **Key Exchange**: ECDHE or RSA key agreement\n• **Encryption Phase**: Symmetric encryption using {}\n• **Authentication**: HMAC for message integrity\n\nThis indicates a secure communication protocol like TLS 1.2 or 1.3.",
                algo
            );
        }

        if has(&["confidence", "sure"]) {
            return format!(
                "The {:.1}% confidence score is based on:\n\n• **Pattern Matching**: {}% - Characteristic instruction sequences\n• **Control Flow**: {}% - Expected block structure\n• **Data Flow**: {}% - Typical crypto data patterns\n• **Context**: {}% - Surrounding code analysis\n\nHigh confidence indicates strong algorithmic signatures.",
                confidence,
                (confidence * 0.4).floor(),
                (confidence * 0.3).floor(),
                (confidence * 0.2).floor(),
                (confidence * 0.1).floor()
            );
        }

        if has(&["secure", "safe", "vulnerability"]) {
            return format!(
                "Security assessment:\n\n✅ **Strong Points**:\n• Modern algorithm ({})\n• Proper key sizes detected\n• Standard implementation patterns\n\n⚠️ **Recommendations**:\n• Verify key management practices\n• Check for side-channel protections\n• Ensure proper IV/nonce handling\n• Review authentication mechanisms",
                algo
            );
        }

        if has(&["how", "work"]) {
            return format!(
                "{} works through:\n\n1. **Key Expansion**: Derives round keys from master key\n2. **Initial Round**: AddRoundKey operation\n3. **Main Rounds**: SubBytes (S-box), ShiftRows, MixColumns, AddRoundKey\n4. **Final Round**: SubBytes, ShiftRows, AddRoundKey (no MixColumns)\n\nEach round transforms the data block using substitution-permutation network principles.",
                algo
            );
        }

        if has(&["improve", "optimize"]) {
            return "Optimization suggestions:\n\n🚀 **Performance**:\n• Use hardware AES instructions (AES-NI)\n• Implement table-based lookups\n• Consider parallel processing modes (CTR, GCM)\n\n🔒 **Security**:\n• Add constant-time implementations\n• Implement side-channel countermeasures\n• Use authenticated encryption (GCM, CCM)".to_string();
        }

        format!(
            "I can help you understand the crypto detection results! I see {} was detected with {:.1}% confidence.\n\nYou can ask me about:\n• Algorithm characteristics and patterns\n• Function analysis and control flow\n• Protocol implementations\n• Security recommendations\n• Optimization suggestions\n\nWhat would you like to know?",
            algo, confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> AssistantContext {
        AssistantContext {
            detected: "ChaCha20".to_string(),
            confidence: 87.5,
        }
    }

    #[test]
    fn test_algorithm_question() {
        let reply = CryptoAssistant::reply("Which ALGORITHM is this?", &ctx());
        assert!(reply.contains("detected ChaCha20 with 87.5% confidence"));
    }

    #[test]
    fn test_keyword_priority() {
        // "aes" wins over "protocol" because it is checked first.
        let reply = CryptoAssistant::reply("is the aes protocol safe", &ctx());
        assert!(reply.starts_with("Based on the analysis"));

        let reply = CryptoAssistant::reply("what about TLS?", &ctx());
        assert!(reply.contains("Symmetric encryption using ChaCha20"));
    }

    #[test]
    fn test_confidence_breakdown_floors() {
        let reply = CryptoAssistant::reply("how sure are you", &ctx());
        // 87.5 * 0.4 = 35, * 0.3 = 26.25, * 0.2 = 17.5, * 0.1 = 8.75
        assert!(reply.contains("**Pattern Matching**: 35%"));
        assert!(reply.contains("**Control Flow**: 26%"));
        assert!(reply.contains("**Data Flow**: 17%"));
        assert!(reply.contains("**Context**: 8%"));
    }

    #[test]
    fn test_default_reply() {
        let reply = CryptoAssistant::reply("hello there", &ctx());
        assert!(reply.starts_with("I can help you understand"));
    }

    #[test]
    fn test_blank_message_ignored() {
        let mut assistant = CryptoAssistant::new();
        assert!(assistant.ask("   ", &ctx()).is_none());
        assert!(assistant.transcript().is_empty());

        assistant.ask("optimize it", &ctx()).unwrap();
        assert_eq!(assistant.transcript().len(), 2);
        assert_eq!(assistant.transcript()[1].role, Role::Assistant);
    }

    #[test]
    fn test_context_from_envelope() {
        assert_eq!(AssistantContext::from_envelope(None), AssistantContext::default());

        let envelope = SessionResultEnvelope::new(
            "fw.bin",
            1,
            json!({ "detected": "SHA256", "confidence": 66.0 }),
        );
        let context = AssistantContext::from_envelope(Some(&envelope));
        assert_eq!(context.detected, "SHA256");
        assert_eq!(context.confidence, 66.0);
    }
}
