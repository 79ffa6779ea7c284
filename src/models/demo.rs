//! Built-in demo result shown when nothing else resolves.

use super::{
    AlgorithmScore, AnalysisRecord, RecordMetrics, HASH_FUNCTION, MAC_ALGORITHM,
    SYMMETRIC_CIPHER,
};
use std::collections::HashMap;

const SYMMETRIC: &[(&str, f64)] = &[
    ("AES", 85.3),
    ("AES128", 88.7),
    ("AES256", 94.2),
    ("DES", 45.1),
    ("TripleDES", 52.3),
    ("ChaCha20", 67.8),
    ("Blowfish", 41.2),
    ("Twofish", 38.9),
    ("RC4", 35.6),
    ("RC5", 33.2),
    ("RC6", 31.8),
];

const HASHES: &[(&str, f64)] = &[
    ("SHA1", 42.5),
    ("SHA256", 55.8),
    ("SHA384", 48.3),
    ("SHA512", 51.2),
    ("SHA3", 39.7),
    ("MD5", 36.4),
    ("BLAKE2", 44.1),
];

const MACS: &[(&str, f64)] = &[("HMAC", 58.9), ("CMAC", 47.6), ("Poly1305", 43.2)];

fn scores(table: &[(&str, f64)]) -> Vec<AlgorithmScore> {
    table
        .iter()
        .map(|&(name, confidence)| AlgorithmScore {
            name: name.to_string(),
            confidence,
        })
        .collect()
}

/// Fixed sample: an ARM64 firmware image with AES-256 detected.
pub fn demo_record() -> AnalysisRecord {
    let algorithms_by_category = HashMap::from([
        (SYMMETRIC_CIPHER.to_string(), scores(SYMMETRIC)),
        (HASH_FUNCTION.to_string(), scores(HASHES)),
        (MAC_ALGORITHM.to_string(), scores(MACS)),
    ]);

    AnalysisRecord {
        filename: "firmware_sample.bin".to_string(),
        filesize: 2_516_582,
        architecture: "ARM64/AArch64".to_string(),
        detected: "AES256".to_string(),
        category: SYMMETRIC_CIPHER.to_string(),
        confidence: 94.2,
        protocols: Vec::new(),
        algorithms_by_category,
        metrics: RecordMetrics {
            crypto_functions: 23,
            non_crypto_functions: 824,
            avg_confidence: 94.2,
            protocol: Some("TLS 1.2".to_string()),
        },
        functions: Vec::new(),
    }
}
