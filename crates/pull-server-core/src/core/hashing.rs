// crates/pull-server-core/src/core/hashing.rs
// ============================================================================
// Module: Pull Server Hashing Helpers
// Description: Hex encoding and secret fingerprinting.
// Purpose: Share canonical digest text forms across providers and stores.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Checksums handed to agents are uppercase hexadecimal without separators.
//! Store integrity hashes and secret fingerprints reuse the same encoding so
//! that every digest in the system has exactly one text form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as an uppercase hex string with no separators.
#[must_use]
pub fn hex_upper(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Returns the uppercase hex SHA-256 digest of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_upper(&Sha256::digest(bytes))
}

/// Returns a short, non-reversible fingerprint for a secret value.
///
/// Used wherever a key must be identified in events without disclosing it.
#[must_use]
pub fn fingerprint(secret: &str) -> String {
    let mut digest = sha256_hex(secret.as_bytes());
    digest.truncate(16);
    digest
}

#[cfg(test)]
mod tests {
    use super::fingerprint;
    use super::hex_upper;
    use super::sha256_hex;

    #[test]
    fn hex_is_uppercase_without_separators() {
        assert_eq!(hex_upper(&[0x00, 0xab, 0x0f, 0xff]), "00AB0FFF");
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn fingerprint_is_truncated_digest() {
        assert_eq!(fingerprint("abc"), "BA7816BF8F01CFEA");
    }
}
