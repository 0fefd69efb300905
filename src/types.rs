//! Core types for header mining
//!
//! Fundamental types used throughout the miner with validation, binary
//! encoding, and hex conversion.

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// An 80-byte Bitcoin block header.
///
/// Layout: version(4) | prev-hash(32) | merkle-root(32) | time(4) | bits(4)
/// | nonce(4). The nonce occupies the last 4 bytes, least-significant-byte
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    bytes: [u8; Self::SIZE],
}

impl Header {
    /// Header size in bytes
    pub const SIZE: usize = 80;

    /// Offset of the little-endian nonce field
    pub const NONCE_OFFSET: usize = 76;

    /// Create a header from raw bytes
    pub fn new(bytes: [u8; Self::SIZE]) -> Self {
        Self { bytes }
    }

    /// Create a header from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::header(format!(
                "expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        let mut array = [0u8; Self::SIZE];
        array.copy_from_slice(bytes);
        Ok(Self::new(array))
    }

    /// Create a header from a 160-character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != Self::SIZE * 2 {
            return Err(Error::header(format!(
                "expected {} hex chars, got {}",
                Self::SIZE * 2,
                hex_str.len()
            )));
        }
        let bytes =
            hex::decode(hex_str).map_err(|e| Error::header(format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw header bytes
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.bytes
    }

    /// Get the first 64 bytes, the block the midstate is derived from
    pub fn prefix(&self) -> &[u8] {
        &self.bytes[..64]
    }

    /// Get bytes 64..80, the material of the search loop's tail block
    pub fn suffix(&self) -> &[u8] {
        &self.bytes[64..]
    }

    /// Write a nonce into the header at the nonce offset (little-endian)
    pub fn inject_nonce(&mut self, nonce: Nonce) {
        self.bytes[Self::NONCE_OFFSET..].copy_from_slice(&nonce.to_bytes());
    }

    /// Read the nonce currently stored in the header
    pub fn extract_nonce(&self) -> Nonce {
        Nonce::new(LittleEndian::read_u32(&self.bytes[Self::NONCE_OFFSET..]))
    }

    /// Header version field
    pub fn version(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[..4])
    }

    /// Header timestamp field
    pub fn time(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[68..72])
    }

    /// Compact difficulty bits field
    pub fn bits(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[72..76])
    }

    /// Convert to a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Mining target representing the difficulty threshold.
///
/// A digest is a valid solution when its 256-bit value is at or below the
/// target. Both digest and target are interpreted little-endian: byte 31 of
/// the stored form is the most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    /// 256-bit target value as 4 64-bit words in little-endian word order
    words: [u64; 4],
}

impl Target {
    /// Target size in serialized bytes
    pub const SIZE: usize = 32;

    /// Create a target from its word representation
    pub fn new(words: [u64; 4]) -> Self {
        Self { words }
    }

    /// Create a target from 32 bytes (byte 0 least significant)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::target(format!(
                "expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        let mut words = [0u64; 4];
        LittleEndian::read_u64_into(bytes, &mut words);
        Ok(Self::new(words))
    }

    /// Create a target from a 64-character hex string in wire order
    /// (first hex pair = byte 0 = least significant byte)
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != Self::SIZE * 2 {
            return Err(Error::target(format!(
                "expected {} hex chars, got {}",
                Self::SIZE * 2,
                hex_str.len()
            )));
        }
        let bytes =
            hex::decode(hex_str).map_err(|e| Error::target(format!("invalid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize to 32 bytes (byte 0 least significant)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        LittleEndian::write_u64_into(&self.words, &mut bytes);
        bytes
    }

    /// Convert to a hex string in wire order
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Check whether a digest meets this target.
    ///
    /// Big-number `<=` with byte 31 most significant: scan words from most
    /// significant down, decide at the first difference, accept equality.
    pub fn meets(&self, hash: &[u8; 32]) -> bool {
        let mut hash_words = [0u64; 4];
        LittleEndian::read_u64_into(hash, &mut hash_words);

        for i in (0..4).rev() {
            if hash_words[i] < self.words[i] {
                return true;
            }
            if hash_words[i] > self.words[i] {
                return false;
            }
        }
        true
    }

    /// Maximum possible target (easiest difficulty)
    pub fn max() -> Self {
        Self::new([u64::MAX; 4])
    }

    /// Minimum possible target (unsatisfiable except by an all-zero digest)
    pub fn min() -> Self {
        Self::new([0; 4])
    }

    /// Number of leading zero bits required of a solution, for logging
    pub fn difficulty_level(&self) -> u32 {
        for i in (0..4).rev() {
            if self.words[i] != 0 {
                return (3 - i as u32) * 64 + self.words[i].leading_zeros();
            }
        }
        256
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Proof-of-work nonce (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(pub u32);

impl Nonce {
    /// Create a new nonce
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the nonce value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Convert to bytes (little-endian, as stored in the header)
    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Convert to 8 lowercase hex chars, big-endian nibble order
    pub fn to_hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A unit of mining work: one header, one target.
///
/// Immutable once ingested; exactly one job is active at a time. The id is
/// assigned by ingestion order and appears in logs only, never on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub header: Header,
    pub target: Target,
    pub id: u64,
}

impl Job {
    /// Create a new job
    pub fn new(header: Header, target: Target, id: u64) -> Self {
        Self { header, target, id }
    }
}

/// A successful (nonce, hash) pair for the active job's target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub nonce: Nonce,
    pub hash: [u8; 32],
}

impl Share {
    /// Create a new share
    pub fn new(nonce: Nonce, hash: [u8; 32]) -> Self {
        Self { nonce, hash }
    }
}
