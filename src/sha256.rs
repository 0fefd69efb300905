//! SHA-256 hash engine for header mining
//!
//! A pure-Rust SHA-256 with the compression function exposed, because the
//! search loop caches the internal state after the header's first 64 bytes
//! (the midstate) and re-runs only the final block per nonce. The `sha2`
//! crate does not hand out that state, so it serves only as the test oracle.
//!
//! Digest bytes are serialized big-endian per SHA-256 but interpreted as a
//! little-endian integer by the target comparator. That mixed convention is
//! Bitcoin's, not an accident.

use crate::types::{Header, Nonce};

/// SHA-256 initial hash values (fractional parts of the square roots of the
/// first 8 primes)
const IV: [u32; 8] = [
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

/// SHA-256 round constants (fractional parts of the cube roots of the first
/// 64 primes)
const K: [u32; 64] = [
    0x428A2F98, 0x71374491, 0xB5C0FBCF, 0xE9B5DBA5, 0x3956C25B, 0x59F111F1, 0x923F82A4, 0xAB1C5ED5,
    0xD807AA98, 0x12835B01, 0x243185BE, 0x550C7DC3, 0x72BE5D74, 0x80DEB1FE, 0x9BDC06A7, 0xC19BF174,
    0xE49B69C1, 0xEFBE4786, 0x0FC19DC6, 0x240CA1CC, 0x2DE92C6F, 0x4A7484AA, 0x5CB0A9DC, 0x76F988DA,
    0x983E5152, 0xA831C66D, 0xB00327C8, 0xBF597FC7, 0xC6E00BF3, 0xD5A79147, 0x06CA6351, 0x14292967,
    0x27B70A85, 0x2E1B2138, 0x4D2C6DFC, 0x53380D13, 0x650A7354, 0x766A0ABB, 0x81C2C92E, 0x92722C85,
    0xA2BFE8A1, 0xA81A664B, 0xC24B8B70, 0xC76C51A3, 0xD192E819, 0xD6990624, 0xF40E3585, 0x106AA070,
    0x19A4C116, 0x1E376C08, 0x2748774C, 0x34B0BCB5, 0x391C0CB3, 0x4ED8AA4A, 0x5B9CCA4F, 0x682E6FF3,
    0x748F82EE, 0x78A5636F, 0x84C87814, 0x8CC70208, 0x90BEFFFA, 0xA4506CEB, 0xBEF9A3F7, 0xC67178F2,
];

/// Run the SHA-256 compression function over one 64-byte block, adding the
/// result back into `state`.
pub fn compress(state: &mut [u32; 8], block: &[u8; 64]) {
    // Message schedule: 16 big-endian words expanded to 64
    let mut w = [0u32; 64];
    for i in 0..16 {
        w[i] = u32::from_be_bytes([
            block[i * 4],
            block[i * 4 + 1],
            block[i * 4 + 2],
            block[i * 4 + 3],
        ]);
    }
    for i in 16..64 {
        let s0 = w[i - 15].rotate_right(7) ^ w[i - 15].rotate_right(18) ^ (w[i - 15] >> 3);
        let s1 = w[i - 2].rotate_right(17) ^ w[i - 2].rotate_right(19) ^ (w[i - 2] >> 10);
        w[i] = w[i - 16]
            .wrapping_add(s0)
            .wrapping_add(w[i - 7])
            .wrapping_add(s1);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for i in 0..64 {
        let s1 = e.rotate_right(6) ^ e.rotate_right(11) ^ e.rotate_right(25);
        let ch = (e & f) ^ ((!e) & g);
        let temp1 = h
            .wrapping_add(s1)
            .wrapping_add(ch)
            .wrapping_add(K[i])
            .wrapping_add(w[i]);
        let s0 = a.rotate_right(2) ^ a.rotate_right(13) ^ a.rotate_right(22);
        let maj = (a & b) ^ (a & c) ^ (b & c);
        let temp2 = s0.wrapping_add(maj);

        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(temp1);
        d = c;
        c = b;
        b = a;
        a = temp1.wrapping_add(temp2);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
    state[4] = state[4].wrapping_add(e);
    state[5] = state[5].wrapping_add(f);
    state[6] = state[6].wrapping_add(g);
    state[7] = state[7].wrapping_add(h);
}

/// Serialize an 8-word hash state big-endian into 32 bytes
fn serialize_state(state: &[u32; 8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, word) in state.iter().enumerate() {
        out[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// One-shot SHA-256 with standard MD padding
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut state = IV;
    let mut chunks = data.chunks_exact(64);
    for chunk in &mut chunks {
        let block: [u8; 64] = chunk.try_into().expect("exact chunk");
        compress(&mut state, &block);
    }

    // Padding: 0x80, zeros, then the bit length as a 64-bit big-endian field
    let rem = chunks.remainder();
    let mut block = [0u8; 64];
    block[..rem.len()].copy_from_slice(rem);
    block[rem.len()] = 0x80;
    if rem.len() >= 56 {
        compress(&mut state, &block);
        block = [0u8; 64];
    }
    let bit_len = (data.len() as u64) * 8;
    block[56..].copy_from_slice(&bit_len.to_be_bytes());
    compress(&mut state, &block);

    serialize_state(&state)
}

/// Hash state captured after compressing a header's first 64 bytes.
///
/// Valid only for the header it was derived from; those bytes never change
/// across nonce trials, so the state is reused for every nonce of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midstate([u32; 8]);

impl Midstate {
    /// Derive the midstate from a header (one compression call)
    pub fn of(header: &Header) -> Self {
        let mut state = IV;
        let block: [u8; 64] = header.prefix().try_into().expect("64-byte prefix");
        compress(&mut state, &block);
        Self(state)
    }
}

/// The reusable second block of the header hash: header bytes 64..80
/// followed by the MD padding for an 80-byte (640-bit) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailBlock {
    block: [u8; 64],
}

impl TailBlock {
    /// Offset of the nonce within the tail block (header offset 76..80)
    pub const NONCE_OFFSET: usize = 12;

    /// Build the tail block for a header
    pub fn new(header: &Header) -> Self {
        let mut block = [0u8; 64];
        block[..16].copy_from_slice(header.suffix());
        block[16] = 0x80;
        block[56..].copy_from_slice(&(Header::SIZE as u64 * 8).to_be_bytes());
        Self { block }
    }

    /// Write a nonce little-endian into the tail block
    pub fn set_nonce(&mut self, nonce: Nonce) {
        self.block[Self::NONCE_OFFSET..Self::NONCE_OFFSET + 4].copy_from_slice(&nonce.to_bytes());
    }
}

/// Second hash pass: SHA-256 of a 32-byte digest as a single padded block
fn second_pass(digest: &[u8; 32]) -> [u8; 32] {
    let mut block = [0u8; 64];
    block[..32].copy_from_slice(digest);
    block[32] = 0x80;
    block[56..].copy_from_slice(&(32u64 * 8).to_be_bytes());

    let mut state = IV;
    compress(&mut state, &block);
    serialize_state(&state)
}

/// Double SHA-256 of an 80-byte header, from scratch.
///
/// The slow path: both pass-1 blocks plus pass 2, three compressions. The
/// search loop uses [`finalize_double`] instead.
pub fn double_sha256(header: &Header) -> [u8; 32] {
    second_pass(&sha256(header.as_bytes()))
}

/// Double SHA-256 of a header given its cached midstate and tail block.
///
/// One compression for the remaining pass-1 block, one for pass 2. Must
/// agree with [`double_sha256`] for every nonce.
pub fn finalize_double(midstate: &Midstate, tail: &TailBlock) -> [u8; 32] {
    let mut state = midstate.0;
    compress(&mut state, &tail.block);
    second_pass(&serialize_state(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sha2::Digest;

    /// The well-known Bitcoin genesis block header
    const GENESIS_HEADER_HEX: &str = concat!(
        "01000000",                                                         // version
        "0000000000000000000000000000000000000000000000000000000000000000", // prev hash
        "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a", // merkle root
        "29ab5f49",                                                         // time
        "ffff001d",                                                         // bits
        "1dac2b7c",                                                         // nonce
    );

    fn genesis_header() -> Header {
        Header::from_hex(GENESIS_HEADER_HEX).unwrap()
    }

    #[test]
    fn test_sha256_abc() {
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(sha256(b"abc").as_slice(), expected.as_slice());
    }

    #[test]
    fn test_sha256_empty() {
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(sha256(b"").as_slice(), expected.as_slice());
    }

    #[test]
    fn test_sha256_padding_boundaries() {
        // 55, 56 and 64 byte messages exercise the one-block, two-block and
        // exact-block padding paths
        for len in [55usize, 56, 63, 64, 65, 80] {
            let data = vec![0xa5u8; len];
            let expected: [u8; 32] = sha2::Sha256::digest(&data).into();
            assert_eq!(sha256(&data), expected, "length {len}");
        }
    }

    #[test]
    fn test_genesis_double_hash() {
        let expected =
            hex::decode("6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000")
                .unwrap();
        assert_eq!(double_sha256(&genesis_header()).as_slice(), expected.as_slice());
    }

    #[test]
    fn test_tail_block_layout() {
        let header = genesis_header();
        let tail = TailBlock::new(&header);

        assert_eq!(&tail.block[..16], header.suffix());
        assert_eq!(tail.block[16], 0x80);
        assert!(tail.block[17..56].iter().all(|&b| b == 0));
        assert_eq!(&tail.block[56..], &640u64.to_be_bytes());
    }

    #[test]
    fn test_midstate_path_matches_scratch_path() {
        let mut header = genesis_header();
        let midstate = Midstate::of(&header);
        let mut tail = TailBlock::new(&header);

        for nonce in [0u32, 1, 0x7c2b_ac1d, 0xffff_ffff] {
            let nonce = Nonce::new(nonce);
            header.inject_nonce(nonce);
            tail.set_nonce(nonce);
            assert_eq!(
                finalize_double(&midstate, &tail),
                double_sha256(&header),
                "nonce {nonce}"
            );
        }
    }

    #[test]
    fn test_double_sha256_matches_oracle() {
        let header = genesis_header();
        let once: [u8; 32] = sha2::Sha256::digest(header.as_bytes()).into();
        let expected: [u8; 32] = sha2::Sha256::digest(once).into();
        assert_eq!(double_sha256(&header), expected);
    }

    proptest! {
        #[test]
        fn prop_midstate_differential(bytes in prop::array::uniform32(any::<u8>()),
                                      more in prop::collection::vec(any::<u8>(), 48),
                                      nonce in any::<u32>()) {
            let mut raw = [0u8; Header::SIZE];
            raw[..32].copy_from_slice(&bytes);
            raw[32..80].copy_from_slice(&more);
            let mut header = Header::new(raw);

            let midstate = Midstate::of(&header);
            let mut tail = TailBlock::new(&header);

            let nonce = Nonce::new(nonce);
            header.inject_nonce(nonce);
            tail.set_nonce(nonce);

            let fast = finalize_double(&midstate, &tail);
            let slow = double_sha256(&header);
            prop_assert_eq!(fast, slow);

            let once: [u8; 32] = sha2::Sha256::digest(header.as_bytes()).into();
            let oracle: [u8; 32] = sha2::Sha256::digest(once).into();
            prop_assert_eq!(slow, oracle);
        }
    }
}
