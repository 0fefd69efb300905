//! Job ingestion and share emission wire protocol
//!
//! The job message looks like JSON but is read by a fixed-shape scanner, not
//! a JSON parser: the grammar is exactly one `"header"` key with a quoted
//! 160-hex-char value and one `"target"` key with a quoted 64-hex-char
//! value, terminated by `}`. Any deviation is a structured error; the
//! scanner never hands back zero-filled fields.

use crate::transport::Transport;
use crate::types::{Header, Job, Nonce, Share, Target};
use crate::{Error, Result};

/// Bound on the job ingestion buffer. A well-formed message is ~250 bytes.
pub const JOB_BUFFER_LIMIT: usize = 512;

const HEADER_MARKER: &[u8] = b"\"header\":\"";
const TARGET_MARKER: &[u8] = b"\"target\":\"";
const NONCE_MARKER: &[u8] = b"\"nonce\":\"";
const HASH_MARKER: &[u8] = b"\"hash\":\"";

/// Read one job message from the transport.
///
/// Consumes bytes up to and including the terminating `}`; bytes after it
/// are left unread. Exceeding [`JOB_BUFFER_LIMIT`] aborts the read with
/// `BufferOverflow` rather than silently truncating.
pub async fn read_job(transport: &mut dyn Transport, id: u64) -> Result<Job> {
    let mut buffer = Vec::with_capacity(JOB_BUFFER_LIMIT);
    loop {
        let byte = transport.read_byte().await?;
        buffer.push(byte);
        if byte == b'}' {
            break;
        }
        if buffer.len() >= JOB_BUFFER_LIMIT {
            return Err(Error::buffer_overflow(JOB_BUFFER_LIMIT));
        }
    }
    parse_job(&buffer, id)
}

/// Parse a complete job message
pub fn parse_job(message: &[u8], id: u64) -> Result<Job> {
    let header_hex = hex_field(message, HEADER_MARKER, "header", Header::SIZE * 2)?;
    let target_hex = hex_field(message, TARGET_MARKER, "target", Target::SIZE * 2)?;

    let header_bytes =
        hex::decode(header_hex).map_err(|e| Error::malformed_job("header", e.to_string()))?;
    let target_bytes =
        hex::decode(target_hex).map_err(|e| Error::malformed_job("target", e.to_string()))?;

    let header = Header::from_bytes(&header_bytes)?;
    let target = Target::from_bytes(&target_bytes)?;
    Ok(Job::new(header, target, id))
}

/// Encode a share into its wire message
pub fn encode_share(share: &Share) -> String {
    format!(
        "{{\"nonce\":\"{}\",\"hash\":\"{}\"}}\n",
        share.nonce.to_hex(),
        hex::encode(share.hash)
    )
}

/// Write a share message whole to the transport
pub async fn write_share(transport: &mut dyn Transport, share: &Share) -> Result<()> {
    transport.write_bytes(encode_share(share).as_bytes()).await
}

/// Decode a share message produced by [`encode_share`]
pub fn decode_share(message: &[u8]) -> Result<Share> {
    let nonce_hex = hex_field(message, NONCE_MARKER, "nonce", 8)?;
    let hash_hex = hex_field(message, HASH_MARKER, "hash", 64)?;

    let nonce_str = std::str::from_utf8(nonce_hex)
        .map_err(|_| Error::malformed_job("nonce", "non-ascii value"))?;
    let nonce = u32::from_str_radix(nonce_str, 16)
        .map_err(|e| Error::malformed_job("nonce", e.to_string()))?;

    let hash_bytes =
        hex::decode(hash_hex).map_err(|e| Error::malformed_job("hash", e.to_string()))?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hash_bytes);

    Ok(Share::new(Nonce::new(nonce), hash))
}

/// Locate `marker` and return the `len` bytes of quoted value that follow it
fn hex_field<'a>(
    message: &'a [u8],
    marker: &[u8],
    field: &'static str,
    len: usize,
) -> Result<&'a [u8]> {
    let at = find(message, marker)
        .ok_or_else(|| Error::malformed_job(field, "key marker not found"))?;
    let start = at + marker.len();
    let value = message
        .get(start..start + len)
        .ok_or_else(|| Error::malformed_job(field, "value truncated"))?;
    match message.get(start + len) {
        Some(b'"') => Ok(value),
        _ => Err(Error::malformed_job(field, "closing quote not found")),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use assert_matches::assert_matches;

    fn job_message() -> String {
        format!(
            "{{\"header\":\"{}\",\"target\":\"{}\"}}",
            "ab".repeat(Header::SIZE),
            "7f".repeat(Target::SIZE)
        )
    }

    #[tokio::test]
    async fn test_read_job_exact_message() {
        let mut transport = MemoryTransport::new(job_message().into_bytes());
        let job = read_job(&mut transport, 7).await.unwrap();

        assert_eq!(job.id, 7);
        assert_eq!(job.header.as_bytes(), &[0xabu8; Header::SIZE]);
        assert_eq!(job.target.to_bytes(), [0x7fu8; Target::SIZE]);
    }

    #[tokio::test]
    async fn test_read_job_leaves_trailing_bytes() {
        let mut input = job_message().into_bytes();
        input.push(b'X'); // next message's first byte
        let mut transport = MemoryTransport::new(input);

        read_job(&mut transport, 0).await.unwrap();
        assert_eq!(transport.read_byte().await.unwrap(), b'X');
    }

    #[tokio::test]
    async fn test_read_job_overflow() {
        // No terminator within the bound
        let mut transport = MemoryTransport::new(vec![b'a'; JOB_BUFFER_LIMIT + 64]);
        assert_matches!(
            read_job(&mut transport, 0).await,
            Err(Error::BufferOverflow { limit: JOB_BUFFER_LIMIT })
        );
    }

    #[test]
    fn test_parse_job_missing_header_key() {
        let message = format!("{{\"target\":\"{}\"}}", "00".repeat(Target::SIZE));
        assert_matches!(
            parse_job(message.as_bytes(), 0),
            Err(Error::MalformedJob { field: "header", .. })
        );
    }

    #[test]
    fn test_parse_job_missing_target_key() {
        let message = format!("{{\"header\":\"{}\"}}", "00".repeat(Header::SIZE));
        assert_matches!(
            parse_job(message.as_bytes(), 0),
            Err(Error::MalformedJob { field: "target", .. })
        );
    }

    #[test]
    fn test_parse_job_short_value() {
        let message = format!(
            "{{\"header\":\"{}\",\"target\":\"{}\"}}",
            "ab".repeat(Header::SIZE - 1),
            "7f".repeat(Target::SIZE)
        );
        assert_matches!(
            parse_job(message.as_bytes(), 0),
            Err(Error::MalformedJob { field: "header", .. })
        );
    }

    #[test]
    fn test_parse_job_bad_hex_digit() {
        let mut header_hex = "ab".repeat(Header::SIZE);
        header_hex.replace_range(0..2, "zz");
        let message = format!(
            "{{\"header\":\"{}\",\"target\":\"{}\"}}",
            header_hex,
            "7f".repeat(Target::SIZE)
        );
        assert_matches!(
            parse_job(message.as_bytes(), 0),
            Err(Error::MalformedJob { field: "header", .. })
        );
    }

    #[test]
    fn test_parse_job_decodes_pairwise() {
        // First hex char is the high nibble of each byte
        let mut header_hex = "00".repeat(Header::SIZE);
        header_hex.replace_range(0..2, "f1");
        let message = format!(
            "{{\"header\":\"{}\",\"target\":\"{}\"}}",
            header_hex,
            "00".repeat(Target::SIZE)
        );
        let job = parse_job(message.as_bytes(), 0).unwrap();
        assert_eq!(job.header.as_bytes()[0], 0xf1);
    }

    #[test]
    fn test_encode_share_format() {
        let share = Share::new(Nonce::new(0xdead_beef), [0x11u8; 32]);
        let encoded = encode_share(&share);
        assert_eq!(
            encoded,
            format!("{{\"nonce\":\"deadbeef\",\"hash\":\"{}\"}}\n", "11".repeat(32))
        );
        assert!(encoded.ends_with("}\n"));
    }

    #[test]
    fn test_share_roundtrip() {
        let share = Share::new(Nonce::new(1), [0u8; 32]);
        let decoded = decode_share(encode_share(&share).as_bytes()).unwrap();
        assert_eq!(decoded.nonce.value(), 1);
        assert_eq!(decoded.hash, [0u8; 32]);
    }

    #[test]
    fn test_decode_share_missing_key() {
        assert_matches!(
            decode_share(b"{\"nonce\":\"00000001\"}"),
            Err(Error::MalformedJob { field: "hash", .. })
        );
    }

    #[tokio::test]
    async fn test_write_share() {
        let mut transport = MemoryTransport::new(Vec::new());
        let share = Share::new(Nonce::new(2), [0xaau8; 32]);
        write_share(&mut transport, &share).await.unwrap();
        assert_eq!(transport.written(), encode_share(&share).as_bytes());
    }
}
