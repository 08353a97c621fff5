//! The `"<kind> <size>\0"` object header.
//!
//! The same framing git uses for native ids also frames each object in the
//! typed-header digest format.

use crate::{ObjectError, ObjectKind};

/// Encode a header: lowercase kind name, one space, decimal size, NUL.
pub fn encode(kind: ObjectKind, size: u64) -> Vec<u8> {
    format!("{} {}\0", kind, size).into_bytes()
}

/// Parse a header from the front of `data`.
///
/// Returns `(kind, size, header_len)` where `header_len` counts the NUL.
pub fn parse(data: &[u8]) -> Result<(ObjectKind, u64, usize), ObjectError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ObjectError::InvalidHeader("missing NUL terminator".into()))?;
    let header = &data[..nul];
    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;

    let kind = ObjectKind::from_bytes(&header[..space])?;
    let digits = &header[space + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::InvalidHeader(format!(
            "invalid size: {}",
            String::from_utf8_lossy(digits)
        )));
    }
    let size = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ObjectError::InvalidHeader("size out of range".into()))?;

    Ok((kind, size, nul + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_blob() {
        assert_eq!(encode(ObjectKind::Blob, 5), b"blob 5\0");
    }

    #[test]
    fn encode_zero_size_tree() {
        assert_eq!(encode(ObjectKind::Tree, 0), b"tree 0\0");
    }

    #[test]
    fn parse_with_payload() {
        let data = b"blob 12\0hello world!";
        let (kind, size, len) = parse(data).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(size, 12);
        assert_eq!(&data[len..], b"hello world!");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse(b"blob 12").is_err());
        assert!(parse(b"blob12\0").is_err());
        assert!(parse(b"widget 12\0").is_err());
        assert!(parse(b"blob -1\0").is_err());
        assert!(parse(b"blob \0").is_err());
    }
}
