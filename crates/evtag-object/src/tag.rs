use bstr::{BString, ByteSlice};
use evtag_hash::ObjectId;

use crate::{ObjectError, ObjectKind};

const SIGNATURE_MARKERS: [&[u8]; 2] = [
    b"-----BEGIN PGP SIGNATURE-----",
    b"-----BEGIN SSH SIGNATURE-----",
];

/// An annotated tag, message split from any trailing signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub target: ObjectId,
    pub target_kind: ObjectKind,
    pub name: BString,
    /// Message text without the signature block.
    pub message: BString,
    /// Armored signature, if the tag is signed.
    pub signature: Option<BString>,
    /// Byte offset in the raw content where the signature starts; everything
    /// before it is the signed payload.
    signed_len: usize,
}

impl Tag {
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut target = None;
        let mut target_kind = None;
        let mut name = None;

        let mut pos = 0;
        while pos < content.len() {
            let line_end = content[pos..]
                .find_byte(b'\n')
                .map_or(content.len(), |p| p + pos);
            let line = &content[pos..line_end];
            pos = (line_end + 1).min(content.len());
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line.split_once_str(b" ") else {
                continue;
            };
            match key {
                b"object" => {
                    let hex = value
                        .to_str()
                        .map_err(|_| ObjectError::InvalidHeader("non-UTF8 target id".into()))?;
                    target = Some(ObjectId::from_hex(hex)?);
                }
                b"type" => target_kind = Some(ObjectKind::from_bytes(value)?),
                b"tag" => name = Some(BString::from(value)),
                _ => {}
            }
        }

        let body = &content[pos..];
        let sig_start = SIGNATURE_MARKERS
            .iter()
            .filter_map(|marker| body.find(marker))
            .min();
        let (message, signature, signed_len) = match sig_start {
            Some(start) => (
                BString::from(&body[..start]),
                Some(BString::from(&body[start..])),
                pos + start,
            ),
            None => (BString::from(body), None, content.len()),
        };

        Ok(Self {
            target: target.ok_or(ObjectError::MissingTagField { field: "object" })?,
            target_kind: target_kind.ok_or(ObjectError::MissingTagField { field: "type" })?,
            name: name.ok_or(ObjectError::MissingTagField { field: "tag" })?,
            message,
            signature,
            signed_len,
        })
    }

    /// The bytes a detached signature covers, sliced from the same raw content
    /// this tag was parsed from.
    pub fn signed_payload<'a>(&self, content: &'a [u8]) -> &'a [u8] {
        &content[..self.signed_len.min(content.len())]
    }
}
