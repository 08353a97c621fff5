//! Streaming hashers.
//!
//! [`NativeHasher`] recomputes store-native object ids (with SHA-1 collision
//! detection). [`StrongHasher`] produces the independent snapshot digest.

use digest::Digest;

use crate::hex::to_hex;
use crate::{DigestAlgorithm, HashAlgorithm, HashError, ObjectId};

enum NativeInner {
    Sha1(Box<sha1_checked::Sha1>),
    Sha256(sha2::Sha256),
}

/// Computes store-native object ids.
pub struct NativeHasher {
    inner: NativeInner,
}

impl NativeHasher {
    pub fn new(algo: HashAlgorithm) -> Self {
        let inner = match algo {
            HashAlgorithm::Sha1 => NativeInner::Sha1(Box::new(sha1_checked::Sha1::new())),
            HashAlgorithm::Sha256 => NativeInner::Sha256(sha2::Sha256::new()),
        };
        Self { inner }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            NativeInner::Sha1(h) => h.update(data),
            NativeInner::Sha256(h) => h.update(data),
        }
    }

    /// Finish into an id. Fails if SHA-1 collision detection fires.
    pub fn finalize(self) -> Result<ObjectId, HashError> {
        match self.inner {
            NativeInner::Sha1(h) => {
                let result = h.try_finalize();
                if result.has_collision() {
                    return Err(HashError::Sha1Collision);
                }
                ObjectId::from_bytes(result.hash().as_slice(), HashAlgorithm::Sha1)
            }
            NativeInner::Sha256(h) => ObjectId::from_bytes(&h.finalize(), HashAlgorithm::Sha256),
        }
    }

    /// Id of an object as git computes it: hash of `"<kind> <len>\0" + payload`.
    pub fn object_id(algo: HashAlgorithm, kind: &str, payload: &[u8]) -> Result<ObjectId, HashError> {
        let mut h = Self::new(algo);
        h.update(format!("{} {}\0", kind, payload.len()).as_bytes());
        h.update(payload);
        h.finalize()
    }
}

enum StrongInner {
    Sha512(sha2::Sha512),
    Sha256(sha2::Sha256),
}

/// Running state of a strong digest.
///
/// Finalizing consumes the hasher, so a finished digest cannot be fed again.
pub struct StrongHasher {
    inner: StrongInner,
}

impl StrongHasher {
    pub fn new(algo: DigestAlgorithm) -> Self {
        let inner = match algo {
            DigestAlgorithm::Sha512 => StrongInner::Sha512(sha2::Sha512::new()),
            DigestAlgorithm::Sha256 => StrongInner::Sha256(sha2::Sha256::new()),
        };
        Self { inner }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self.inner {
            StrongInner::Sha512(_) => DigestAlgorithm::Sha512,
            StrongInner::Sha256(_) => DigestAlgorithm::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            StrongInner::Sha512(h) => h.update(data),
            StrongInner::Sha256(h) => h.update(data),
        }
    }

    /// Finish and return the raw digest bytes.
    pub fn finalize(self) -> Vec<u8> {
        match self.inner {
            StrongInner::Sha512(h) => h.finalize().to_vec(),
            StrongInner::Sha256(h) => h.finalize().to_vec(),
        }
    }

    /// Finish and return the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        to_hex(&self.finalize())
    }

    /// One-shot hex digest of `data`.
    pub fn hex_digest(algo: DigestAlgorithm, data: &[u8]) -> String {
        let mut h = Self::new(algo);
        h.update(data);
        h.finalize_hex()
    }
}

impl std::io::Write for StrongHasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_id_matches_git() {
        // `printf hello | git hash-object --stdin`
        let oid = NativeHasher::object_id(HashAlgorithm::Sha1, "blob", b"hello").unwrap();
        assert_eq!(oid.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }

    #[test]
    fn empty_blob_id() {
        let oid = NativeHasher::object_id(HashAlgorithm::Sha1, "blob", b"").unwrap();
        assert_eq!(oid.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn sha512_empty_vector() {
        assert_eq!(
            StrongHasher::hex_digest(DigestAlgorithm::Sha512, b""),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn sha256_abc_vector() {
        assert_eq!(
            StrongHasher::hex_digest(DigestAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn incremental_equals_one_shot() {
        let mut h = StrongHasher::new(DigestAlgorithm::Sha512);
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(
            h.finalize_hex(),
            StrongHasher::hex_digest(DigestAlgorithm::Sha512, b"hello world")
        );
    }

    #[test]
    fn write_impl_feeds_hasher() {
        use std::io::Write;
        let mut h = StrongHasher::new(DigestAlgorithm::Sha256);
        h.write_all(b"abc").unwrap();
        assert_eq!(h.algorithm(), DigestAlgorithm::Sha256);
        assert_eq!(
            h.finalize_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
