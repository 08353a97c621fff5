use crate::HashError;

/// Native object-id algorithm of a repository (`extensions.objectFormat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-1 (default, 20 bytes).
    #[default]
    Sha1,
    /// SHA-256 (32 bytes).
    Sha256,
}

impl HashAlgorithm {
    /// Length of a raw object id in bytes.
    pub const fn id_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Length of the hex form of an object id.
    pub const fn hex_len(&self) -> usize {
        self.id_len() * 2
    }

    /// Infer the algorithm from the length of a hex object id.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Parse the value of `extensions.objectFormat` / `rev-parse --show-object-format`.
    pub fn from_name(name: &str) -> Result<Self, HashError> {
        match name.trim() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(HashError::UnknownFormat(other.to_string())),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Algorithm of the strong digest computed over a whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha512,
    /// Used only by the legacy archive checksum.
    Sha256,
}

impl DigestAlgorithm {
    /// Length of the finished digest in bytes.
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha512 => 64,
            Self::Sha256 => 32,
        }
    }

    /// Length of the lowercase hex rendering.
    pub const fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    /// Tag used in digest line prefixes (`SHA512`, `SHA256`).
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Sha512 => "SHA512",
            Self::Sha256 => "SHA256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lengths() {
        assert_eq!(HashAlgorithm::Sha1.id_len(), 20);
        assert_eq!(HashAlgorithm::Sha256.hex_len(), 64);
    }

    #[test]
    fn default_is_sha1() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha1);
    }

    #[test]
    fn from_name_trims_output() {
        assert_eq!(HashAlgorithm::from_name("sha256\n").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::from_name("sha1").unwrap(), HashAlgorithm::Sha1);
        assert!(matches!(
            HashAlgorithm::from_name("md5"),
            Err(HashError::UnknownFormat(name)) if name == "md5"
        ));
    }

    #[test]
    fn from_hex_len() {
        assert_eq!(HashAlgorithm::from_hex_len(40), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_hex_len(64), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::from_hex_len(41), None);
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha512.hex_len(), 128);
        assert_eq!(DigestAlgorithm::Sha256.output_len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.to_string(), "SHA512");
    }
}
