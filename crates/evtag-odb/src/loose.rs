use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use evtag_hash::{HashAlgorithm, ObjectId};
use evtag_object::{header, RawObject};
use flate2::read::ZlibDecoder;

use crate::StoreError;

/// Reader for the `objects/xx/yyyy...` zlib files of a repository.
pub struct LooseStore {
    objects_dir: PathBuf,
    hash_algo: HashAlgorithm,
}

impl LooseStore {
    pub fn open(objects_dir: impl AsRef<Path>, hash_algo: HashAlgorithm) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            hash_algo,
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn hash_algo(&self) -> HashAlgorithm {
        self.hash_algo
    }

    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir.join(id.loose_path())
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Read a loose object.
    ///
    /// Returns `Ok(None)` if there is no loose file for `id` (it may still be
    /// packed). A file that exists but does not decode is an error.
    pub fn read(&self, id: &ObjectId) -> Result<Option<RawObject>, StoreError> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut decompressed = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut decompressed)
            .map_err(|e| StoreError::Corrupt {
                id: *id,
                reason: format!("zlib: {e}"),
            })?;

        let (kind, size, header_len) =
            header::parse(&decompressed).map_err(|e| StoreError::Corrupt {
                id: *id,
                reason: e.to_string(),
            })?;
        let payload = decompressed.split_off(header_len);
        if payload.len() as u64 != size {
            return Err(StoreError::Corrupt {
                id: *id,
                reason: format!("header says {size} bytes, found {}", payload.len()),
            });
        }

        tracing::trace!(%id, %kind, size, "read loose object");
        Ok(Some(RawObject::new(kind, payload)))
    }
}
