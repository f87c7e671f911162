//! Verification-key storage.
//!
//! Verification keys are written once, when a sidechain is registered,
//! and read every time one of its certificates is verified. Files are
//! raw key bytes with no framing.
//!
//! All file accesses, reads included, are serialized by one process-wide
//! lock ([`io_lock`]). The lock is coarse: it covers every path, not just
//! the one being touched. Keys are never rewritten in normal operation,
//! so finer-grained locking would buy little.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::types::{ScVk, SidechainId};

/// File name of the withdrawal-certificate key inside a sidechain directory.
pub const W_CERT_VK_FILE: &str = "wcert.vk";

static SC_PARAMS_IO: Mutex<()> = Mutex::new(());

/// Acquires the process-wide lock guarding sidechain parameter files.
///
/// The lock protects no data of its own, so a poisoned lock is simply
/// taken over.
pub fn io_lock() -> MutexGuard<'static, ()> {
    SC_PARAMS_IO
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Storage-level error type.
#[derive(Debug)]
pub enum StoreError {
    /// Opening, reading, writing or syncing `path` failed.
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Underlying I/O error kind, e.g. to tell a missing file apart.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            StoreError::Io { source, .. } => source.kind(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { op, path, source } => {
                write!(f, "error {op} file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
        }
    }
}

/// Writes `vk` to `path`, replacing any previous content.
///
/// On failure the content of `path` is unspecified.
pub fn save_sc_vk_to_file(path: &Path, vk: &ScVk) -> Result<(), StoreError> {
    let _guard = io_lock();
    write_locked(path, vk).inspect_err(|e| {
        tracing::error!(path = %path.display(), "save_sc_vk_to_file(): {e}");
    })
}

/// Reads the whole content of `path` as a verification key.
pub fn load_sc_vk_from_file(path: &Path) -> Result<ScVk, StoreError> {
    let _guard = io_lock();
    read_locked(path).inspect_err(|e| {
        tracing::error!(path = %path.display(), "load_sc_vk_from_file(): {e}");
    })
}

fn write_locked(path: &Path, vk: &ScVk) -> Result<(), StoreError> {
    let mut file = File::create(path).map_err(|e| StoreError::io("opening", path, e))?;
    file.write_all(vk.as_bytes())
        .map_err(|e| StoreError::io("writing to", path, e))?;
    file.flush()
        .map_err(|e| StoreError::io("flushing", path, e))?;
    file.sync_all()
        .map_err(|e| StoreError::io("syncing", path, e))?;
    Ok(())
}

fn read_locked(path: &Path) -> Result<ScVk, StoreError> {
    let mut file = File::open(path).map_err(|e| StoreError::io("opening", path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| StoreError::io("reading from", path, e))?;
    Ok(ScVk(bytes))
}

/// Directory-backed store laying keys out per sidechain:
/// `<root>/<sidechain id hex>/wcert.vk`.
#[derive(Clone, Debug)]
pub struct VkStore {
    root: PathBuf,
}

impl VkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the withdrawal-certificate key of `sidechain_id`.
    pub fn path_for(&self, sidechain_id: &SidechainId) -> PathBuf {
        self.root
            .join(sidechain_id.as_hash().to_hex())
            .join(W_CERT_VK_FILE)
    }

    /// Persists the key of `sidechain_id`, creating its directory.
    ///
    /// Returns the path written, suitable for
    /// [`SidechainInfo::w_cert_vk_path`](crate::types::SidechainInfo).
    pub fn save(&self, sidechain_id: &SidechainId, vk: &ScVk) -> Result<PathBuf, StoreError> {
        let path = self.path_for(sidechain_id);
        let _guard = io_lock();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                let err = StoreError::io("creating directory for", &path, e);
                tracing::error!(path = %path.display(), "VkStore::save(): {err}");
                err
            })?;
        }
        write_locked(&path, vk).inspect_err(|e| {
            tracing::error!(path = %path.display(), "VkStore::save(): {e}");
        })?;

        tracing::debug!(
            sidechain = %sidechain_id.as_hash().to_hex(),
            bytes = vk.len(),
            "stored wcert verification key"
        );
        Ok(path)
    }

    /// Loads the key of `sidechain_id`.
    pub fn load(&self, sidechain_id: &SidechainId) -> Result<ScVk, StoreError> {
        load_sc_vk_from_file(&self.path_for(sidechain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HASH_LEN, Hash256};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_roundtrips_bytes() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("vk.bin");
        // Include whitespace-valued bytes; they must survive untouched.
        let vk = ScVk(vec![0x00, 0x20, 0x0A, 0x09, 0xFF, 0x0D, 0x7F]);

        save_sc_vk_to_file(&path, &vk).expect("save vk");
        let loaded = load_sc_vk_from_file(&path).expect("load vk");

        assert_eq!(loaded, vk);
    }

    #[test]
    fn save_overwrites_previous_content() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("vk.bin");

        save_sc_vk_to_file(&path, &ScVk(vec![1u8; 64])).expect("save long vk");
        save_sc_vk_to_file(&path, &ScVk(vec![2u8; 3])).expect("save short vk");

        assert_eq!(load_sc_vk_from_file(&path).expect("load"), ScVk(vec![2u8; 3]));
    }

    #[test]
    fn empty_key_roundtrips() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("empty.vk");

        save_sc_vk_to_file(&path, &ScVk::default()).expect("save empty vk");
        assert!(load_sc_vk_from_file(&path).expect("load").is_empty());
    }

    #[test]
    fn load_missing_file_fails_with_not_found() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = load_sc_vk_from_file(&tmp.path().join("absent.vk")).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("absent.vk"), "unexpected message: {err}");
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("no-such-dir").join("vk.bin");

        assert!(save_sc_vk_to_file(&path, &ScVk(vec![1, 2, 3])).is_err());
    }

    #[test]
    fn vk_store_lays_out_keys_per_sidechain() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = VkStore::new(tmp.path());
        let id = SidechainId(Hash256([0xAB; HASH_LEN]));
        let vk = ScVk(vec![5u8; 40]);

        let path = store.save(&id, &vk).expect("save");

        assert_eq!(path, store.path_for(&id));
        assert!(path.ends_with(W_CERT_VK_FILE));
        assert!(path.starts_with(tmp.path().join(id.as_hash().to_hex())));
        assert_eq!(store.load(&id).expect("load"), vk);
    }

    #[test]
    fn concurrent_saves_and_loads_never_observe_torn_keys() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = Arc::new(VkStore::new(tmp.path()));

        let handles: Vec<_> = (0u8..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let id = SidechainId(Hash256([i; HASH_LEN]));
                    let vk = ScVk(vec![i; 4096]);
                    store.save(&id, &vk).expect("save");
                    assert_eq!(store.load(&id).expect("load"), vk);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("worker thread");
        }
    }
}
