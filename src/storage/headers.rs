//! Flat-file header store.
//!
//! Headers live in a single file, one 112-byte record per height, record `i`
//! at byte offset `i * 112`, with no surrounding metadata. Appends go through
//! [`HeaderStore::connect`], which validates the whole batch before a single
//! byte is written. A batch that starts below the current tip overwrites the
//! stale suffix and truncates the file; that is the only rollback primitive.
//!
//! All mutation is serialized through one scoped async lock. Reads take no
//! lock: they may see a length that lags an in-flight write, but never a torn
//! record, because the cached length only advances after write and truncate
//! have completed.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::chain::ChainParams;
use crate::error::{Result, SpvError, StorageError, StorageResult, ValidationError};
use crate::event_bus::{EventBus, EventReceiver};
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::types::ChainEvent;
use crate::validation::{HeaderBatch, HeaderChainValidator, Validator};

const LENGTH_UNKNOWN: u64 = u64::MAX;

/// Validated, append-only store for the header chain of one network.
#[derive(Debug)]
pub struct HeaderStore {
    path: PathBuf,
    params: ChainParams,
    validator: HeaderChainValidator,
    /// Header count, derived from the file size. `LENGTH_UNKNOWN` forces a
    /// recomputation on next access.
    cached_length: AtomicU64,
    write_lock: Mutex<()>,
    events: EventBus<ChainEvent>,
}

impl HeaderStore {
    /// Open the store at `path`, creating an empty file (and any missing
    /// parent directories) on first use.
    pub async fn new(path: impl Into<PathBuf>, params: ChainParams) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::OpenOptions::new().write(true).create(true).open(&path).await?;

        let store = Self {
            path,
            params,
            validator: HeaderChainValidator::new(params),
            cached_length: AtomicU64::new(LENGTH_UNKNOWN),
            write_lock: Mutex::new(()),
            events: EventBus::default(),
        };
        store.refresh_length().await?;
        Ok(store)
    }

    /// Consensus parameters this store validates against.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Number of headers in the store.
    pub async fn length(&self) -> StorageResult<u32> {
        match self.cached_length.load(Ordering::Acquire) {
            LENGTH_UNKNOWN => self.refresh_length().await,
            len => Ok(len as u32),
        }
    }

    /// Re-derive the header count from the actual file size.
    async fn refresh_length(&self) -> StorageResult<u32> {
        let bytes = tokio::fs::metadata(&self.path).await?.len();
        if bytes % HEADER_SIZE as u64 != 0 {
            return Err(StorageError::Corruption(format!(
                "header file size {} is not a multiple of the {}-byte record size",
                bytes, HEADER_SIZE
            )));
        }
        let len = bytes / HEADER_SIZE as u64;
        self.cached_length.store(len, Ordering::Release);
        Ok(len as u32)
    }

    /// Raw 112-byte record at `height`, or `None` when out of range.
    pub async fn read_raw(&self, height: u32) -> StorageResult<Option<[u8; HEADER_SIZE]>> {
        if height >= self.length().await? {
            return Ok(None);
        }

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut file = std::fs::File::open(&path)?;
            file.seek(SeekFrom::Start(u64::from(height) * HEADER_SIZE as u64))?;
            let mut buf = [0u8; HEADER_SIZE];
            match file.read_exact(&mut buf) {
                Ok(()) => Ok(Some(buf)),
                // The file shrank under a stale cached length: report absence.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
                Err(e) => Err(StorageError::Io(e)),
            }
        })
        .await
        .map_err(|e| StorageError::ReadFailed(format!("task join error: {}", e)))?
    }

    /// Decoded header at `height`, or `None` when out of range.
    pub async fn read_header(&self, height: u32) -> StorageResult<Option<BlockHeader>> {
        match self.read_raw(height).await? {
            Some(raw) => Ok(Some(BlockHeader::deserialize(height, &raw)?)),
            None => Ok(None),
        }
    }

    /// The highest stored header, or `None` for an empty store.
    pub async fn tip(&self) -> StorageResult<Option<BlockHeader>> {
        match self.length().await? {
            0 => Ok(None),
            len => self.read_header(len - 1).await,
        }
    }

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> EventReceiver<ChainEvent> {
        self.events.subscribe()
    }

    /// Validate and persist a contiguous run of raw header records starting
    /// at `start`.
    ///
    /// The whole batch is decoded and validated against its predecessors
    /// before any byte is written; the first rejection aborts with the store
    /// untouched. On success the records are written at their byte offsets
    /// and the file is truncated right after the batch, which overwrites any
    /// stale suffix during a reorg. Returns the signed change in header
    /// count, which is also published to subscribers.
    ///
    /// Connecting zero bytes is a no-op: it returns 0 and publishes nothing.
    pub async fn connect(&self, start: u32, raw: Vec<u8>) -> Result<i64> {
        let _guard = self.write_lock.lock().await;

        if raw.is_empty() {
            return Ok(0);
        }
        if raw.len() % HEADER_SIZE != 0 {
            return Err(StorageError::InvalidFormat(format!(
                "batch of {} bytes does not divide into {}-byte records",
                raw.len(),
                HEADER_SIZE
            ))
            .into());
        }

        let old_length = self.length().await?;
        if start > old_length {
            return Err(ValidationError::MissingPredecessor {
                height: start,
            }
            .into());
        }

        let previous = match start {
            0 => None,
            _ => Some(self.stored_header(start - 1).await?),
        };
        let window_anchor = match start {
            0 | 1 => None,
            _ => Some(self.stored_header(start - 2).await?),
        };

        let validator = self.validator.clone();
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<()> {
            let mut headers = Vec::with_capacity(raw.len() / HEADER_SIZE);
            for (index, record) in raw.chunks_exact(HEADER_SIZE).enumerate() {
                headers.push(BlockHeader::deserialize(start + index as u32, record)?);
            }

            validator.validate(HeaderBatch {
                headers: &headers,
                previous: previous.as_ref(),
                window_anchor: window_anchor.as_ref(),
            })?;

            let offset = u64::from(start) * HEADER_SIZE as u64;
            let mut file = OpenOptions::new().write(true).open(&path).map_err(StorageError::Io)?;
            file.seek(SeekFrom::Start(offset)).map_err(StorageError::Io)?;
            file.write_all(&raw).map_err(StorageError::Io)?;
            file.set_len(offset + raw.len() as u64).map_err(StorageError::Io)?;
            file.flush().map_err(StorageError::Io)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::WriteFailed(format!("task join error: {}", e)))?;

        match result {
            Ok(()) => {
                let new_length = self.refresh_length().await?;
                let delta = i64::from(new_length) - i64::from(old_length);
                tracing::info!("saved {} header blocks", delta);
                self.events.emit(ChainEvent::HeadersConnected {
                    delta,
                    height: new_length,
                });
                Ok(delta)
            }
            Err(err) => {
                // A failed write may have touched the file; never trust the
                // cache past that point.
                if matches!(err, SpvError::Storage(_)) {
                    let _ = self.refresh_length().await;
                }
                Err(err)
            }
        }
    }

    /// Read a header the cached length says must exist.
    async fn stored_header(&self, height: u32) -> StorageResult<BlockHeader> {
        self.read_header(height).await?.ok_or_else(|| {
            StorageError::Corruption(format!("stored header at height {} is unreadable", height))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Network;

    #[tokio::test]
    async fn test_new_creates_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers");
        let store =
            HeaderStore::new(&path, ChainParams::for_network(Network::Regtest)).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.length().await.unwrap(), 0);
        assert!(store.tip().await.unwrap().is_none());
        assert!(store.read_raw(0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers");
        let params = ChainParams::for_network(Network::Regtest);

        {
            HeaderStore::new(&path, params).await.unwrap();
        }
        let store = HeaderStore::new(&path, params).await.unwrap();
        assert_eq!(store.length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_record_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers");
        tokio::fs::write(&path, vec![0u8; HEADER_SIZE + 1]).await.unwrap();

        let err = HeaderStore::new(&path, ChainParams::for_network(Network::Regtest))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Corruption(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_unaligned_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = HeaderStore::new(
            dir.path().join("headers"),
            ChainParams::for_network(Network::Regtest),
        )
        .await
        .unwrap();

        let err = store.connect(0, vec![0u8; 100]).await.unwrap_err();
        assert!(matches!(err, SpvError::Storage(StorageError::InvalidFormat(_))));
        assert_eq!(store.length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_beyond_tip_is_missing_predecessor() {
        let dir = tempfile::tempdir().unwrap();
        let store = HeaderStore::new(
            dir.path().join("headers"),
            ChainParams::for_network(Network::Regtest),
        )
        .await
        .unwrap();

        let err = store.connect(5, vec![0u8; HEADER_SIZE]).await.unwrap_err();
        assert!(matches!(
            err,
            SpvError::Validation(ValidationError::MissingPredecessor { height: 5 })
        ));
    }
}
