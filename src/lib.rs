//! LBRY SPV header-chain store.
//!
//! This library is the trust anchor of a simplified-payment-verification
//! (SPV) client: it persists block headers (not full blocks) to a flat
//! binary file and admits a header only after checking, in order, its
//! linkage to the previous header, the independently recomputed difficulty
//! bits, and the proof-of-work hash against the decoded target. Everything
//! built on top — wallet balances, merkle-proof verification — relies on
//! this store never holding an invalid or disconnected header.
//!
//! # Quick Start
//!
//! ```no_run
//! use lbry_spv::{ChainParams, HeaderStore, Network};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = ChainParams::for_network(Network::Mainnet);
//!     let store = HeaderStore::new("./headers", params).await?;
//!
//!     // React to chain growth.
//!     let mut changes = store.subscribe();
//!
//!     // Raw records arrive from the network layer as one contiguous blob.
//!     let raw = std::fs::read("./incoming-headers.bin")?;
//!     let added = store.connect(store.length().await?, raw).await?;
//!     println!("connected {} headers, tip {:?}", added, store.tip().await?);
//!
//!     let event = changes.recv().await?;
//!     println!("{}", event.description());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Validated appends**: a batch is written only if every header in it
//!   reaches the accepted state; failures leave the file untouched
//! - **Reorg primitive**: a batch starting below the tip overwrites the
//!   stale suffix and truncates the file
//! - **Lock-free reads**: only `connect` takes the single writer lock
//! - **Change stream**: broadcast notification after every successful write
//! - **Per-network parameters**: mainnet, testnet, and a regtest variant
//!   that skips the compact-bits range checks

pub mod chain;
pub mod error;
pub mod event_bus;
pub mod header;
pub mod logging;
pub mod pow;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use chain::{ChainParams, Network};
pub use error::{
    LoggingError, LoggingResult, ParseError, Result, SpvError, StorageError, StorageResult,
    ValidationError, ValidationResult,
};
pub use event_bus::{EventBus, EventReceiver};
pub use header::{BlockHeader, HEADER_SIZE};
pub use logging::{init_console_logging, init_logging, LogFileConfig, LoggingConfig, LoggingGuard};
pub use pow::{decode_compact, encode_compact, next_work_required, Target};
pub use storage::HeaderStore;
pub use tracing::level_filters::LevelFilter;
pub use types::{BlockHash, ChainEvent, ClaimTrieRoot, MerkleRoot, PowHash};

/// Current version of the lbry-spv library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
