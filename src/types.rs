//! Common type definitions for the LBRY SPV header store.
//!
//! Hash newtypes follow the Bitcoin-family convention: the raw digest bytes
//! are kept in wire order, and only `Display`/`FromStr` use the reversed
//! human-readable hex form.

use std::fmt;
use std::str::FromStr;

macro_rules! hash_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Construct from raw digest bytes in wire order.
            pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// The raw digest bytes in wire order.
            pub const fn to_byte_array(self) -> [u8; 32] {
                self.0
            }

            /// The all-zero hash, used as the predecessor of height 0.
            pub const fn all_zeros() -> Self {
                Self([0u8; 32])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut bytes = self.0;
                bytes.reverse();
                f.write_str(&hex::encode(bytes))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s, &mut bytes)?;
                bytes.reverse();
                Ok(Self(bytes))
            }
        }
    };
}

hash_newtype! {
    /// Double-SHA256 of a header's 112-byte serialization. Links each header
    /// to its successor via `prev_block_hash`.
    BlockHash
}

hash_newtype! {
    /// LBRY proof-of-work hash of a header's serialization. Compared against
    /// the difficulty target, never used for linkage.
    PowHash
}

hash_newtype! {
    /// Merkle commitment to the block's transactions. Opaque to the header
    /// store.
    MerkleRoot
}

hash_newtype! {
    /// Commitment to the LBRY claim trie. Opaque to the header store.
    ClaimTrieRoot
}

/// Events published by the header store after a successful batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A `connect` call wrote to the store. `delta` is the signed change in
    /// header count (negative when a reorg truncated more than it appended),
    /// `height` the new header count.
    HeadersConnected { delta: i64, height: u32 },
}

impl ChainEvent {
    /// Human-readable description for logging.
    pub fn description(&self) -> String {
        match self {
            ChainEvent::HeadersConnected {
                delta,
                height,
            } => {
                format!("HeadersConnected(delta={}, height={})", delta, height)
            }
        }
    }
}
