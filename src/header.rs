//! Block header record type and its fixed-size binary codec.
//!
//! Headers are stored as 112-byte records. All integers are little-endian,
//! hashes are in wire order (reversed relative to display hex). The byte
//! layout is consensus-critical; the height is derived from the record's
//! position in the file and never written to disk.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{StorageError, StorageResult};
use crate::types::{BlockHash, ClaimTrieRoot, MerkleRoot, PowHash};

/// Size of one serialized header record in bytes.
pub const HEADER_SIZE: usize = 112;

/// An LBRY block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Protocol version.
    pub version: u32,
    /// Canonical hash of the preceding header; all zeros at height 0.
    pub prev_block_hash: BlockHash,
    /// Merkle commitment to the block's transactions.
    pub merkle_root: MerkleRoot,
    /// Commitment to the claim trie.
    pub claim_trie_root: ClaimTrieRoot,
    /// Block time in seconds since the epoch.
    pub timestamp: u32,
    /// Compact-encoded proof-of-work target.
    pub bits: u32,
    /// Proof-of-work solution.
    pub nonce: u32,
    /// Height in the chain; derived from file position, not serialized.
    pub height: u32,
}

impl BlockHeader {
    /// Serialize into the canonical 112-byte record.
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(&self.prev_block_hash.to_byte_array());
        buf[36..68].copy_from_slice(&self.merkle_root.to_byte_array());
        buf[68..100].copy_from_slice(&self.claim_trie_root.to_byte_array());
        buf[100..104].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[104..108].copy_from_slice(&self.bits.to_le_bytes());
        buf[108..112].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Deserialize a 112-byte record, attaching the height it was read at.
    pub fn deserialize(height: u32, data: &[u8]) -> StorageResult<Self> {
        if data.len() != HEADER_SIZE {
            return Err(StorageError::InvalidFormat(format!(
                "header record must be {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        Ok(BlockHeader {
            version: read_u32(&data[0..4]),
            prev_block_hash: BlockHash::from_byte_array(read_hash(&data[4..36])),
            merkle_root: MerkleRoot::from_byte_array(read_hash(&data[36..68])),
            claim_trie_root: ClaimTrieRoot::from_byte_array(read_hash(&data[68..100])),
            timestamp: read_u32(&data[100..104]),
            bits: read_u32(&data[104..108]),
            nonce: read_u32(&data[108..112]),
            height,
        })
    }

    /// Canonical hash: double SHA256 over the serialized record. Used for
    /// chain linkage, not for the proof-of-work check.
    pub fn block_hash(&self) -> BlockHash {
        BlockHash::from_byte_array(sha256d(&self.serialize()))
    }

    /// LBRY proof-of-work hash over the serialized record:
    /// SHA256d, then SHA512, then RIPEMD160 over each half of the SHA512
    /// output, then SHA256d over the two concatenated digests.
    pub fn pow_hash(&self) -> PowHash {
        let inner = sha256d(&self.serialize());
        let stretched = Sha512::digest(inner);
        let mut joined = [0u8; 40];
        joined[..20].copy_from_slice(&Ripemd160::digest(&stretched[..32]));
        joined[20..].copy_from_slice(&Ripemd160::digest(&stretched[32..]));
        PowHash::from_byte_array(sha256d(&joined))
    }
}

/// Double SHA256: SHA256(SHA256(data)).
fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

fn read_u32(data: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(data);
    u32::from_le_bytes(bytes)
}

fn read_hash(data: &[u8]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(data);
    bytes
}
