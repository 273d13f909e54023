//! Shared helpers for building valid header chains in tests.

#![allow(dead_code)]

use lbry_spv::{
    next_work_required, BlockHash, BlockHeader, ChainParams, ClaimTrieRoot, MerkleRoot,
};

const GENESIS_TIME: u32 = 1_600_000_000;

/// Mine `count` valid headers on top of `ancestors` (which must itself be a
/// valid chain prefix starting at height 0). Returns only the new headers.
///
/// `salt` varies the merkle root so two forks mined from the same prefix
/// produce distinct blocks.
pub fn extend_chain(
    params: &ChainParams,
    ancestors: &[BlockHeader],
    count: usize,
    salt: u8,
) -> Vec<BlockHeader> {
    let mut chain: Vec<BlockHeader> = ancestors.to_vec();
    let mut mined = Vec::with_capacity(count);

    for _ in 0..count {
        let height = chain.len() as u32;
        let prev = chain.last();
        let anchor = match chain.len() {
            0 | 1 => None,
            n => chain.get(n - 2),
        };

        let (bits, target) = next_work_required(params, height, anchor, prev).expect("retarget");
        let prev_block_hash = prev.map(|p| p.block_hash()).unwrap_or_else(BlockHash::all_zeros);
        let timestamp =
            prev.map(|p| p.timestamp + params.target_timespan).unwrap_or(GENESIS_TIME);

        let mut merkle = [0u8; 32];
        merkle[0] = salt;
        merkle[1..5].copy_from_slice(&height.to_le_bytes());
        let mut claim_trie = merkle;
        claim_trie[5] = 0x77;

        let mut header = BlockHeader {
            version: 1,
            prev_block_hash,
            merkle_root: MerkleRoot::from_byte_array(merkle),
            claim_trie_root: ClaimTrieRoot::from_byte_array(claim_trie),
            timestamp,
            bits,
            nonce: 0,
            height,
        };
        while !target.is_met_by(header.pow_hash()) {
            header.nonce += 1;
        }

        chain.push(header.clone());
        mined.push(header);
    }

    mined
}

/// Mine a valid chain of `count` headers from genesis.
pub fn mine_chain(params: &ChainParams, count: usize) -> Vec<BlockHeader> {
    extend_chain(params, &[], count, 0)
}

/// Concatenate the serialized records of `headers`.
pub fn to_raw(headers: &[BlockHeader]) -> Vec<u8> {
    headers.iter().flat_map(|h| h.serialize()).collect()
}
