//! Per-network consensus parameters for the header chain.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::pow::Target;

/// The LBRY networks this store can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Canonical chain name, as used in configuration files.
    pub fn chain_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "lbrycrd_main",
            Network::Testnet => "lbrycrd_testnet",
            Network::Regtest => "lbrycrd_regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chain_name())
    }
}

impl FromStr for Network {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lbrycrd_main" => Ok(Network::Mainnet),
            "lbrycrd_testnet" => Ok(Network::Testnet),
            "lbrycrd_regtest" => Ok(Network::Regtest),
            other => Err(ParseError::UnknownChain(other.to_string())),
        }
    }
}

/// Consensus parameters governing header validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Which network these parameters describe.
    pub network: Network,
    /// Proof-of-work limit; no target may exceed it.
    pub max_target: Target,
    /// Compact bits carried by the genesis header.
    pub genesis_bits: u32,
    /// Seconds one retarget window is expected to span.
    pub target_timespan: u32,
    /// Whether `bits` exponent/mantissa range checks run during retarget
    /// computation. Disabled on regtest, which mines with arbitrary bits.
    pub enforce_bits_range: bool,
    /// Display-form hash of the network's genesis block.
    pub genesis_hash: &'static str,
}

impl ChainParams {
    /// Parameters for the given network.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => ChainParams {
                network,
                max_target: Target::from_words(u128::MAX >> 16, u128::MAX),
                genesis_bits: 0x1f00ffff,
                target_timespan: 150,
                enforce_bits_range: true,
                genesis_hash: "9c89283ba0f3227f6c03b70216b9f665f0118d5e0fa729cedf4fb34d6a34f463",
            },
            Network::Testnet => ChainParams {
                network,
                max_target: Target::from_words(u128::MAX >> 16, u128::MAX),
                genesis_bits: 0x1f00ffff,
                target_timespan: 150,
                enforce_bits_range: true,
                genesis_hash: "9c89283ba0f3227f6c03b70216b9f665f0118d5e0fa729cedf4fb34d6a34f463",
            },
            Network::Regtest => ChainParams {
                network,
                max_target: Target::from_words(u128::MAX >> 1, u128::MAX),
                genesis_bits: 0x207fffff,
                target_timespan: 1,
                enforce_bits_range: false,
                genesis_hash: "6e3fcf1299d4ec5d79c3a4c91d624a4acf9e2e173d95a1a0504f677669687556",
            },
        }
    }

    /// Parameters for mainnet.
    pub fn mainnet() -> Self {
        Self::for_network(Network::Mainnet)
    }

    /// Parameters for testnet.
    pub fn testnet() -> Self {
        Self::for_network(Network::Testnet)
    }

    /// Parameters for regtest.
    pub fn regtest() -> Self {
        Self::for_network(Network::Regtest)
    }
}
