//! Known chains and their default contract deployments
//!
//! Consumed once by [`crate::config::MessengerConfig`]; callers can override
//! any address there.

use alloy::primitives::{address, Address};

use crate::config::{ContractsConfig, L1Contracts, L2Contracts};

/// Supported L1 chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L1ChainId {
    Sepolia = 11155111,
    LocalDevnet = 900,
}

/// Supported L2 chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L2ChainId {
    KromaSepolia = 2358,
    KromaLocalDevnet = 901,
}

impl L1ChainId {
    pub fn from_u64(chain_id: u64) -> Option<Self> {
        match chain_id {
            11155111 => Some(L1ChainId::Sepolia),
            900 => Some(L1ChainId::LocalDevnet),
            _ => None,
        }
    }

    /// Average block time in seconds
    pub fn block_time_seconds(&self) -> u64 {
        match self {
            L1ChainId::Sepolia => 12,
            L1ChainId::LocalDevnet => 3,
        }
    }
}

impl L2ChainId {
    pub fn from_u64(chain_id: u64) -> Option<Self> {
        match chain_id {
            2358 => Some(L2ChainId::KromaSepolia),
            901 => Some(L2ChainId::KromaLocalDevnet),
            _ => None,
        }
    }

    /// L1 blocks a deposit needs before the L2 derivation picks it up
    pub fn deposit_confirmation_blocks(&self) -> u64 {
        match self {
            // 2 epochs
            L2ChainId::KromaSepolia => 4,
            L2ChainId::KromaLocalDevnet => 2,
        }
    }

    /// Default L1 deployment for this L2
    pub fn l1_contracts(&self) -> L1Contracts {
        match self {
            L2ChainId::KromaSepolia => L1Contracts {
                portal: address!("16cEb19A3ABF1A8B56f53dB50eb22695b6eF7BcC"),
                l1_cross_domain_messenger: address!("CfE879a845b7bdb1fC51B84F7607fb41044f4004"),
                l1_standard_bridge: address!("B6a9294251FF3a920D7C0204A45B1F7FfE4D2983"),
                l2_output_oracle: address!("B70D7dBa8ac50842820E703C63022Ef52220410B"),
            },
            L2ChainId::KromaLocalDevnet => L1Contracts {
                portal: address!("6900000000000000000000000000000000000003"),
                l1_cross_domain_messenger: address!("6900000000000000000000000000000000000006"),
                l1_standard_bridge: address!("6900000000000000000000000000000000000007"),
                l2_output_oracle: address!("6900000000000000000000000000000000000004"),
            },
        }
    }

    /// Full default deployment for this L2
    pub fn contracts(&self) -> ContractsConfig {
        ContractsConfig {
            l1: self.l1_contracts(),
            l2: default_l2_contracts(),
        }
    }
}

// ============================================================================
// L2 Predeploys
// ============================================================================

pub mod predeploys {
    use super::*;

    pub const WETH9: Address = address!("4200000000000000000000000000000000000001");
    pub const L2_TO_L1_MESSAGE_PASSER: Address =
        address!("4200000000000000000000000000000000000003");
    pub const L2_CROSS_DOMAIN_MESSENGER: Address =
        address!("4200000000000000000000000000000000000004");
    pub const L2_STANDARD_BRIDGE: Address = address!("4200000000000000000000000000000000000009");
}

/// L2 contracts live at the same predeploy addresses on every chain
pub fn default_l2_contracts() -> L2Contracts {
    L2Contracts {
        l2_cross_domain_messenger: predeploys::L2_CROSS_DOMAIN_MESSENGER,
        l2_standard_bridge: predeploys::L2_STANDARD_BRIDGE,
        l2_to_l1_message_passer: predeploys::L2_TO_L1_MESSAGE_PASSER,
        weth9: predeploys::WETH9,
    }
}

/// Deposit confirmation depth for an L2 chain id, 0 when unknown
pub fn deposit_confirmation_blocks(l2_chain_id: u64) -> u64 {
    L2ChainId::from_u64(l2_chain_id)
        .map(|c| c.deposit_confirmation_blocks())
        .unwrap_or(0)
}

/// Average block time for an L1 chain id, 1 when unknown
pub fn l1_block_time_seconds(l1_chain_id: u64) -> u64 {
    L1ChainId::from_u64(l1_chain_id)
        .map(|c| c.block_time_seconds())
        .unwrap_or(1)
}
