//! Messenger configuration
//!
//! Contract addresses are resolved once, at construction, by layering caller
//! overrides on top of the chain table in [`crate::chain_constants`].
//!
//! # JSON Schema
//!
//! ```text
//! {
//!   "l1_chain_id": 900,
//!   "l2_chain_id": 901,
//!   "deposit_confirmation_blocks": 2,        // optional
//!   "l1_block_time_seconds": 3,              // optional
//!   "contracts": {                           // optional, any subset
//!     "l1": { "portal": "0x...", "l2_output_oracle": "0x..." },
//!     "l2": { "l2_standard_bridge": "0x..." }
//!   },
//!   "poll_interval_ms": 4000,                // optional
//!   "timeout_ms": 600000                     // optional, unbounded if absent
//! }
//! ```

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::chain_constants::{self, default_l2_contracts, L2ChainId};
use crate::redact::Redacted;

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL uses http/https and has a host component.
pub fn validate_rpc_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    if scheme == "http" {
        tracing::warn!(
            "{} uses unencrypted http:// (use https:// in production)",
            name
        );
    }

    Ok(())
}

// ============================================================================
// Contract Addresses
// ============================================================================

/// L1 contracts used by the messenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Contracts {
    pub portal: Address,
    pub l1_cross_domain_messenger: Address,
    pub l1_standard_bridge: Address,
    pub l2_output_oracle: Address,
}

/// L2 contracts used by the messenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Contracts {
    pub l2_cross_domain_messenger: Address,
    pub l2_standard_bridge: Address,
    pub l2_to_l1_message_passer: Address,
    pub weth9: Address,
}

/// Resolved contract addresses on both chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub l1: L1Contracts,
    pub l2: L2Contracts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct L1ContractOverrides {
    pub portal: Option<Address>,
    pub l1_cross_domain_messenger: Option<Address>,
    pub l1_standard_bridge: Option<Address>,
    pub l2_output_oracle: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct L2ContractOverrides {
    pub l2_cross_domain_messenger: Option<Address>,
    pub l2_standard_bridge: Option<Address>,
    pub l2_to_l1_message_passer: Option<Address>,
    pub weth9: Option<Address>,
}

/// Per-role address overrides, any subset may be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOverrides {
    pub l1: L1ContractOverrides,
    pub l2: L2ContractOverrides,
}

impl ContractOverrides {
    /// Overrides that set every L1 address, as required for chains missing from the table
    pub fn with_l1(l1: L1Contracts) -> Self {
        Self {
            l1: L1ContractOverrides {
                portal: Some(l1.portal),
                l1_cross_domain_messenger: Some(l1.l1_cross_domain_messenger),
                l1_standard_bridge: Some(l1.l1_standard_bridge),
                l2_output_oracle: Some(l1.l2_output_oracle),
            },
            l2: L2ContractOverrides::default(),
        }
    }
}

/// Layer `overrides` on top of the defaults for `l2_chain_id`
///
/// Unknown chains have no L1 defaults, so every L1 address must be overridden.
pub fn resolve_contracts(l2_chain_id: u64, overrides: &ContractOverrides) -> Result<ContractsConfig> {
    let l1_defaults = L2ChainId::from_u64(l2_chain_id).map(|c| c.l1_contracts());
    let l2_defaults = default_l2_contracts();

    let pick = |value: Option<Address>, default: Option<Address>, name: &str| {
        value.or(default).ok_or_else(|| {
            eyre!(
                "cannot get contract {} for unknown L2 chain ID {}, you must provide an address",
                name,
                l2_chain_id
            )
        })
    };

    let l1 = L1Contracts {
        portal: pick(overrides.l1.portal, l1_defaults.map(|c| c.portal), "KromaPortal")?,
        l1_cross_domain_messenger: pick(
            overrides.l1.l1_cross_domain_messenger,
            l1_defaults.map(|c| c.l1_cross_domain_messenger),
            "L1CrossDomainMessenger",
        )?,
        l1_standard_bridge: pick(
            overrides.l1.l1_standard_bridge,
            l1_defaults.map(|c| c.l1_standard_bridge),
            "L1StandardBridge",
        )?,
        l2_output_oracle: pick(
            overrides.l1.l2_output_oracle,
            l1_defaults.map(|c| c.l2_output_oracle),
            "L2OutputOracle",
        )?,
    };

    let l2 = L2Contracts {
        l2_cross_domain_messenger: overrides
            .l2
            .l2_cross_domain_messenger
            .unwrap_or(l2_defaults.l2_cross_domain_messenger),
        l2_standard_bridge: overrides
            .l2
            .l2_standard_bridge
            .unwrap_or(l2_defaults.l2_standard_bridge),
        l2_to_l1_message_passer: overrides
            .l2
            .l2_to_l1_message_passer
            .unwrap_or(l2_defaults.l2_to_l1_message_passer),
        weth9: overrides.l2.weth9.unwrap_or(l2_defaults.weth9),
    };

    Ok(ContractsConfig { l1, l2 })
}

// ============================================================================
// Waiting
// ============================================================================

/// Polling parameters shared by every wait-style operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// `None` waits forever
    pub timeout: Option<Duration>,
    /// Depth a relay receipt must reach before a receipt wait returns
    pub confirmations: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            timeout: None,
            confirmations: 0,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub(crate) fn expired(&self, elapsed: Duration) -> bool {
        self.timeout.map(|t| elapsed >= t).unwrap_or(false)
    }
}

// ============================================================================
// Messenger Configuration
// ============================================================================

fn default_poll_interval_ms() -> u64 {
    4000
}

/// Construction-time configuration for a `CrossChainMessenger`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessengerConfig {
    pub l1_chain_id: u64,
    pub l2_chain_id: u64,
    /// Defaults to the chain table, 0 for unknown chains
    #[serde(default)]
    pub deposit_confirmation_blocks: Option<u64>,
    /// Defaults to the chain table, 1 for unknown chains
    #[serde(default)]
    pub l1_block_time_seconds: Option<u64>,
    #[serde(default)]
    pub contracts: ContractOverrides,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl MessengerConfig {
    pub fn new(l1_chain_id: u64, l2_chain_id: u64) -> Self {
        Self {
            l1_chain_id,
            l2_chain_id,
            deposit_confirmation_blocks: None,
            l1_block_time_seconds: None,
            contracts: ContractOverrides::default(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: None,
        }
    }

    pub fn with_overrides(mut self, contracts: ContractOverrides) -> Self {
        self.contracts = contracts;
        self
    }

    /// Parse a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).wrap_err("Failed to parse messenger config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.l1_chain_id == 0 {
            return Err(eyre!("L1 chain ID is missing or invalid: 0"));
        }
        if self.l2_chain_id == 0 {
            return Err(eyre!("L2 chain ID is missing or invalid: 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(eyre!("poll_interval_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn resolve_contracts(&self) -> Result<ContractsConfig> {
        resolve_contracts(self.l2_chain_id, &self.contracts)
    }

    pub fn deposit_confirmation_blocks(&self) -> u64 {
        self.deposit_confirmation_blocks
            .unwrap_or_else(|| chain_constants::deposit_confirmation_blocks(self.l2_chain_id))
    }

    pub fn l1_block_time_seconds(&self) -> u64 {
        self.l1_block_time_seconds
            .unwrap_or_else(|| chain_constants::l1_block_time_seconds(self.l1_chain_id))
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
            confirmations: 0,
        }
    }
}

// ============================================================================
// RPC Client Configuration
// ============================================================================

/// RPC endpoints and optional signing key for both chains
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub l1_rpc_url: String,
    pub l2_rpc_url: String,
    /// Hex private key used for both chains; read-only clients when absent
    #[serde(default)]
    pub private_key: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("l1_rpc_url", &self.l1_rpc_url)
            .field("l2_rpc_url", &self.l2_rpc_url)
            .field("private_key", &self.private_key.as_ref().map(Redacted))
            .finish()
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        validate_rpc_url(&self.l1_rpc_url, "l1_rpc_url")?;
        validate_rpc_url(&self.l2_rpc_url, "l2_rpc_url")?;
        Ok(())
    }
}
