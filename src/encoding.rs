//! Cross-domain message encoding
//!
//! Message nonces carry a version in their top two bytes:
//!
//! ```text
//! | version (16 bits) | nonce (240 bits) |
//! ```
//!
//! The version selects how a message is encoded for relay. Only version 0 is
//! defined: the calldata of
//! `relayMessage(uint256,address,address,uint256,uint256,bytes)`.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::error::{MessengerError, Result};

sol! {
    function relayMessage(
        uint256 _nonce,
        address _sender,
        address _target,
        uint256 _value,
        uint256 _minGasLimit,
        bytes _message
    );
}

/// Number of bits the version is shifted by inside a versioned nonce
pub const VERSION_SHIFT: usize = 240;

/// Known message encoding versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    V0,
}

impl MessageVersion {
    /// Extract the version from a versioned nonce
    pub fn from_nonce(nonce: U256) -> Result<Self> {
        let (version, _) = decode_versioned_nonce(nonce);
        Self::try_from(version)
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            MessageVersion::V0 => 0,
        }
    }
}

impl TryFrom<u16> for MessageVersion {
    type Error = MessengerError;

    fn try_from(version: u16) -> Result<Self> {
        match version {
            0 => Ok(MessageVersion::V0),
            other => Err(MessengerError::UnsupportedVersion { version: other }),
        }
    }
}

fn nonce_mask() -> U256 {
    U256::MAX >> 16
}

/// Pack a version into the top bits of a nonce
pub fn encode_versioned_nonce(nonce: U256, version: u16) -> U256 {
    (nonce & nonce_mask()) | (U256::from(version) << VERSION_SHIFT)
}

/// Split a versioned nonce into `(version, nonce)`
pub fn decode_versioned_nonce(nonce: U256) -> (u16, U256) {
    let version = (nonce >> VERSION_SHIFT).to::<u16>();
    (version, nonce & nonce_mask())
}

/// Encode a message for relay, dispatching on the version embedded in `nonce`
pub fn encode_cross_domain_message(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    gas_limit: U256,
    data: &Bytes,
) -> Result<Bytes> {
    match MessageVersion::from_nonce(nonce)? {
        MessageVersion::V0 => Ok(encode_cross_domain_message_v0(
            nonce, sender, target, value, gas_limit, data,
        )),
    }
}

/// Version 0 encoding: `relayMessage` calldata
pub fn encode_cross_domain_message_v0(
    nonce: U256,
    sender: Address,
    target: Address,
    value: U256,
    gas_limit: U256,
    data: &Bytes,
) -> Bytes {
    relayMessageCall {
        _nonce: nonce,
        _sender: sender,
        _target: target,
        _value: value,
        _minGasLimit: gas_limit,
        _message: data.clone(),
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, bytes};

    #[test]
    fn test_versioned_nonce_round_trip() {
        let cases = [
            (U256::ZERO, 0u16),
            (U256::from(1u64), 0),
            (U256::from(42u64), 1),
            (U256::from(u64::MAX), 7),
            (U256::MAX >> 16, u16::MAX),
        ];

        for (nonce, version) in cases {
            let encoded = encode_versioned_nonce(nonce, version);
            assert_eq!(decode_versioned_nonce(encoded), (version, nonce));
        }
    }

    #[test]
    fn test_version_lands_in_top_bytes() {
        let encoded = encode_versioned_nonce(U256::from(5u64), 1);
        let bytes = encoded.to_be_bytes::<32>();
        assert_eq!(&bytes[..2], &[0x00, 0x01]);
        assert_eq!(bytes[31], 5);
    }

    #[test]
    fn test_message_version_dispatch() {
        assert_eq!(
            MessageVersion::from_nonce(U256::from(9u64)).unwrap(),
            MessageVersion::V0
        );

        let v1 = encode_versioned_nonce(U256::from(9u64), 1);
        assert_eq!(
            MessageVersion::from_nonce(v1),
            Err(MessengerError::UnsupportedVersion { version: 1 })
        );
    }

    #[test]
    fn test_encode_v0_matches_relay_message_calldata() {
        let encoded = encode_cross_domain_message(
            U256::from(1u64),
            address!("1111111111111111111111111111111111111111"),
            address!("2222222222222222222222222222222222222222"),
            U256::ZERO,
            U256::from(100_000u64),
            &bytes!("deadbeef"),
        )
        .unwrap();

        let expected = hex::decode(concat!(
            "d764ad0b",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000001111111111111111111111111111111111111111",
            "0000000000000000000000002222222222222222222222222222222222222222",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "00000000000000000000000000000000000000000000000000000000000186a0",
            "00000000000000000000000000000000000000000000000000000000000000c0",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "deadbeef00000000000000000000000000000000000000000000000000000000",
        ))
        .unwrap();

        assert_eq!(encoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_encode_unknown_version_fails() {
        let nonce = encode_versioned_nonce(U256::from(1u64), 2);
        let result = encode_cross_domain_message(
            nonce,
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            U256::ZERO,
            &Bytes::new(),
        );
        assert!(matches!(
            result,
            Err(MessengerError::UnsupportedVersion { version: 2 })
        ));
    }
}
