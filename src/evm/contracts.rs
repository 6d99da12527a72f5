//! Kroma contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the L1 and L2
//! contracts the messenger talks to.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// L1CrossDomainMessenger and L2CrossDomainMessenger share this interface
    #[sol(rpc)]
    contract CrossDomainMessenger {
        event SentMessage(
            address indexed target,
            address sender,
            bytes message,
            uint256 messageNonce,
            uint256 value,
            uint256 gasLimit
        );

        event RelayedMessage(bytes32 indexed msgHash);

        event FailedRelayedMessage(bytes32 indexed msgHash);

        function sendMessage(address _target, bytes _message, uint32 _minGasLimit) external payable;

        function relayMessage(
            uint256 _nonce,
            address _sender,
            address _target,
            uint256 _value,
            uint256 _minGasLimit,
            bytes _message
        ) external payable;

        function messageNonce() external view returns (uint256);
    }
}

sol! {
    /// L2 predeploy that records every withdrawal
    #[sol(rpc)]
    contract L2ToL1MessagePasser {
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        function sentMessages(bytes32 withdrawalHash) external view returns (bool);
    }
}

sol! {
    /// L1 contract that proves and finalizes withdrawals
    #[sol(rpc)]
    contract KromaPortal {
        struct WithdrawalTransaction {
            uint256 nonce;
            address sender;
            address target;
            uint256 value;
            uint256 gasLimit;
            bytes data;
        }

        struct OutputRootProof {
            bytes32 version;
            bytes32 stateRoot;
            bytes32 messagePasserStorageRoot;
            bytes32 latestBlockhash;
        }

        function provenWithdrawals(bytes32 withdrawalHash)
            external
            view
            returns (bytes32 outputRoot, uint128 timestamp, uint128 l2BlockNumber);

        function finalizedWithdrawals(bytes32 withdrawalHash) external view returns (bool);

        function proveWithdrawalTransaction(
            WithdrawalTransaction _tx,
            uint256 _l2OutputIndex,
            OutputRootProof _outputRootProof,
            bytes[] _withdrawalProof
        ) external;

        function finalizeWithdrawalTransaction(WithdrawalTransaction _tx) external;
    }
}

sol! {
    /// L1 contract holding published L2 output roots
    #[sol(rpc)]
    contract L2OutputOracle {
        struct CheckpointOutput {
            address submitter;
            bytes32 outputRoot;
            uint128 timestamp;
            uint128 l2BlockNumber;
        }

        function FINALIZATION_PERIOD_SECONDS() external view returns (uint256);

        function latestBlockNumber() external view returns (uint256);

        function getL2OutputIndexAfter(uint256 _l2BlockNumber) external view returns (uint256);

        function getL2Output(uint256 _l2OutputIndex) external view returns (CheckpointOutput);
    }
}

sol! {
    /// L1StandardBridge and L2StandardBridge share this interface
    #[sol(rpc)]
    contract StandardBridge {
        event ETHBridgeInitiated(
            address indexed from,
            address indexed to,
            uint256 amount,
            bytes extraData
        );

        event ERC20BridgeInitiated(
            address indexed localToken,
            address indexed remoteToken,
            address indexed from,
            address to,
            uint256 amount,
            bytes extraData
        );

        function bridgeETH(uint32 _minGasLimit, bytes _extraData) external payable;

        function bridgeETHTo(address _to, uint32 _minGasLimit, bytes _extraData) external payable;

        function bridgeERC20(
            address _localToken,
            address _remoteToken,
            uint256 _amount,
            uint32 _minGasLimit,
            bytes _extraData
        ) external;

        function bridgeERC20To(
            address _localToken,
            address _remoteToken,
            address _to,
            uint256 _amount,
            uint32 _minGasLimit,
            bytes _extraData
        ) external;
    }
}

sol! {
    /// Bridged token on L2, also covers the ERC20 calls needed on L1
    #[sol(rpc)]
    contract KromaMintableERC20 {
        function REMOTE_TOKEN() external view returns (address);

        function BRIDGE() external view returns (address);

        function allowance(address owner, address spender) external view returns (uint256);

        function approve(address spender, uint256 amount) external returns (bool);

        function balanceOf(address account) external view returns (uint256);
    }
}
