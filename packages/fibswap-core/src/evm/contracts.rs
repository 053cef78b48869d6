//! TokenPool and ERC20 contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Only the surface
//! the swap flow touches is declared.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// Per-chain token pool (holds liquidity, sends cross-chain transfers)
    #[sol(rpc)]
    contract TokenPool {
        // ========================================================================
        // Read Methods
        // ========================================================================

        /// Whether the pool accepts this token
        function isSupported(address token) external view returns (bool);

        /// Base fee charged by the pool for a transfer of `amount`
        function calculateFee(uint256 amount) external view returns (uint256);

        /// Messaging-layer fee for relaying a transfer to `_dstChainId`
        function estimateSendFee(
            uint16 _dstChainId,
            address _toAddress,
            uint256 _amount,
            bool _useZro,
            bytes calldata _adapterParams
        ) external view returns (uint256 nativeFee, uint256 zroFee);

        /// Upper bound for a single transfer
        function maxTransactionAmount() external view returns (uint256);

        /// Pool liquidity for a token
        function getTokenBalance(address token) external view returns (uint256);

        /// Emergency pause flag
        function paused() external view returns (bool);

        // ========================================================================
        // Write Methods
        // ========================================================================

        /// Send tokens to another chain; msg.value pays the messaging fee
        function sendTokens(
            uint16 _dstChainId,
            address _toAddress,
            address _token,
            uint256 _amount,
            address _refundAddress,
            address _zroPaymentAddress,
            bytes calldata _adapterParams
        ) external payable;

        // ========================================================================
        // Events
        // ========================================================================

        event TokensSent(
            address indexed token,
            address indexed from,
            address indexed to,
            uint256 amount,
            uint16 dstChainId
        );

        event TokensReceived(
            address indexed token,
            address indexed from,
            address indexed to,
            uint256 amount,
            uint16 srcChainId
        );

        event BaseFeeUpdated(uint256 newFeePercent);

        event Paused(address account);
    }

    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
