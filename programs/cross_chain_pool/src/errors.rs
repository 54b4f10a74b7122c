//! Error codes returned by the pool core and the program instructions.

use anchor_lang::prelude::*;

#[error_code]
pub enum PoolError {
    #[msg("Pool is paused")]
    Paused,

    #[msg("Unauthorized: owner required")]
    UnauthorizedOwner,

    #[msg("Unauthorized: relayer required")]
    UnauthorizedRelayer,

    #[msg("State-mutating call already in progress")]
    ReentrantCall,

    #[msg("Asset is not supported")]
    AssetNotSupported,

    #[msg("Amount is outside the asset's cap range")]
    AmountOutOfCapRange,

    #[msg("Receiver must not be the zero address")]
    ZeroReceiver,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Transfer already processed")]
    AlreadyProcessed,

    #[msg("Fingerprint does not match transfer fields")]
    FingerprintMismatch,

    #[msg("Transfer amount exceeds current free liquidity")]
    InsufficientBalance,

    #[msg("Reserve cannot cover the requested transfer")]
    InsufficientReserve,

    #[msg("Fees exceed the transfer amount")]
    FeeExceedsAmount,

    #[msg("Fee curve denominator is zero")]
    DegenerateFeeCurve,

    #[msg("Nothing to withdraw")]
    NothingToWithdraw,

    #[msg("Min cap must be strictly below max cap")]
    InvalidCapRange,

    #[msg("Fee parameters must satisfy 0 < equilibrium < max <= 100000")]
    InvalidFeeParameters,

    #[msg("Unknown liquidity position")]
    UnknownPosition,

    #[msg("Caller does not own the liquidity position")]
    NotPositionOwner,

    #[msg("Insufficient free liquidity for removal")]
    InsufficientLiquidity,

    #[msg("Signed permit rejected")]
    PermitRejected,

    #[msg("Token account does not belong to this pool or party")]
    InvalidVaultAccount,

    #[msg("Relayer set is full")]
    TooManyRelayers,

    #[msg("Asset registry is full")]
    TooManyAssets,

    #[msg("Gas fee ledger has no room for another relayer of this asset")]
    GasLedgerFull,

    #[msg("Asset transfer failed")]
    TransferFailed,

    #[msg("Arithmetic overflow")]
    MathOverflow,
}
