//! Error types and handling for GameVault

use thiserror::Error;

/// Result type alias for GameVault operations
pub type Result<T> = std::result::Result<T, Error>;

/// GameVault error types
///
/// Every failure is surfaced synchronously to the caller with no state
/// mutation; nothing here is fatal to the system as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    // Authorization errors
    #[error("Caller lacks the required role")]
    Unauthorized,

    #[error("Caller is not the asset owner")]
    NotOwner,

    #[error("Asset is not escrow-approved")]
    NotApproved,

    // State errors
    #[error("Session is not active")]
    NotActive,

    #[error("Session has not ended")]
    NotEnded,

    #[error("Session verification already recorded")]
    AlreadyVerified,

    #[error("Session is not verified")]
    NotVerified,

    #[error("Submitted score does not match the session record")]
    ScoreMismatch,

    #[error("Listing is not active")]
    ListingInactive,

    #[error("Auction already settled")]
    AlreadySettled,

    #[error("Withdrawal already executed")]
    AlreadyExecuted,

    #[error("Withdrawal already approved by this owner")]
    AlreadyApproved,

    #[error("Reward already claimed")]
    AlreadyClaimed,

    // Timing errors
    #[error("Cooldown window still active")]
    CooldownActive,

    #[error("Minimum session duration not reached")]
    TooSoon,

    #[error("Deadline has passed")]
    Expired,

    #[error("Auction is still active")]
    StillActive,

    // Value errors
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient payment for this operation")]
    InsufficientPayment,

    #[error("Bid below the required minimum")]
    BidTooLow,

    #[error("Approval threshold not reached")]
    InsufficientApprovals,

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    // Lookup errors
    #[error("Account not found")]
    AccountNotFound,

    #[error("Asset not found")]
    AssetNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Listing not found")]
    ListingNotFound,

    #[error("Auction not found")]
    AuctionNotFound,

    #[error("Withdrawal request not found")]
    RequestNotFound,

    #[error("Reward claim not found")]
    ClaimNotFound,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}
