use super::*;

/// The custom errors the contracts can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Only account addresses can bid (Error code: -4).
    OnlyAccountAddress,
    /// Auction duration or step length is zero (Error code: -5).
    InvalidDuration,
    /// Initial price does not fit into 64 bits (Error code: -6).
    PriceOverflow,
    /// Auction already has an accepted winner (Error code: -7).
    AuctionAlreadyWon,
    /// Auction window has elapsed with no winner (Error code: -8).
    AuctionExpired,
    /// Bid amount below current price (Error code: -9).
    BidTooLow,
    /// Payment leg could not move funds: insufficient balance or spending
    /// authorization (Error code: -10).
    PaymentTransferFailed,
    /// Collectible leg could not move the token: authorization revoked or
    /// ownership changed since verification (Error code: -11).
    CollectibleTransferFailed,
    /// The referenced collectible does not belong to the declared seller
    /// (Error code: -12).
    NotCollectibleOwner,
    /// Collectible ownership was already verified (Error code: -13).
    AlreadyAuthorized,
    /// Collectible ownership has not been verified yet (Error code: -14).
    NotAuthorized,
    /// Collaborator contract returned an incompatible response
    /// (Error code: -15).
    Incompatible,
    /// Failed to invoke a contract (Error code: -16).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -17).
    InvokeTransferError,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to CCD transfers to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}

/// Mapping CustomContractError to ContractError.
impl From<CustomContractError> for ContractError {
    fn from(c: CustomContractError) -> Self {
        Cis2Error::Custom(c)
    }
}
