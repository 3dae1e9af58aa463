use super::*;

pub type ContractResult<A> = Result<A, ContractError>;

/// Contract token ID type. The registries used with these auctions identify
/// tokens with 32-bit ids.
pub type ContractTokenId = TokenIdU32;

/// Contract token amount type.
pub type ContractTokenAmount = TokenAmountU64;

/// Wrapping the custom errors in a type with CIS-2 errors.
pub type ContractError = Cis2Error<CustomContractError>;

/// Parameter type for the CIS-2 `transfer` function specialized to the token
/// ids and amounts used by these contracts.
pub type TransferParameter = TransferParams<ContractTokenId, ContractTokenAmount>;

/// Parameter type for the CIS-2 function `balanceOf` specialized to the
/// subset of TokenIDs used by these contracts.
pub type ContractBalanceOfQueryParams = BalanceOfQueryParams<ContractTokenId>;

/// Response type for the CIS-2 function `balanceOf` specialized to the subset
/// of TokenAmounts used by these contracts.
pub type ContractBalanceOfQueryResponse = BalanceOfQueryResponse<ContractTokenAmount>;

/// Handle to a token tracked by an external CIS-2 contract.
#[derive(Debug, Clone, Copy, Serialize, SchemaType, PartialEq, Eq)]
pub struct Token {
    /// Address of the CIS-2 contract tracking the token.
    pub contract: ContractAddress,
    /// Token identifier within that contract.
    pub id: ContractTokenId,
}
