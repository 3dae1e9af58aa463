use commons::{ContractTokenAmount, CustomContractError, Token};
use concordium_std::*;

/// Type of the parameter to the `init` function.
#[derive(Debug, Serialize, SchemaType)]
pub struct InitParameter {
    /// Floor price, in units of the payment token.
    pub reserve_price: ContractTokenAmount,
    /// Number of steps the auction stays open.
    pub duration_steps: u64,
    /// Token amount the price falls on every elapsed step.
    pub price_decrement: ContractTokenAmount,
    /// Wall-clock length of one step.
    pub step_length: Duration,
    /// The collectible being sold.
    pub collectible: Token,
    /// The fungible token the payment leg settles in.
    pub payment_token: Token,
}

impl InitParameter {
    /// Reject parameter combinations that can never form a valid auction.
    pub fn validate(&self) -> Result<(), CustomContractError> {
        ensure!(self.duration_steps > 0, CustomContractError::InvalidDuration);
        ensure!(
            self.step_length.millis() > 0,
            CustomContractError::InvalidDuration
        );
        self.price_decrement
            .0
            .checked_mul(self.duration_steps)
            .and_then(|raise| raise.checked_add(self.reserve_price.0))
            .ok_or(CustomContractError::PriceOverflow)?;
        Ok(())
    }
}

/// Type of the parameter to the `bid` function.
#[derive(Debug, Serialize, SchemaType)]
pub struct BidParameter {
    /// The offered token amount. Accepted if at least the current price.
    pub amount: ContractTokenAmount,
}
