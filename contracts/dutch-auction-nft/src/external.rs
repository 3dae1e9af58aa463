use commons::{CustomContractError, Token};
use concordium_std::*;

/// Type of the parameter to the `init` function.
#[derive(Debug, Serialize, SchemaType)]
pub struct InitParameter {
    /// Floor price. The auction can never settle below this amount.
    pub reserve_price: Amount,
    /// Number of steps the auction stays open.
    pub duration_steps: u64,
    /// Amount the price falls on every elapsed step.
    pub price_decrement: Amount,
    /// Wall-clock length of one step.
    pub step_length: Duration,
    /// The collectible being sold.
    pub collectible: Token,
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
            .micro_ccd
            .checked_mul(self.duration_steps)
            .and_then(|raise| raise.checked_add(self.reserve_price.micro_ccd))
            .ok_or(CustomContractError::PriceOverflow)?;
        Ok(())
    }
}
