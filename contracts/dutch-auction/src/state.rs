use commons::{calculations, CustomContractError};
use concordium_std::*;

use crate::external::InitParameter;

/// The contract state. Everything except `winner` is fixed at creation.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct State {
    /// Account entitled to the payment.
    pub seller: AccountAddress,
    /// Floor price.
    pub reserve_price: Amount,
    /// Number of steps the auction stays open.
    pub duration_steps: u64,
    /// Amount the price falls on every elapsed step.
    pub price_decrement: Amount,
    /// Slot time at which the auction was created.
    pub start: Timestamp,
    /// Wall-clock length of one step.
    pub step_length: Duration,
    /// Winning bidder. Set at most once, by the first accepted bid.
    pub winner: Option<AccountAddress>,
}

impl State {
    pub fn new(seller: AccountAddress, start: Timestamp, parameter: &InitParameter) -> Self {
        Self {
            seller,
            reserve_price: parameter.reserve_price,
            duration_steps: parameter.duration_steps,
            price_decrement: parameter.price_decrement,
            start,
            step_length: parameter.step_length,
            winner: None,
        }
    }

    /// Whole steps elapsed since the start. Not clamped to the duration.
    pub fn elapsed_steps(&self, now: Timestamp) -> u64 {
        calculations::elapsed_steps(self.start, self.step_length, now)
    }

    /// The constant price at step zero.
    pub fn initial_price(&self) -> Amount {
        Amount::from_micro_ccd(calculations::initial_price(
            self.reserve_price.micro_ccd,
            self.price_decrement.micro_ccd,
            self.duration_steps,
        ))
    }

    /// Price at `now`, pinned at exactly the reserve from the expiry step
    /// onward.
    pub fn current_price(&self, now: Timestamp) -> Amount {
        Amount::from_micro_ccd(calculations::current_price(
            self.reserve_price.micro_ccd,
            self.price_decrement.micro_ccd,
            self.duration_steps,
            self.elapsed_steps(now),
        ))
    }

    /// Whether the bidding window has closed. Bids are still accepted on the
    /// expiry step itself, at exactly the reserve price.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        calculations::is_expired(self.elapsed_steps(now), self.duration_steps)
    }

    /// Validate a bid and lock the winner. Does not move any assets; the
    /// caller performs settlement and aborts the call on any failure there.
    ///
    /// The winner check runs before the expiry check: a won auction reports
    /// `AuctionAlreadyWon` no matter how much time has passed.
    pub fn accept_bid(
        &mut self,
        bidder: AccountAddress,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), CustomContractError> {
        ensure!(self.winner.is_none(), CustomContractError::AuctionAlreadyWon);
        ensure!(!self.is_expired(now), CustomContractError::AuctionExpired);
        ensure!(
            amount >= self.current_price(now),
            CustomContractError::BidTooLow
        );
        self.winner = Some(bidder);
        Ok(())
    }
}
