use commons::{ContractResult, CustomContractError};
use concordium_std::*;

use crate::events::*;
use crate::external::InitParameter;
use crate::state::State;

/// Init function that creates a new auction.
///
/// The init origin becomes the seller; all price parameters are fixed for the
/// lifetime of the instance and the clock starts at the creation slot time.
#[init(contract = "DutchAuction", parameter = "InitParameter")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    _state_builder: &mut StateBuilder<S>,
) -> InitResult<State> {
    let parameter: InitParameter = ctx.parameter_cursor().get()?;
    parameter.validate()?;
    Ok(State::new(
        ctx.init_origin(),
        ctx.metadata().slot_time(),
        &parameter,
    ))
}

/// Receive function for bids. The attached CCD is the bid amount; on
/// acceptance it is forwarded to the seller in full and the auction becomes
/// terminal. A bid exactly equal to the current price is accepted.
#[receive(
    mutable,
    payable,
    contract = "DutchAuction",
    name = "bid",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let bidder = match ctx.sender() {
        Address::Account(account) => account,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let now = ctx.metadata().slot_time();

    let state = host.state_mut();
    state.accept_bid(bidder, amount, now)?;
    let seller = state.seller;

    logger.log(&DutchAuctionEvent::Settle(SettleEvent {
        winner: bidder,
        price: amount,
    }))?;

    // Payment leg: the whole attached amount goes straight to the seller.
    host.invoke_transfer(&seller, amount)?;

    Ok(())
}

/// View function that returns the entire auction state.
#[receive(contract = "DutchAuction", name = "view", return_value = "State")]
fn contract_view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<State> {
    Ok(host.state().clone())
}

/// Price at the current slot time. Read-only and callable forever; from the
/// expiry step onward it returns exactly the reserve price.
#[receive(
    contract = "DutchAuction",
    name = "currentPrice",
    return_value = "Amount"
)]
fn contract_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<Amount> {
    Ok(host.state().current_price(ctx.metadata().slot_time()))
}

/// The constant price at step zero.
#[receive(
    contract = "DutchAuction",
    name = "initialPrice",
    return_value = "Amount"
)]
fn contract_initial_price<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<Amount> {
    Ok(host.state().initial_price())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use core::fmt::Debug;
    use test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([0u8; 32]);
    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);

    const RESERVE_PRICE: Amount = Amount::from_micro_ccd(500);
    const DURATION_STEPS: u64 = 10;
    const PRICE_DECREMENT: Amount = Amount::from_micro_ccd(50);
    const STEP_MILLIS: u64 = 60_000;

    fn auction_parameter() -> InitParameter {
        InitParameter {
            reserve_price: RESERVE_PRICE,
            duration_steps: DURATION_STEPS,
            price_decrement: PRICE_DECREMENT,
            step_length: Duration::from_millis(STEP_MILLIS),
        }
    }

    /// Slot time at which exactly `step` whole steps have elapsed.
    fn at_step(step: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(step * STEP_MILLIS)
    }

    fn init_with(parameter: &InitParameter) -> InitResult<State> {
        let parameter_bytes = to_bytes(parameter);
        let mut ctx = TestInitContext::empty();
        ctx.set_parameter(&parameter_bytes);
        ctx.set_init_origin(SELLER);
        ctx.set_metadata_slot_time(at_step(0));
        let mut state_builder = TestStateBuilder::new();
        contract_init(&ctx, &mut state_builder)
    }

    fn new_host() -> TestHost<State> {
        let state = init_with(&auction_parameter()).expect("Initialization should succeed");
        TestHost::new(state, TestStateBuilder::new())
    }

    fn receive_ctx<'a>(sender: AccountAddress, slot_time: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_owner(SELLER);
        ctx.set_metadata_slot_time(slot_time);
        ctx
    }

    fn expect_error<E, T>(expr: Result<T, E>, err: E, msg: &str)
    where
        E: Eq + Debug,
        T: Debug,
    {
        let actual = expr.expect_err(msg);
        assert_eq!(actual, err);
    }

    #[concordium_test]
    fn test_init() {
        let state = init_with(&auction_parameter()).expect("Initialization should succeed");

        claim_eq!(state.seller, SELLER, "Init origin should become the seller");
        claim_eq!(state.winner, None, "Fresh auction should have no winner");
        claim_eq!(
            state.initial_price(),
            Amount::from_micro_ccd(1_000),
            "Initial price should be reserve + duration * decrement"
        );
    }

    #[concordium_test]
    fn test_init_rejects_zero_duration() {
        let mut parameter = auction_parameter();
        parameter.duration_steps = 0;

        expect_error(
            init_with(&parameter),
            Reject::from(CustomContractError::InvalidDuration),
            "Zero duration should be rejected",
        );
    }

    #[concordium_test]
    fn test_init_rejects_zero_step_length() {
        let mut parameter = auction_parameter();
        parameter.step_length = Duration::from_millis(0);

        expect_error(
            init_with(&parameter),
            Reject::from(CustomContractError::InvalidDuration),
            "Zero step length should be rejected",
        );
    }

    #[concordium_test]
    fn test_init_rejects_price_overflow() {
        let mut parameter = auction_parameter();
        parameter.price_decrement = Amount::from_micro_ccd(u64::MAX / 2);

        expect_error(
            init_with(&parameter),
            Reject::from(CustomContractError::PriceOverflow),
            "Overflowing initial price should be rejected",
        );
    }

    #[concordium_test]
    fn test_price_decays_per_step() {
        let host = new_host();

        let ctx0 = receive_ctx(ALICE, at_step(0));
        claim_eq!(
            contract_current_price(&ctx0, &host),
            Ok(Amount::from_micro_ccd(1_000))
        );

        let ctx5 = receive_ctx(ALICE, at_step(5));
        claim_eq!(
            contract_current_price(&ctx5, &host),
            Ok(Amount::from_micro_ccd(750)),
            "Price after 5 steps should have fallen by 5 decrements"
        );

        claim_eq!(contract_initial_price(&ctx5, &host), Ok(Amount::from_micro_ccd(1_000)));
    }

    #[concordium_test]
    fn test_price_is_pinned_at_reserve() {
        let host = new_host();

        for step in [DURATION_STEPS, DURATION_STEPS + 1, DURATION_STEPS + 100] {
            let ctx = receive_ctx(ALICE, at_step(step));
            claim_eq!(
                contract_current_price(&ctx, &host),
                Ok(RESERVE_PRICE),
                "Price should stay pinned at the reserve after the window"
            );
        }
    }

    #[concordium_test]
    fn test_price_query_is_idempotent() {
        let host = new_host();

        let ctx = receive_ctx(ALICE, at_step(3));
        let first = contract_current_price(&ctx, &host);
        let second = contract_current_price(&ctx, &host);
        claim_eq!(first, second, "Repeated queries at one step should agree");
    }

    #[concordium_test]
    fn test_rejects_bid_below_price() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let ctx = receive_ctx(ALICE, at_step(5));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(749), &mut logger);

        expect_error(
            result,
            CustomContractError::BidTooLow.into(),
            "One micro CCD below the current price should be rejected",
        );
        claim_eq!(host.state().winner, None, "Rejected bid must not set a winner");
        claim!(host.get_transfers().is_empty(), "No funds should have moved");
    }

    #[concordium_test]
    fn test_accepts_bid_at_exact_price() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        let price = Amount::from_micro_ccd(750);
        host.set_self_balance(price);

        let ctx = receive_ctx(ALICE, at_step(5));
        let result = contract_bid(&ctx, &mut host, price, &mut logger);

        claim_eq!(result, Ok(()), "Bid at exactly the current price should win");
        claim_eq!(host.state().winner, Some(ALICE), "Winner should be the bidder");
        claim!(
            host.transfer_occurred(&SELLER, price),
            "The full bid should reach the seller"
        );
    }

    #[concordium_test]
    fn test_rejects_second_bid_after_win() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        let price = Amount::from_micro_ccd(750);
        host.set_self_balance(price);

        let ctx = receive_ctx(ALICE, at_step(5));
        contract_bid(&ctx, &mut host, price, &mut logger).expect("First bid should win");

        // A later bid loses with AlreadyWon even if it offers far more, and
        // even once the window has elapsed.
        for step in [6, DURATION_STEPS + 5] {
            let ctx = receive_ctx(BOB, at_step(step));
            let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(10_000), &mut logger);
            expect_error(
                result,
                CustomContractError::AuctionAlreadyWon.into(),
                "Only one bid can ever be accepted",
            );
        }
        claim_eq!(host.state().winner, Some(ALICE), "Winner must not change");
    }

    #[concordium_test]
    fn test_rejects_bid_after_expiry() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        // One step past the duration; the offered amount would clear the
        // pinned reserve price, but the window is closed.
        let ctx = receive_ctx(BOB, at_step(DURATION_STEPS + 1));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(10_000), &mut logger);

        expect_error(
            result,
            CustomContractError::AuctionExpired.into(),
            "Bids past the window must be rejected",
        );
        claim_eq!(host.state().winner, None, "Expired auction has no winner");
    }

    #[concordium_test]
    fn test_accepts_reserve_bid_on_expiry_step() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        host.set_self_balance(RESERVE_PRICE);

        // The expiry step itself is still inside the window, at the reserve.
        let ctx = receive_ctx(ALICE, at_step(DURATION_STEPS));
        let result = contract_bid(&ctx, &mut host, RESERVE_PRICE, &mut logger);

        claim_eq!(result, Ok(()), "Reserve-price bid on the last step should win");
        claim_eq!(host.state().winner, Some(ALICE));
    }

    #[concordium_test]
    fn test_rejects_contract_bidders() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let mut ctx = receive_ctx(ALICE, at_step(1));
        ctx.set_sender(Address::Contract(ContractAddress {
            index: 7,
            subindex: 0,
        }));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(1_000), &mut logger);

        expect_error(
            result,
            CustomContractError::OnlyAccountAddress.into(),
            "Contract addresses cannot bid",
        );
    }

    #[concordium_test]
    fn test_view_reflects_state() {
        let host = new_host();
        let ctx = receive_ctx(ALICE, at_step(0));

        let state = contract_view(&ctx, &host).expect("View should succeed");
        claim_eq!(state.reserve_price, RESERVE_PRICE);
        claim_eq!(state.duration_steps, DURATION_STEPS);
        claim_eq!(state.price_decrement, PRICE_DECREMENT);
        claim_eq!(state.winner, None);
    }
}
