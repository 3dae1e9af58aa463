use commons::{ContractResult, ContractTokenAmount, CustomContractError, HostCis2Ext};
use concordium_std::*;

use crate::events::*;
use crate::external::{BidParameter, InitParameter};
use crate::state::State;

/// Init function that creates a new auction.
///
/// The init origin becomes the seller. Init functions cannot invoke other
/// contracts, so the instance starts unauthorized: ownership of the
/// collectible is verified by `authorize` before any bid can be accepted.
#[init(contract = "DutchAuctionToken", parameter = "InitParameter")]
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

/// Verify that the seller is the registered owner of the collectible and open
/// the auction for bids. Runs at most once.
#[receive(
    mutable,
    contract = "DutchAuctionToken",
    name = "authorize",
    enable_logger
)]
fn contract_authorize<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let state = host.state();
    ensure!(
        !state.authorized,
        CustomContractError::AlreadyAuthorized.into()
    );
    let seller = state.seller;
    let collectible = state.collectible;

    let balance = host.cis2_balance_of(&collectible, seller)?;
    ensure!(
        balance == ContractTokenAmount::from(1),
        CustomContractError::NotCollectibleOwner.into()
    );

    host.state_mut().authorized = true;

    logger.log(&DutchAuctionEvent::Authorize(AuthorizeEvent {
        collectible,
        seller,
    }))?;

    Ok(())
}

/// Receive function for bids. The offered amount is a parameter rather than
/// attached CCD; on acceptance the payment leg pulls it from the bidder over
/// the payment token's `transfer` (which requires the bidder's prior operator
/// grant to this instance), then the collectible moves to the bidder. Any
/// failure aborts the call: a failed payment leaves the auction open as if
/// the bid never happened.
#[receive(
    mutable,
    contract = "DutchAuctionToken",
    name = "bid",
    parameter = "BidParameter",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let parameter: BidParameter = ctx.parameter_cursor().get()?;
    let bidder = match ctx.sender() {
        Address::Account(account) => account,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let now = ctx.metadata().slot_time();

    let state = host.state_mut();
    state.accept_bid(bidder, parameter.amount, now)?;
    let seller = state.seller;
    let collectible = state.collectible;
    let payment_token = state.payment_token;

    logger.log(&DutchAuctionEvent::Settle(SettleEvent {
        collectible,
        winner: bidder,
        price: parameter.amount,
    }))?;

    // Payment leg first: a failed payment must not move the collectible.
    host.cis2_transfer_single(&payment_token, parameter.amount, bidder, seller)
        .map_err(|_| CustomContractError::PaymentTransferFailed)?;

    // Collectible leg: registry transfer from seller to winner.
    host.cis2_transfer_single(&collectible, ContractTokenAmount::from(1), seller, bidder)
        .map_err(|_| CustomContractError::CollectibleTransferFailed)?;

    Ok(())
}

/// View function that returns the entire auction state.
#[receive(contract = "DutchAuctionToken", name = "view", return_value = "State")]
fn contract_view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<State> {
    Ok(host.state().clone())
}

/// Price at the current slot time. Read-only and callable forever; from the
/// expiry step onward it returns exactly the reserve price.
#[receive(
    contract = "DutchAuctionToken",
    name = "currentPrice",
    return_value = "ContractTokenAmount"
)]
fn contract_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<ContractTokenAmount> {
    Ok(host.state().current_price(ctx.metadata().slot_time()))
}

/// The constant price at step zero.
#[receive(
    contract = "DutchAuctionToken",
    name = "initialPrice",
    return_value = "ContractTokenAmount"
)]
fn contract_initial_price<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<ContractTokenAmount> {
    Ok(host.state().initial_price())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::{
        ContractBalanceOfQueryParams, ContractBalanceOfQueryResponse, Token, TransferParameter,
    };
    use concordium_cis2::{Receiver, TokenIdU32, TransferParams};
    use core::fmt::Debug;
    use test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([0u8; 32]);
    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const PAYMENT: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const DURATION_STEPS: u64 = 10;
    const STEP_MILLIS: u64 = 60_000;

    fn reserve_price() -> ContractTokenAmount {
        ContractTokenAmount::from(500)
    }

    fn collectible() -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdU32(42),
        }
    }

    fn payment_token() -> Token {
        Token {
            contract: PAYMENT,
            id: TokenIdU32(0),
        }
    }

    fn auction_parameter() -> InitParameter {
        InitParameter {
            reserve_price: reserve_price(),
            duration_steps: DURATION_STEPS,
            price_decrement: ContractTokenAmount::from(50),
            step_length: Duration::from_millis(STEP_MILLIS),
            collectible: collectible(),
            payment_token: payment_token(),
        }
    }

    /// Slot time at which exactly `step` whole steps have elapsed.
    fn at_step(step: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(step * STEP_MILLIS)
    }

    fn new_host() -> TestHost<State> {
        let parameter_bytes = to_bytes(&auction_parameter());
        let mut ctx = TestInitContext::empty();
        ctx.set_parameter(&parameter_bytes);
        ctx.set_init_origin(SELLER);
        ctx.set_metadata_slot_time(at_step(0));
        let mut state_builder = TestStateBuilder::new();
        let state =
            contract_init(&ctx, &mut state_builder).expect("Initialization should succeed");
        TestHost::new(state, state_builder)
    }

    fn bid_ctx<'a>(
        sender: AccountAddress,
        slot_time: Timestamp,
        parameter_bytes: &'a [u8],
    ) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_owner(SELLER);
        ctx.set_metadata_slot_time(slot_time);
        ctx.set_parameter(parameter_bytes);
        ctx
    }

    fn receive_ctx<'a>(sender: AccountAddress, slot_time: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_owner(SELLER);
        ctx.set_metadata_slot_time(slot_time);
        ctx
    }

    fn bid_parameter(amount: u64) -> Vec<u8> {
        to_bytes(&BidParameter {
            amount: ContractTokenAmount::from(amount),
        })
    }

    /// Mock a registry whose `balanceOf` reports `balance` for every query.
    fn mock_balance_of(host: &mut TestHost<State>, balance: u64) {
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            MockFn::new(move |parameter, _amount, _balance, _state: &mut State| {
                ContractBalanceOfQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                Ok((
                    false,
                    Some(ContractBalanceOfQueryResponse::from(vec![
                        ContractTokenAmount::from(balance),
                    ])),
                ))
            }),
        );
    }

    /// Mock a token contract `transfer` that accepts anything.
    fn mock_transfer_ok(host: &mut TestHost<State>, contract: ContractAddress) {
        host.setup_mock_entrypoint(
            contract,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(|parameter, _amount, _balance, _state: &mut State| {
                TransferParameter::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                Ok((true, Some(())))
            }),
        );
    }

    /// Mock a token contract `transfer` that refuses every transfer, like a
    /// token without the necessary balance or operator grant.
    fn mock_transfer_refusing(host: &mut TestHost<State>, contract: ContractAddress) {
        host.setup_mock_entrypoint(
            contract,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(|_parameter, _amount, _balance, _state: &mut State| {
                Err::<(bool, Option<()>), _>(CallContractError::Trap)
            }),
        );
    }

    /// Mock the payment token `transfer`, trapping unless it moves exactly
    /// `expected` from `from` to `to`.
    fn mock_payment_expecting(
        host: &mut TestHost<State>,
        from: AccountAddress,
        to: AccountAddress,
        expected: u64,
    ) {
        host.setup_mock_entrypoint(
            PAYMENT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(move |parameter, _amount, _balance, _state: &mut State| {
                let TransferParams(transfers) =
                    TransferParameter::deserial(&mut Cursor::new(parameter))
                        .map_err(|_| CallContractError::Trap)?;
                let ok = transfers.len() == 1
                    && transfers[0].from == Address::Account(from)
                    && matches!(&transfers[0].to, Receiver::Account(account) if *account == to)
                    && transfers[0].amount == ContractTokenAmount::from(expected);
                if !ok {
                    return Err(CallContractError::Trap);
                }
                Ok((true, Some(())))
            }),
        );
    }

    fn authorize(host: &mut TestHost<State>) {
        mock_balance_of(host, 1);
        let ctx = receive_ctx(SELLER, at_step(0));
        let mut logger = TestLogger::init();
        contract_authorize(&ctx, host, &mut logger).expect("Authorization should succeed");
        // Commit the state so rollbacks in later calls restore to this point,
        // modeling that authorization happened in its own transaction.
        host.commit_state();
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
        let host = new_host();
        let state = host.state();

        claim_eq!(state.seller, SELLER);
        claim_eq!(state.collectible, collectible());
        claim_eq!(state.payment_token, payment_token());
        claim_eq!(state.winner, None);
        claim!(!state.authorized, "Fresh auction must not be authorized");
    }

    #[concordium_test]
    fn test_authorize_rejects_non_owner_seller() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 0);

        let ctx = receive_ctx(SELLER, at_step(0));
        let result = contract_authorize(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::NotCollectibleOwner.into(),
            "Ownership verification should fail",
        );
    }

    #[concordium_test]
    fn test_rejects_bid_before_authorization() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let parameter_bytes = bid_parameter(1_000);
        let ctx = bid_ctx(ALICE, at_step(0), &parameter_bytes);
        let result = contract_bid(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::NotAuthorized.into(),
            "No bid can be accepted before ownership verification",
        );
        claim_eq!(host.state().winner, None);
    }

    #[concordium_test]
    fn test_winning_bid_pulls_payment_and_moves_collectible() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);
        // Price after 5 steps: 500 + 5 * 50.
        mock_payment_expecting(&mut host, ALICE, SELLER, 750);
        mock_transfer_ok(&mut host, REGISTRY);

        let parameter_bytes = bid_parameter(750);
        let ctx = bid_ctx(ALICE, at_step(5), &parameter_bytes);
        let result = contract_bid(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()), "Bid at the current price should win");
        claim_eq!(host.state().winner, Some(ALICE));
    }

    #[concordium_test]
    fn test_rejects_bid_below_price() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);

        let parameter_bytes = bid_parameter(749);
        let ctx = bid_ctx(ALICE, at_step(5), &parameter_bytes);
        let result = contract_bid(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::BidTooLow.into(),
            "One token below the current price should be rejected",
        );
        claim_eq!(host.state().winner, None);
    }

    #[concordium_test]
    fn test_missing_allowance_fails_payment_and_leaves_auction_open() {
        let mut host = new_host();
        authorize(&mut host);
        // The bidder has not granted this instance an operator right yet.
        mock_transfer_refusing(&mut host, PAYMENT);
        mock_transfer_ok(&mut host, REGISTRY);

        let parameter_bytes = bid_parameter(750);
        let ctx = bid_ctx(ALICE, at_step(5), &parameter_bytes);
        let result = host.with_rollback(|host| {
            let mut logger = TestLogger::init();
            contract_bid(&ctx, host, &mut logger)
        });

        expect_error(
            result,
            CustomContractError::PaymentTransferFailed.into(),
            "A refused token transfer must fail the bid",
        );
        claim_eq!(
            host.state().winner,
            None,
            "The winner lock must be rolled back with the rest of the call"
        );

        // The auction is still open: after granting the operator right the
        // same bidder wins at the further decayed price.
        mock_payment_expecting(&mut host, ALICE, SELLER, 650);
        let parameter_bytes = bid_parameter(650);
        let ctx = bid_ctx(ALICE, at_step(7), &parameter_bytes);
        let mut logger = TestLogger::init();
        let result = contract_bid(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()), "A properly authorized bid should now win");
        claim_eq!(host.state().winner, Some(ALICE));
    }

    #[concordium_test]
    fn test_failed_collectible_transfer_rolls_back_payment_leg() {
        let mut host = new_host();
        authorize(&mut host);
        mock_payment_expecting(&mut host, ALICE, SELLER, 750);
        mock_transfer_refusing(&mut host, REGISTRY);

        let parameter_bytes = bid_parameter(750);
        let ctx = bid_ctx(ALICE, at_step(5), &parameter_bytes);
        let result = host.with_rollback(|host| {
            let mut logger = TestLogger::init();
            contract_bid(&ctx, host, &mut logger)
        });

        expect_error(
            result,
            CustomContractError::CollectibleTransferFailed.into(),
            "A refused registry transfer must fail the bid",
        );
        claim_eq!(host.state().winner, None, "No partial settlement may remain");
    }

    #[concordium_test]
    fn test_rejects_second_bid_after_win() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);
        mock_transfer_ok(&mut host, PAYMENT);
        mock_transfer_ok(&mut host, REGISTRY);

        let parameter_bytes = bid_parameter(750);
        let ctx = bid_ctx(ALICE, at_step(5), &parameter_bytes);
        contract_bid(&ctx, &mut host, &mut logger).expect("First bid should win");

        let parameter_bytes = bid_parameter(10_000);
        let ctx = bid_ctx(BOB, at_step(6), &parameter_bytes);
        let result = contract_bid(&ctx, &mut host, &mut logger);
        expect_error(
            result,
            CustomContractError::AuctionAlreadyWon.into(),
            "Only one bid can ever be accepted",
        );
        claim_eq!(host.state().winner, Some(ALICE), "Winner must not change");
    }

    #[concordium_test]
    fn test_rejects_bid_after_expiry() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);

        let parameter_bytes = bid_parameter(10_000);
        let ctx = bid_ctx(BOB, at_step(DURATION_STEPS + 1), &parameter_bytes);
        let result = contract_bid(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::AuctionExpired.into(),
            "Bids past the window must be rejected",
        );
    }

    #[concordium_test]
    fn test_price_decays_and_pins() {
        let host = new_host();

        let ctx = receive_ctx(ALICE, at_step(0));
        claim_eq!(
            contract_current_price(&ctx, &host),
            Ok(ContractTokenAmount::from(1_000))
        );

        let ctx = receive_ctx(ALICE, at_step(5));
        claim_eq!(
            contract_current_price(&ctx, &host),
            Ok(ContractTokenAmount::from(750))
        );

        let ctx = receive_ctx(ALICE, at_step(DURATION_STEPS + 50));
        claim_eq!(contract_current_price(&ctx, &host), Ok(reserve_price()));

        claim_eq!(
            contract_initial_price(&ctx, &host),
            Ok(ContractTokenAmount::from(1_000))
        );
    }

    #[concordium_test]
    fn test_view_reflects_state() {
        let host = new_host();
        let ctx = receive_ctx(ALICE, at_step(0));

        let state = contract_view(&ctx, &host).expect("View should succeed");
        claim_eq!(state.payment_token, payment_token());
        claim_eq!(state.reserve_price, reserve_price());
        claim_eq!(state.winner, None);
    }
}
