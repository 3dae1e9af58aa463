use commons::{ContractResult, ContractTokenAmount, CustomContractError, HostCis2Ext};
use concordium_std::*;

use crate::events::*;
use crate::external::InitParameter;
use crate::state::State;

/// Init function that creates a new auction.
///
/// The init origin becomes the seller. Init functions cannot invoke other
/// contracts, so the instance starts unauthorized: ownership of the
/// collectible is verified by `authorize` before any bid can be accepted.
#[init(contract = "DutchAuctionNft", parameter = "InitParameter")]
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
///
/// The registry is only queried here; it is never asked again. A seller who
/// moves the collectible away afterwards makes the settlement transfer fail
/// at bid time instead.
#[receive(
    mutable,
    contract = "DutchAuctionNft",
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

/// Receive function for bids. The attached CCD is the bid amount; on
/// acceptance settlement runs inside the same call: payment to the seller
/// first, then the operator-gated collectible transfer to the bidder. Any
/// failure aborts the call, so a partially settled auction cannot exist.
#[receive(
    mutable,
    payable,
    contract = "DutchAuctionNft",
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
    let collectible = state.collectible;

    logger.log(&DutchAuctionEvent::Settle(SettleEvent {
        collectible,
        winner: bidder,
        price: amount,
    }))?;

    // Payment leg first: a failed payment must not move the collectible.
    host.invoke_transfer(&seller, amount)?;

    // Collectible leg: registry transfer from seller to winner.
    host.cis2_transfer_single(&collectible, ContractTokenAmount::from(1), seller, bidder)
        .map_err(|_| CustomContractError::CollectibleTransferFailed)?;

    Ok(())
}

/// View function that returns the entire auction state.
#[receive(contract = "DutchAuctionNft", name = "view", return_value = "State")]
fn contract_view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ReceiveResult<State> {
    Ok(host.state().clone())
}

/// Price at the current slot time. Read-only and callable forever; from the
/// expiry step onward it returns exactly the reserve price.
#[receive(
    contract = "DutchAuctionNft",
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
    contract = "DutchAuctionNft",
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
    use commons::{
        ContractBalanceOfQueryParams, ContractBalanceOfQueryResponse, Token, TransferParameter,
    };
    use concordium_cis2::TokenIdU32;
    use core::fmt::Debug;
    use test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([0u8; 32]);
    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const RESERVE_PRICE: Amount = Amount::from_micro_ccd(500);
    const DURATION_STEPS: u64 = 10;
    const PRICE_DECREMENT: Amount = Amount::from_micro_ccd(50);
    const STEP_MILLIS: u64 = 60_000;

    fn collectible() -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdU32(42),
        }
    }

    fn auction_parameter() -> InitParameter {
        InitParameter {
            reserve_price: RESERVE_PRICE,
            duration_steps: DURATION_STEPS,
            price_decrement: PRICE_DECREMENT,
            step_length: Duration::from_millis(STEP_MILLIS),
            collectible: collectible(),
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

    fn receive_ctx<'a>(sender: AccountAddress, slot_time: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_owner(SELLER);
        ctx.set_metadata_slot_time(slot_time);
        ctx
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

    /// Mock a registry `transfer` that accepts any single-token transfer.
    fn mock_transfer_ok(host: &mut TestHost<State>) {
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(|parameter, _amount, _balance, _state: &mut State| {
                TransferParameter::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                Ok((true, Some(())))
            }),
        );
    }

    /// Mock a registry `transfer` that always refuses, like a registry whose
    /// operator grant was revoked.
    fn mock_transfer_refusing(host: &mut TestHost<State>) {
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(|_parameter, _amount, _balance, _state: &mut State| {
                Err::<(bool, Option<()>), _>(CallContractError::Trap)
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
        claim_eq!(state.winner, None);
        claim!(!state.authorized, "Fresh auction must not be authorized");
    }

    #[concordium_test]
    fn test_authorize_verifies_ownership() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 1);

        let ctx = receive_ctx(SELLER, at_step(0));
        let result = contract_authorize(&ctx, &mut host, &mut logger);

        claim_eq!(result, Ok(()), "Authorization should succeed for the owner");
        claim!(host.state().authorized, "State should record the verification");
    }

    #[concordium_test]
    fn test_authorize_rejects_non_owner_seller() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        // The registry does not list the seller as the owner.
        mock_balance_of(&mut host, 0);

        let ctx = receive_ctx(SELLER, at_step(0));
        let result = contract_authorize(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::NotCollectibleOwner.into(),
            "Ownership verification should fail",
        );
        claim!(!host.state().authorized, "Verification must not be recorded");
    }

    #[concordium_test]
    fn test_authorize_runs_once() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);

        let ctx = receive_ctx(SELLER, at_step(0));
        let result = contract_authorize(&ctx, &mut host, &mut logger);

        expect_error(
            result,
            CustomContractError::AlreadyAuthorized.into(),
            "Repeated authorization should be rejected",
        );
    }

    #[concordium_test]
    fn test_rejects_bid_before_authorization() {
        let mut host = new_host();
        let mut logger = TestLogger::init();

        let ctx = receive_ctx(ALICE, at_step(0));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(1_000), &mut logger);

        expect_error(
            result,
            CustomContractError::NotAuthorized.into(),
            "No bid can be accepted before ownership verification",
        );
    }

    #[concordium_test]
    fn test_winning_bid_settles_both_legs() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);
        mock_transfer_ok(&mut host);

        let price = Amount::from_micro_ccd(750);
        host.set_self_balance(price);

        let ctx = receive_ctx(ALICE, at_step(5));
        let result = contract_bid(&ctx, &mut host, price, &mut logger);

        claim_eq!(result, Ok(()), "Bid at the current price should win");
        claim_eq!(host.state().winner, Some(ALICE));
        claim!(
            host.transfer_occurred(&SELLER, price),
            "The full bid should reach the seller"
        );
    }

    #[concordium_test]
    fn test_failed_collectible_transfer_rolls_back() {
        let mut host = new_host();
        authorize(&mut host);
        mock_transfer_refusing(&mut host);

        let price = Amount::from_micro_ccd(750);
        host.set_self_balance(price);

        let ctx = receive_ctx(ALICE, at_step(5));
        let result = host.with_rollback(|host| {
            let mut logger = TestLogger::init();
            contract_bid(&ctx, host, price, &mut logger)
        });

        expect_error(
            result,
            CustomContractError::CollectibleTransferFailed.into(),
            "A refused registry transfer must fail the bid",
        );
        claim_eq!(
            host.state().winner,
            None,
            "The winner lock must be rolled back with the rest of the call"
        );
        claim!(host.state().authorized, "Verification itself must survive");
    }

    #[concordium_test]
    fn test_rejects_second_bid_after_win() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);
        mock_transfer_ok(&mut host);

        let price = Amount::from_micro_ccd(750);
        host.set_self_balance(price);
        let ctx = receive_ctx(ALICE, at_step(5));
        contract_bid(&ctx, &mut host, price, &mut logger).expect("First bid should win");

        let ctx = receive_ctx(BOB, at_step(6));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(10_000), &mut logger);
        expect_error(
            result,
            CustomContractError::AuctionAlreadyWon.into(),
            "Only one bid can ever be accepted",
        );
    }

    #[concordium_test]
    fn test_rejects_bid_after_expiry() {
        let mut host = new_host();
        let mut logger = TestLogger::init();
        authorize(&mut host);

        let ctx = receive_ctx(BOB, at_step(DURATION_STEPS + 1));
        let result = contract_bid(&ctx, &mut host, Amount::from_micro_ccd(10_000), &mut logger);

        expect_error(
            result,
            CustomContractError::AuctionExpired.into(),
            "Bids past the window must be rejected",
        );
    }

    #[concordium_test]
    fn test_price_decays_and_pins() {
        let host = new_host();

        let ctx = receive_ctx(ALICE, at_step(5));
        claim_eq!(
            contract_current_price(&ctx, &host),
            Ok(Amount::from_micro_ccd(750))
        );

        let ctx = receive_ctx(ALICE, at_step(DURATION_STEPS + 50));
        claim_eq!(contract_current_price(&ctx, &host), Ok(RESERVE_PRICE));

        claim_eq!(
            contract_initial_price(&ctx, &host),
            Ok(Amount::from_micro_ccd(1_000))
        );
    }

    #[concordium_test]
    fn test_view_reflects_state() {
        let host = new_host();
        let ctx = receive_ctx(ALICE, at_step(0));

        let state = contract_view(&ctx, &host).expect("View should succeed");
        claim_eq!(state.collectible, collectible());
        claim_eq!(state.reserve_price, RESERVE_PRICE);
        claim_eq!(state.winner, None);
    }
}
