use super::*;

/// Host extension for talking to CIS-2 token contracts.
pub trait HostCis2Ext<S>: HasHost<S> {
    /// Query the balance `owner` holds of `token`. For a collectible a balance
    /// of exactly one means `owner` is the current registered owner.
    fn cis2_balance_of(
        &self,
        token: &Token,
        owner: AccountAddress,
    ) -> Result<ContractTokenAmount, CustomContractError> {
        let parameter = ContractBalanceOfQueryParams {
            queries: vec![BalanceOfQuery {
                token_id: token.id,
                address: Address::Account(owner),
            }],
        };
        let mut response = self
            .invoke_contract_read_only(
                &token.contract,
                &parameter,
                EntrypointName::new_unchecked("balanceOf"),
                Amount::zero(),
            )
            .map_err(handle_call_error)?
            .ok_or(CustomContractError::Incompatible)?;

        let amounts = ContractBalanceOfQueryResponse::deserial(&mut response)
            .map_err(|_| CustomContractError::Incompatible)?;
        amounts
            .0
            .first()
            .copied()
            .ok_or(CustomContractError::Incompatible)
    }

    /// Invoke a CIS-2 `transfer` of `amount` of `token` between two accounts.
    /// The token contract enforces that this instance holds an operator grant
    /// from `from`.
    fn cis2_transfer_single(
        &mut self,
        token: &Token,
        amount: ContractTokenAmount,
        from: AccountAddress,
        to: AccountAddress,
    ) -> Result<(), CustomContractError> {
        let parameter: TransferParameter = TransferParams(vec![Transfer {
            token_id: token.id,
            amount,
            from: Address::Account(from),
            to: Receiver::Account(to),
            data: AdditionalData::empty(),
        }]);
        self.invoke_contract(
            &token.contract,
            &parameter,
            EntrypointName::new_unchecked("transfer"),
            Amount::zero(),
        )
        .map_err(handle_call_error)?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostCis2Ext<S> for H {}

fn handle_call_error<R>(error: CallContractError<R>) -> CustomContractError {
    match error {
        CallContractError::MissingContract | CallContractError::MissingEntrypoint => {
            CustomContractError::Incompatible
        }
        _ => CustomContractError::InvokeContractError,
    }
}
