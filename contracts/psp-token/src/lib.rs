//! PSP utility token. NEP-141/145/148 compliant, 18 decimals, with a
//! NEAR-denominated primary sale (purchase/redeem at an owner-set rate),
//! a hard supply cap and an authorized-spender burn hook.

use near_contract_standards::fungible_token::metadata::{
    FungibleTokenMetadata, FungibleTokenMetadataProvider, FT_METADATA_SPEC,
};
use near_contract_standards::fungible_token::FungibleToken;
use near_sdk::json_types::U128;
use near_sdk::store::LookupMap;
use near_sdk::{
    env, near, require, AccountId, BorshStorageKey, NearToken, PanicOnDefault, Promise,
    PromiseOrValue,
};
use primitive_types::U256;

mod errors;
mod events;

pub use errors::TokenSaleError;
pub use events::TokenSaleEvent;

const DECIMALS: u8 = 18;
/// One whole PSP in base units.
pub const ONE_PSP: u128 = 1_000_000_000_000_000_000;
/// Hard cap: 1 billion PSP.
pub const MAX_SUPPLY: u128 = 1_000_000_000 * ONE_PSP;
/// yoctoNEAR kept back from redemptions to cover state storage.
pub const LIQUIDITY_RESERVE: u128 = 1_000_000_000_000_000_000_000_000; // 1 NEAR

const ICON: &str =
    "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciPjwvc3ZnPg==";

#[derive(BorshStorageKey)]
#[near]
enum StorageKey {
    FungibleToken,
    AuthorizedSpenders,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    token: FungibleToken,
    metadata: FungibleTokenMetadata,
    owner_id: AccountId,
    /// yoctoNEAR per whole PSP.
    token_price: u128,
    /// Contracts allowed to burn from a user's balance without the user's
    /// signature. Trust boundary: mutated only by the owner.
    authorized_spenders: LookupMap<AccountId, bool>,
    paused: bool,
}

#[near]
impl Contract {
    #[init]
    pub fn new(owner_id: AccountId, token_price: U128) -> Self {
        require!(token_price.0 > 0, "Token price must be greater than 0");
        let metadata = FungibleTokenMetadata {
            spec: FT_METADATA_SPEC.to_string(),
            name: "Patent Search Points".to_string(),
            symbol: "PSP".to_string(),
            icon: Some(ICON.to_string()),
            reference: None,
            reference_hash: None,
            decimals: DECIMALS,
        };
        Self {
            token: FungibleToken::new(StorageKey::FungibleToken),
            metadata,
            owner_id,
            token_price: token_price.0,
            authorized_spenders: LookupMap::new(StorageKey::AuthorizedSpenders),
            paused: false,
        }
    }

    // --- Primary sale ---

    /// Converts the attached NEAR to PSP at the current rate and mints it to
    /// the caller. All-or-nothing: dust deposits and cap-breaching mints
    /// revert with no state change.
    #[payable]
    #[handle_result]
    pub fn purchase_tokens(&mut self) -> Result<U128, TokenSaleError> {
        self.assert_not_paused()?;
        let buyer_id = env::predecessor_account_id();
        let deposit = env::attached_deposit().as_yoctonear();

        let amount =
            checked_u128(U256::from(deposit) * U256::from(ONE_PSP) / U256::from(self.token_price))?;
        if amount == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Deposit too small to buy any tokens".into(),
            ));
        }
        self.assert_within_cap(amount)?;

        self.internal_mint(&buyer_id, amount, "Primary sale");

        TokenSaleEvent::TokensPurchased {
            buyer_id,
            near_amount: U128(deposit),
            token_amount: U128(amount),
        }
        .emit();
        Ok(U128(amount))
    }

    /// Burns the caller's PSP and pays NEAR back at the current rate.
    /// Redemption liquidity is whatever NEAR the contract holds above its
    /// reserve; an underfunded contract reverts cleanly rather than paying a
    /// partial amount.
    #[payable]
    #[handle_result]
    pub fn redeem_tokens(&mut self, amount: U128) -> Result<Promise, TokenSaleError> {
        if env::attached_deposit() < NearToken::from_yoctonear(1) {
            return Err(TokenSaleError::InsufficientDeposit(
                "Requires attached deposit of at least 1 yoctoNEAR".into(),
            ));
        }
        self.assert_not_paused()?;
        if amount.0 == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Redeem amount must be greater than 0".into(),
            ));
        }

        let near_value = checked_u128(
            U256::from(amount.0) * U256::from(self.token_price) / U256::from(ONE_PSP),
        )?;
        if near_value == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Amount too small to redeem for any NEAR".into(),
            ));
        }

        let liquid = env::account_balance().as_yoctonear();
        if liquid < near_value.saturating_add(LIQUIDITY_RESERVE) {
            return Err(TokenSaleError::InvalidState(
                "Insufficient contract liquidity for redemption".into(),
            ));
        }

        let redeemer_id = env::predecessor_account_id();
        // Burn before the transfer promise is created.
        self.token.internal_withdraw(&redeemer_id, amount.0);
        near_contract_standards::fungible_token::events::FtBurn {
            owner_id: &redeemer_id,
            amount,
            memo: Some("Redemption"),
        }
        .emit();

        TokenSaleEvent::TokensRedeemed {
            redeemer_id: redeemer_id.clone(),
            token_amount: amount,
            near_amount: U128(near_value),
        }
        .emit();
        Ok(Promise::new(redeemer_id).transfer(NearToken::from_yoctonear(near_value)))
    }

    /// Burns `amount` from `user` without `user`'s signature. Restricted to
    /// authorized spender contracts (e.g. a payment gateway settling a
    /// spend-on-behalf flow).
    #[handle_result]
    pub fn spend_tokens_for(&mut self, user: AccountId, amount: U128) -> Result<(), TokenSaleError> {
        self.assert_not_paused()?;
        let spender_id = env::predecessor_account_id();
        if !self.is_authorized_spender(spender_id.clone()) {
            return Err(TokenSaleError::Unauthorized(
                "Only authorized spenders can spend on behalf of users".into(),
            ));
        }
        if amount.0 == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Spend amount must be greater than 0".into(),
            ));
        }

        self.token.internal_withdraw(&user, amount.0);
        near_contract_standards::fungible_token::events::FtBurn {
            owner_id: &user,
            amount,
            memo: Some("Spend on behalf"),
        }
        .emit();
        TokenSaleEvent::TokensSpent {
            spender_id,
            user_id: user,
            amount,
        }
        .emit();
        Ok(())
    }

    // --- Owner ---

    #[handle_result]
    pub fn set_authorized_spender(
        &mut self,
        spender_id: AccountId,
        authorized: bool,
    ) -> Result<(), TokenSaleError> {
        self.assert_owner()?;
        if authorized {
            self.authorized_spenders.insert(spender_id.clone(), true);
        } else {
            self.authorized_spenders.remove(&spender_id);
        }
        TokenSaleEvent::SpenderAuthorizationChanged {
            spender_id,
            authorized,
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn update_token_price(&mut self, new_price: U128) -> Result<(), TokenSaleError> {
        self.assert_owner()?;
        if new_price.0 == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Token price must be greater than 0".into(),
            ));
        }
        let old_price = self.token_price;
        self.token_price = new_price.0;
        TokenSaleEvent::TokenPriceUpdated {
            old_price: U128(old_price),
            new_price,
        }
        .emit();
        Ok(())
    }

    /// Admin mint, bounded by the same supply cap as purchases.
    #[handle_result]
    pub fn mint(&mut self, receiver_id: AccountId, amount: U128) -> Result<(), TokenSaleError> {
        self.assert_owner()?;
        if amount.0 == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Mint amount must be greater than 0".into(),
            ));
        }
        self.assert_within_cap(amount.0)?;
        self.internal_mint(&receiver_id, amount.0, "Admin mint");
        Ok(())
    }

    #[handle_result]
    pub fn withdraw_near(&mut self, amount: U128) -> Result<Promise, TokenSaleError> {
        self.assert_owner()?;
        if amount.0 == 0 {
            return Err(TokenSaleError::InvalidInput(
                "Withdraw amount must be greater than 0".into(),
            ));
        }
        TokenSaleEvent::NearWithdrawn {
            receiver_id: self.owner_id.clone(),
            amount,
        }
        .emit();
        Ok(Promise::new(self.owner_id.clone()).transfer(NearToken::from_yoctonear(amount.0)))
    }

    #[handle_result]
    pub fn pause(&mut self) -> Result<(), TokenSaleError> {
        self.assert_owner()?;
        if self.paused {
            return Err(TokenSaleError::InvalidState("Already paused".into()));
        }
        self.paused = true;
        TokenSaleEvent::Paused {
            owner_id: self.owner_id.clone(),
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn unpause(&mut self) -> Result<(), TokenSaleError> {
        self.assert_owner()?;
        if !self.paused {
            return Err(TokenSaleError::InvalidState("Not paused".into()));
        }
        self.paused = false;
        TokenSaleEvent::Unpaused {
            owner_id: self.owner_id.clone(),
        }
        .emit();
        Ok(())
    }

    // --- Views ---

    #[handle_result]
    pub fn calculate_tokens_for_near(&self, near_amount: U128) -> Result<U128, TokenSaleError> {
        checked_u128(U256::from(near_amount.0) * U256::from(ONE_PSP) / U256::from(self.token_price))
            .map(U128)
    }

    #[handle_result]
    pub fn calculate_near_for_tokens(&self, token_amount: U128) -> Result<U128, TokenSaleError> {
        checked_u128(U256::from(token_amount.0) * U256::from(self.token_price) / U256::from(ONE_PSP))
            .map(U128)
    }

    pub fn get_token_price(&self) -> U128 {
        U128(self.token_price)
    }

    pub fn get_max_supply(&self) -> U128 {
        U128(MAX_SUPPLY)
    }

    pub fn is_authorized_spender(&self, spender_id: AccountId) -> bool {
        *self.authorized_spenders.get(&spender_id).unwrap_or(&false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    // --- Internal ---

    fn assert_owner(&self) -> Result<(), TokenSaleError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(TokenSaleError::only_owner());
        }
        Ok(())
    }

    fn assert_not_paused(&self) -> Result<(), TokenSaleError> {
        if self.paused {
            return Err(TokenSaleError::paused());
        }
        Ok(())
    }

    fn assert_within_cap(&self, amount: u128) -> Result<(), TokenSaleError> {
        let new_supply = self
            .token
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| TokenSaleError::SupplyCapExceeded("Supply overflow".into()))?;
        if new_supply > MAX_SUPPLY {
            return Err(TokenSaleError::SupplyCapExceeded(format!(
                "Mint of {} would exceed MAX_SUPPLY of {}",
                amount, MAX_SUPPLY
            )));
        }
        Ok(())
    }

    fn internal_mint(&mut self, receiver_id: &AccountId, amount: u128, memo: &str) {
        if self.token.accounts.get(receiver_id).is_none() {
            self.token.internal_register_account(receiver_id);
        }
        self.token.internal_deposit(receiver_id, amount);
        near_contract_standards::fungible_token::events::FtMint {
            owner_id: receiver_id,
            amount: U128(amount),
            memo: Some(memo),
        }
        .emit();
    }
}

/// U256 intermediates keep the multiplication safe; the final value still has
/// to fit u128, and an extreme price/amount combination that does not is a
/// typed error rather than a cast panic.
fn checked_u128(value: U256) -> Result<u128, TokenSaleError> {
    if value > U256::from(u128::MAX) {
        return Err(TokenSaleError::InvalidInput(
            "Conversion result exceeds u128".into(),
        ));
    }
    Ok(value.as_u128())
}

// --- NEP-141: Fungible Token Core (pause-gated) ---
#[near]
impl near_contract_standards::fungible_token::core::FungibleTokenCore for Contract {
    #[payable]
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>) {
        require!(!self.paused, "Contract is paused");
        self.token.ft_transfer(receiver_id, amount, memo)
    }

    #[payable]
    fn ft_transfer_call(
        &mut self,
        receiver_id: AccountId,
        amount: U128,
        memo: Option<String>,
        msg: String,
    ) -> PromiseOrValue<U128> {
        require!(!self.paused, "Contract is paused");
        self.token.ft_transfer_call(receiver_id, amount, memo, msg)
    }

    fn ft_total_supply(&self) -> U128 {
        self.token.ft_total_supply()
    }

    fn ft_balance_of(&self, account_id: AccountId) -> U128 {
        self.token.ft_balance_of(account_id)
    }
}

#[near]
impl near_contract_standards::fungible_token::resolver::FungibleTokenResolver for Contract {
    #[private]
    fn ft_resolve_transfer(
        &mut self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: U128,
    ) -> U128 {
        let (used_amount, burned_amount) =
            self.token
                .internal_ft_resolve_transfer(&sender_id, receiver_id, amount);
        if burned_amount > 0 {
            env::log_str(&format!("Account @{} burned {}", sender_id, burned_amount));
        }
        used_amount.into()
    }
}

// --- NEP-145: Storage Management ---
#[near]
impl near_contract_standards::storage_management::StorageManagement for Contract {
    #[payable]
    fn storage_deposit(
        &mut self,
        account_id: Option<AccountId>,
        registration_only: Option<bool>,
    ) -> near_contract_standards::storage_management::StorageBalance {
        self.token.storage_deposit(account_id, registration_only)
    }

    #[payable]
    fn storage_withdraw(
        &mut self,
        amount: Option<NearToken>,
    ) -> near_contract_standards::storage_management::StorageBalance {
        self.token.storage_withdraw(amount)
    }

    #[payable]
    fn storage_unregister(&mut self, force: Option<bool>) -> bool {
        if let Some((account_id, balance)) = self.token.internal_storage_unregister(force) {
            env::log_str(&format!("Closed @{} with {}", account_id, balance));
            true
        } else {
            false
        }
    }

    fn storage_balance_bounds(
        &self,
    ) -> near_contract_standards::storage_management::StorageBalanceBounds {
        self.token.storage_balance_bounds()
    }

    fn storage_balance_of(
        &self,
        account_id: AccountId,
    ) -> Option<near_contract_standards::storage_management::StorageBalance> {
        self.token.storage_balance_of(account_id)
    }
}

// --- NEP-148: Fungible Token Metadata ---
#[near]
impl FungibleTokenMetadataProvider for Contract {
    fn ft_metadata(&self) -> FungibleTokenMetadata {
        self.metadata.clone()
    }
}
