//! Multi-currency payment gateway for metered patent searches.
//!
//! Accepts native NEAR (attached deposit), USDC or PSP (NEP-141
//! `ft_transfer_call` into `ft_on_transfer`) at independently configured
//! prices, and keeps a per-user monotonic audit trail of paid totals and
//! search credits. Credit consumption happens off-chain; this contract only
//! records grants.

use near_sdk::json_types::U128;
use near_sdk::{
    env, ext_contract, near, require, AccountId, BorshStorageKey, Gas, NearToken, PanicOnDefault,
    Promise, PromiseResult,
};

mod errors;
mod events;
mod types;

pub use errors::GatewayError;
pub use events::GatewayEvent;
pub use types::{Currency, SearchPrices, UserStats};

use near_sdk::store::LookupMap;

/// Credits granted per successful payment, any currency.
pub const SEARCHES_PER_PAYMENT: u64 = 1;

const GAS_FOR_FT_TRANSFER: Gas = Gas::from_tgas(15);
const GAS_FOR_CALLBACK: Gas = Gas::from_tgas(10);
const ONE_YOCTO: NearToken = NearToken::from_yoctonear(1);

#[ext_contract(ext_ft)]
pub trait FungibleTokenCore {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
}

#[ext_contract(ext_self)]
pub trait SelfCallback {
    fn on_withdraw_ft(&mut self, currency: Currency, receiver_id: AccountId, amount: U128);
}

#[derive(BorshStorageKey)]
#[near]
enum StorageKey {
    Stats,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    owner_id: AccountId,
    usdc_token_id: AccountId,
    psp_token_id: AccountId,
    /// yoctoNEAR per search payment.
    price_near: u128,
    /// USDC base units (6 decimals) per search payment.
    price_usdc: u128,
    /// PSP base units (18 decimals) per search payment.
    price_psp: u128,
    stats: LookupMap<AccountId, UserStats>,
    /// Collected, not-yet-withdrawn balances per currency.
    near_collected: u128,
    usdc_collected: u128,
    psp_collected: u128,
    paused: bool,
}

#[near]
impl Contract {
    #[init]
    pub fn new(
        owner_id: AccountId,
        usdc_token_id: AccountId,
        psp_token_id: AccountId,
        price_near: U128,
        price_usdc: U128,
        price_psp: U128,
    ) -> Self {
        require!(
            price_near.0 > 0 && price_usdc.0 > 0 && price_psp.0 > 0,
            "All prices must be greater than 0"
        );
        Self {
            owner_id,
            usdc_token_id,
            psp_token_id,
            price_near: price_near.0,
            price_usdc: price_usdc.0,
            price_psp: price_psp.0,
            stats: LookupMap::new(StorageKey::Stats),
            near_collected: 0,
            usdc_collected: 0,
            psp_collected: 0,
            paused: false,
        }
    }

    // --- Payments ---

    /// Pays for one search batch with native NEAR. Excess deposit above the
    /// configured price is refunded; stats are finalized before the refund
    /// promise is created.
    #[payable]
    #[handle_result]
    pub fn pay_with_near(&mut self) -> Result<(), GatewayError> {
        self.assert_not_paused()?;
        let payer_id = env::predecessor_account_id();
        let deposit = env::attached_deposit().as_yoctonear();
        let price = self.price_near;

        if deposit < price {
            return Err(GatewayError::InsufficientDeposit(format!(
                "Search payment requires {} yoctoNEAR, got {}",
                price, deposit
            )));
        }

        self.near_collected += price;
        self.record_payment(payer_id.clone(), Currency::Near, price);

        let excess = deposit - price;
        if excess > 0 {
            Promise::new(payer_id).transfer(NearToken::from_yoctonear(excess));
        }
        Ok(())
    }

    /// NEP-141 receiver hook: a USDC or PSP transfer into this contract pays
    /// for one search batch. The amount must equal the configured price
    /// exactly — the token paths have no overpayment refund, unlike the
    /// native path. A panic here rolls the whole token transfer back.
    pub fn ft_on_transfer(&mut self, sender_id: AccountId, amount: U128, msg: String) -> U128 {
        require!(!self.paused, "Contract is paused");
        require!(
            msg.is_empty() || msg == "search",
            "Unknown payment action"
        );

        let token_id = env::predecessor_account_id();
        let (currency, price) = if token_id == self.usdc_token_id {
            (Currency::Usdc, self.price_usdc)
        } else if token_id == self.psp_token_id {
            (Currency::Psp, self.price_psp)
        } else {
            env::panic_str("Only USDC and PSP payments are accepted")
        };

        require!(
            amount.0 == price,
            "Token payment must match the search price exactly"
        );

        if currency == Currency::Usdc {
            self.usdc_collected += price;
        } else {
            self.psp_collected += price;
        }
        self.record_payment(sender_id, currency, price);

        U128(0)
    }

    // --- Views ---

    pub fn get_search_price(&self, currency: Currency) -> U128 {
        U128(match currency {
            Currency::Near => self.price_near,
            Currency::Usdc => self.price_usdc,
            Currency::Psp => self.price_psp,
        })
    }

    pub fn get_all_search_prices(&self) -> SearchPrices {
        SearchPrices {
            near: U128(self.price_near),
            usdc: U128(self.price_usdc),
            psp: U128(self.price_psp),
        }
    }

    pub fn get_user_stats(&self, account_id: AccountId) -> UserStats {
        self.stats.get(&account_id).cloned().unwrap_or_default()
    }

    pub fn get_collected_balance(&self, currency: Currency) -> U128 {
        U128(match currency {
            Currency::Near => self.near_collected,
            Currency::Usdc => self.usdc_collected,
            Currency::Psp => self.psp_collected,
        })
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    pub fn get_token_address(&self, currency: Currency) -> Option<AccountId> {
        match currency {
            Currency::Near => None,
            Currency::Usdc => Some(self.usdc_token_id.clone()),
            Currency::Psp => Some(self.psp_token_id.clone()),
        }
    }

    // --- Owner ---

    #[handle_result]
    pub fn update_search_price(
        &mut self,
        currency: Currency,
        new_price: U128,
    ) -> Result<(), GatewayError> {
        self.assert_owner()?;
        if new_price.0 == 0 {
            return Err(GatewayError::InvalidInput(
                "Price must be greater than 0".into(),
            ));
        }
        let slot = match currency {
            Currency::Near => &mut self.price_near,
            Currency::Usdc => &mut self.price_usdc,
            Currency::Psp => &mut self.price_psp,
        };
        let old_price = *slot;
        *slot = new_price.0;
        GatewayEvent::SearchPriceUpdated {
            currency,
            old_price: U128(old_price),
            new_price,
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn update_token_address(
        &mut self,
        currency: Currency,
        token_id: AccountId,
    ) -> Result<(), GatewayError> {
        self.assert_owner()?;
        match currency {
            Currency::Near => {
                return Err(GatewayError::InvalidInput(
                    "Native NEAR has no token contract".into(),
                ))
            }
            Currency::Usdc => self.usdc_token_id = token_id.clone(),
            Currency::Psp => self.psp_token_id = token_id.clone(),
        }
        GatewayEvent::TokenAddressUpdated { currency, token_id }.emit();
        Ok(())
    }

    #[handle_result]
    pub fn pause(&mut self) -> Result<(), GatewayError> {
        self.assert_owner()?;
        if self.paused {
            return Err(GatewayError::InvalidState("Already paused".into()));
        }
        self.paused = true;
        GatewayEvent::Paused {
            owner_id: self.owner_id.clone(),
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn unpause(&mut self) -> Result<(), GatewayError> {
        self.assert_owner()?;
        if !self.paused {
            return Err(GatewayError::InvalidState("Not paused".into()));
        }
        self.paused = false;
        GatewayEvent::Unpaused {
            owner_id: self.owner_id.clone(),
        }
        .emit();
        Ok(())
    }

    /// Native balance withdrawal. Decremented immediately; NEAR transfers to
    /// existing accounts do not fail.
    #[handle_result]
    pub fn withdraw_near(
        &mut self,
        amount: U128,
        receiver_id: AccountId,
    ) -> Result<Promise, GatewayError> {
        self.assert_owner()?;
        if amount.0 == 0 || amount.0 > self.near_collected {
            return Err(GatewayError::InvalidInput(
                "Invalid withdrawal amount".into(),
            ));
        }
        self.near_collected -= amount.0;
        GatewayEvent::FundsWithdrawn {
            currency: Currency::Near,
            receiver_id: receiver_id.clone(),
            amount,
        }
        .emit();
        Ok(Promise::new(receiver_id).transfer(NearToken::from_yoctonear(amount.0)))
    }

    /// Token balance withdrawal. The collected counter is only decremented in
    /// the callback once the transfer is known to have succeeded.
    #[handle_result]
    pub fn withdraw_ft(
        &mut self,
        currency: Currency,
        amount: U128,
        receiver_id: AccountId,
    ) -> Result<Promise, GatewayError> {
        self.assert_owner()?;
        let (token_id, collected) = match currency {
            Currency::Near => {
                return Err(GatewayError::InvalidInput(
                    "Use withdraw_near for native balance".into(),
                ))
            }
            Currency::Usdc => (self.usdc_token_id.clone(), self.usdc_collected),
            Currency::Psp => (self.psp_token_id.clone(), self.psp_collected),
        };
        if amount.0 == 0 || amount.0 > collected {
            return Err(GatewayError::InvalidInput(
                "Invalid withdrawal amount".into(),
            ));
        }

        Ok(ext_ft::ext(token_id)
            .with_static_gas(GAS_FOR_FT_TRANSFER)
            .with_attached_deposit(ONE_YOCTO)
            .ft_transfer(receiver_id.clone(), amount, None)
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_CALLBACK)
                    .on_withdraw_ft(currency, receiver_id, amount),
            ))
    }

    /// Only callable by this contract. Must not panic; failures are logged.
    #[private]
    pub fn on_withdraw_ft(&mut self, currency: Currency, receiver_id: AccountId, amount: U128) {
        match env::promise_result(0) {
            PromiseResult::Successful(_) => {
                match currency {
                    Currency::Usdc => self.usdc_collected -= amount.0,
                    Currency::Psp => self.psp_collected -= amount.0,
                    Currency::Near => return,
                }
                GatewayEvent::FundsWithdrawn {
                    currency,
                    receiver_id,
                    amount,
                }
                .emit();
            }
            PromiseResult::Failed => {
                env::log_str("Token withdrawal failed; collected balance unchanged");
            }
        }
    }

    // --- Internal ---

    fn assert_owner(&self) -> Result<(), GatewayError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(GatewayError::only_owner());
        }
        Ok(())
    }

    fn assert_not_paused(&self) -> Result<(), GatewayError> {
        if self.paused {
            return Err(GatewayError::paused());
        }
        Ok(())
    }

    /// Updates the audit trail and emits the payment event. Totals only ever
    /// increase.
    fn record_payment(&mut self, payer_id: AccountId, currency: Currency, amount: u128) {
        let mut stats = self.stats.get(&payer_id).cloned().unwrap_or_default();
        match currency {
            Currency::Near => stats.total_paid_near = U128(stats.total_paid_near.0 + amount),
            Currency::Usdc => stats.total_paid_usdc = U128(stats.total_paid_usdc.0 + amount),
            Currency::Psp => stats.total_paid_psp = U128(stats.total_paid_psp.0 + amount),
        }
        stats.searches_purchased += SEARCHES_PER_PAYMENT;
        self.stats.insert(payer_id.clone(), stats);

        GatewayEvent::PaymentReceived {
            payer_id,
            currency,
            amount: U128(amount),
            searches_granted: SEARCHES_PER_PAYMENT,
        }
        .emit();
    }
}
