//! Escrowed marketplace for patent NFTs.
//!
//! Listings reference NFTs held by their sellers under a standing NEP-178
//! approval; nothing is taken into custody until a sale settles. All proceeds
//! (seller share, platform fee, buyer overpayment or refund) accumulate as
//! pull-payment credits that the owed party withdraws themselves.

use near_sdk::json_types::U128;
use near_sdk::store::{IterableMap, LookupMap};
use near_sdk::{
    env, near, require, AccountId, BorshStorageKey, Gas, NearToken, PanicOnDefault, Promise,
};

mod errors;
mod events;
mod external;
mod internal;
mod sale;
mod types;

pub use errors::MarketplaceError;
pub use events::MarketplaceEvent;
pub use types::{FeeConfig, Listing};

pub const BASIS_POINTS: u16 = 10_000;
/// Platform fee ceiling: 10%.
pub const MAX_FEE_BPS: u16 = 1_000;
pub const MAX_TOKEN_ID_LEN: usize = 128;

pub(crate) const GAS_FOR_NFT_VIEW: Gas = Gas::from_tgas(10);
pub(crate) const GAS_FOR_PROCESS_LISTING: Gas = Gas::from_tgas(25);
pub(crate) const GAS_FOR_NFT_TRANSFER: Gas = Gas::from_tgas(30);
pub(crate) const GAS_FOR_RESOLVE_PURCHASE: Gas = Gas::from_tgas(25);
pub(crate) const ONE_YOCTO: NearToken = NearToken::from_yoctonear(1);

#[derive(BorshStorageKey)]
#[near]
enum StorageKey {
    Listings,
    TokenToListing,
    PendingWithdrawals,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    owner_id: AccountId,
    /// Unset blocks purchases, not listings.
    fee_recipient: Option<AccountId>,
    fee_bps: u16,
    /// Monotonic, starts at 1; 0 is never a valid listing ID.
    next_listing_id: u64,
    listings: IterableMap<u64, Listing>,
    /// `"<nft_contract>:<token_id>"` -> active listing ID.
    token_to_listing: LookupMap<String, u64>,
    pending_withdrawals: LookupMap<AccountId, u128>,
    /// Sum of all pending withdrawal balances plus buyer deposits in flight
    /// between `buy_patent` and `resolve_purchase`; never sweepable by the
    /// owner.
    total_pending: u128,
}

#[near]
impl Contract {
    #[init]
    pub fn new(owner_id: AccountId, fee_bps: u16, fee_recipient: Option<AccountId>) -> Self {
        require!(
            fee_bps <= MAX_FEE_BPS,
            "Fee exceeds the maximum of 1000 basis points"
        );
        Self {
            owner_id,
            fee_recipient,
            fee_bps,
            next_listing_id: 1,
            listings: IterableMap::new(StorageKey::Listings),
            token_to_listing: LookupMap::new(StorageKey::TokenToListing),
            pending_withdrawals: LookupMap::new(StorageKey::PendingWithdrawals),
            total_pending: 0,
        }
    }

    // --- Views ---

    pub fn get_listing(&self, listing_id: u64) -> Option<Listing> {
        self.listings.get(&listing_id).cloned()
    }

    pub fn get_active_listing(
        &self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Option<Listing> {
        let key = Contract::make_listing_key(&nft_contract_id, &token_id);
        self.token_to_listing
            .get(&key)
            .and_then(|id| self.listings.get(id).cloned())
    }

    pub fn get_all_active_listings(
        &self,
        from_index: Option<u64>,
        limit: Option<u64>,
    ) -> Vec<Listing> {
        let start = from_index.unwrap_or(0) as usize;
        let limit = limit.unwrap_or(50) as usize;
        self.listings
            .values()
            .filter(|listing| listing.active)
            .skip(start)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_pending_withdrawal(&self, account_id: AccountId) -> U128 {
        U128(
            self.pending_withdrawals
                .get(&account_id)
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn get_total_pending(&self) -> U128 {
        U128(self.total_pending)
    }

    pub fn get_fee_config(&self) -> FeeConfig {
        FeeConfig {
            fee_bps: self.fee_bps,
            fee_recipient: self.fee_recipient.clone(),
        }
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    // --- Owner ---

    #[handle_result]
    pub fn set_platform_fee(&mut self, fee_bps: u16) -> Result<(), MarketplaceError> {
        self.assert_owner()?;
        if fee_bps > MAX_FEE_BPS {
            return Err(MarketplaceError::InvalidInput(format!(
                "Fee exceeds the maximum of {} basis points",
                MAX_FEE_BPS
            )));
        }
        let old_bps = self.fee_bps;
        self.fee_bps = fee_bps;
        MarketplaceEvent::PlatformFeeUpdated {
            old_bps,
            new_bps: fee_bps,
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn set_fee_recipient(&mut self, fee_recipient: AccountId) -> Result<(), MarketplaceError> {
        self.assert_owner()?;
        self.fee_recipient = Some(fee_recipient.clone());
        MarketplaceEvent::FeeRecipientUpdated { fee_recipient }.emit();
        Ok(())
    }

    /// Sweeps contract balance in excess of the escrowed total. Pending
    /// withdrawal credits can never be drained through this path.
    #[handle_result]
    pub fn emergency_withdraw(&mut self, amount: U128) -> Result<Promise, MarketplaceError> {
        self.assert_owner()?;
        let available = env::account_balance()
            .as_yoctonear()
            .saturating_sub(self.total_pending);
        if amount.0 == 0 || amount.0 > available {
            return Err(MarketplaceError::InvalidInput(format!(
                "Amount must be between 1 and the non-escrowed balance of {}",
                available
            )));
        }
        MarketplaceEvent::EmergencyWithdrawal {
            owner_id: self.owner_id.clone(),
            amount,
        }
        .emit();
        Ok(Promise::new(self.owner_id.clone()).transfer(NearToken::from_yoctonear(amount.0)))
    }
}

#[cfg(test)]
mod tests;
