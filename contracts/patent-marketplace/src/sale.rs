//! Listing, purchase and withdrawal entry points.

use crate::external::*;
use crate::internal::*;
use crate::*;
use near_sdk::json_types::U128;
use near_sdk::{env, near, AccountId, NearToken, Promise, PromiseResult};

#[near]
impl Contract {
    /// Offers a patent NFT for sale. Ownership and the NEP-178 approval are
    /// verified with view calls to the NFT contract before the listing is
    /// stored; the token itself stays with the seller.
    ///
    /// Panics if attached deposit < 1 yoctoNEAR.
    #[payable]
    #[handle_result]
    pub fn list_patent(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        approval_id: u64,
        price: U128,
    ) -> Result<Promise, MarketplaceError> {
        check_at_least_one_yocto()?;
        if token_id.is_empty() || token_id.len() > MAX_TOKEN_ID_LEN {
            return Err(MarketplaceError::InvalidInput(format!(
                "Token ID must be 1..={} characters",
                MAX_TOKEN_ID_LEN
            )));
        }
        if price.0 == 0 {
            return Err(MarketplaceError::InvalidInput(
                "Price must be greater than 0".into(),
            ));
        }

        let key = Contract::make_listing_key(&nft_contract_id, &token_id);
        if self.token_to_listing.contains_key(&key) {
            return Err(MarketplaceError::InvalidState(
                "An active listing already exists for this token".into(),
            ));
        }

        let seller_id = env::predecessor_account_id();

        Ok(ext_nft_contract::ext(nft_contract_id.clone())
            .with_static_gas(GAS_FOR_NFT_VIEW)
            .nft_is_approved(
                token_id.clone(),
                env::current_account_id(),
                Some(approval_id),
            )
            .and(
                ext_nft_contract::ext(nft_contract_id.clone())
                    .with_static_gas(GAS_FOR_NFT_VIEW)
                    .nft_token(token_id.clone()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_PROCESS_LISTING)
                    .process_listing(nft_contract_id, token_id, approval_id, price, seller_id),
            ))
    }

    /// Only callable by this contract. Safety: must not panic; failures are logged.
    #[private]
    pub fn process_listing(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        approval_id: u64,
        price: U128,
        seller_id: AccountId,
    ) {
        if env::promise_results_count() != 2 {
            env::log_str("Listing failed: expected 2 promise results");
            return;
        }

        let is_approved = match env::promise_result(0) {
            PromiseResult::Successful(value) => {
                near_sdk::serde_json::from_slice::<bool>(&value).unwrap_or(false)
            }
            PromiseResult::Failed => {
                env::log_str("Listing failed: approval check call failed");
                return;
            }
        };
        if !is_approved {
            env::log_str("Listing failed: marketplace is not approved for this token");
            return;
        }

        let token_owner = match env::promise_result(1) {
            PromiseResult::Successful(value) => {
                match near_sdk::serde_json::from_slice::<Option<Token>>(&value) {
                    Ok(Some(token)) => token.owner_id,
                    Ok(None) => {
                        env::log_str("Listing failed: token not found on NFT contract");
                        return;
                    }
                    Err(_) => {
                        env::log_str("Listing failed: could not parse token");
                        return;
                    }
                }
            }
            PromiseResult::Failed => {
                env::log_str("Listing failed: owner check call failed");
                return;
            }
        };
        if token_owner != seller_id {
            env::log_str("Listing failed: caller is not the token owner");
            return;
        }

        let key = Contract::make_listing_key(&nft_contract_id, &token_id);
        if self.token_to_listing.contains_key(&key) {
            env::log_str("Listing skipped: listing already exists (concurrent listing)");
            return;
        }

        self.internal_add_listing(nft_contract_id, token_id, approval_id, price, seller_id);
    }

    /// Buys a listed patent. The listing is deactivated before the
    /// cross-contract transfer; `resolve_purchase` then either settles the
    /// sale or credits the buyer's deposit back through the escrow.
    #[payable]
    #[handle_result]
    pub fn buy_patent(&mut self, listing_id: u64) -> Result<Promise, MarketplaceError> {
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or_else(MarketplaceError::listing_not_found)?
            .clone();

        if !listing.active {
            return Err(MarketplaceError::InvalidState(
                "Listing is no longer active".into(),
            ));
        }
        let fee_recipient = self.fee_recipient.clone().ok_or_else(|| {
            MarketplaceError::InvalidState("Fee recipient is not configured".into())
        })?;

        let buyer_id = env::predecessor_account_id();
        if buyer_id == listing.seller_id {
            return Err(MarketplaceError::InvalidInput(
                "Cannot purchase your own listing".into(),
            ));
        }

        let price = listing.price.0;
        let deposit = env::attached_deposit().as_yoctonear();
        if deposit < price {
            return Err(MarketplaceError::InsufficientDeposit(format!(
                "Attached deposit {} is less than price {}",
                deposit, price
            )));
        }

        // Listing deactivated before the XCC so no second buyer can race it;
        // resolve_purchase credits the buyer on transfer failure.
        self.internal_deactivate_listing(listing_id);
        // The deposit is reserved against owner sweeps until settlement turns
        // it into individual escrow credits.
        self.total_pending += deposit;

        Ok(ext_nft_contract::ext(listing.nft_contract_id.clone())
            .with_static_gas(GAS_FOR_NFT_TRANSFER)
            .with_attached_deposit(ONE_YOCTO)
            .nft_transfer(
                buyer_id.clone(),
                listing.token_id.clone(),
                Some(listing.approval_id),
                Some("Purchased on the patent marketplace".to_string()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_RESOLVE_PURCHASE)
                    .resolve_purchase(
                        listing_id,
                        listing.nft_contract_id,
                        listing.token_id,
                        listing.seller_id,
                        buyer_id,
                        U128(price),
                        U128(deposit),
                        self.fee_bps,
                        fee_recipient,
                    ),
            ))
    }

    /// Only callable by this contract. Safety: must not panic; the buyer's
    /// deposit is already held by this contract and ends up in escrow credits
    /// on both branches.
    #[private]
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_purchase(
        &mut self,
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
        buyer_id: AccountId,
        price: U128,
        deposit: U128,
        fee_bps: u16,
        fee_recipient: AccountId,
    ) {
        let success = matches!(env::promise_result(0), PromiseResult::Successful(_));
        if !success {
            env::log_str("NFT transfer failed; crediting buyer's deposit back");
        }
        self.internal_finalize_purchase(
            success,
            listing_id,
            nft_contract_id,
            token_id,
            seller_id,
            buyer_id,
            price.0,
            deposit.0,
            fee_bps,
            fee_recipient,
        );
    }

    /// Pull-payment withdrawal: the caller's entire pending balance, zeroed
    /// before the transfer promise is created.
    #[handle_result]
    pub fn withdraw_funds(&mut self) -> Result<Promise, MarketplaceError> {
        let account_id = env::predecessor_account_id();
        let amount = self
            .pending_withdrawals
            .get(&account_id)
            .copied()
            .unwrap_or(0);
        if amount == 0 {
            return Err(MarketplaceError::NotFound(
                "No funds pending withdrawal".into(),
            ));
        }

        self.pending_withdrawals.remove(&account_id);
        self.total_pending -= amount;

        MarketplaceEvent::FundsWithdrawn {
            account_id: account_id.clone(),
            amount: U128(amount),
        }
        .emit();
        Ok(Promise::new(account_id).transfer(NearToken::from_yoctonear(amount)))
    }

    /// Deactivates a listing. Seller or contract owner; does not require the
    /// NFT approval to still be current, so stale listings can always be
    /// cleaned up.
    ///
    /// Panics if attached deposit != 1 yoctoNEAR.
    #[payable]
    #[handle_result]
    pub fn cancel_listing(&mut self, listing_id: u64) -> Result<(), MarketplaceError> {
        check_one_yocto()?;

        let listing = self
            .listings
            .get(&listing_id)
            .ok_or_else(MarketplaceError::listing_not_found)?
            .clone();
        if !listing.active {
            return Err(MarketplaceError::InvalidState(
                "Listing is no longer active".into(),
            ));
        }

        let caller = env::predecessor_account_id();
        if caller != listing.seller_id && caller != self.owner_id {
            return Err(MarketplaceError::Unauthorized(
                "Only the seller or the contract owner can cancel".into(),
            ));
        }

        self.internal_deactivate_listing(listing_id);
        MarketplaceEvent::ListingCancelled {
            listing_id,
            nft_contract_id: listing.nft_contract_id,
            token_id: listing.token_id,
            seller_id: listing.seller_id,
        }
        .emit();
        Ok(())
    }

    /// Re-prices an active listing. Seller only; ownership and approval are
    /// not re-validated, the sale-time transfer is the enforcement point.
    ///
    /// Panics if attached deposit != 1 yoctoNEAR.
    #[payable]
    #[handle_result]
    pub fn update_listing_price(
        &mut self,
        listing_id: u64,
        new_price: U128,
    ) -> Result<(), MarketplaceError> {
        check_one_yocto()?;
        if new_price.0 == 0 {
            return Err(MarketplaceError::InvalidInput(
                "Price must be greater than 0".into(),
            ));
        }

        let caller = env::predecessor_account_id();
        let listing = self
            .listings
            .get_mut(&listing_id)
            .ok_or_else(MarketplaceError::listing_not_found)?;
        if !listing.active {
            return Err(MarketplaceError::InvalidState(
                "Listing is no longer active".into(),
            ));
        }
        if caller != listing.seller_id {
            return Err(MarketplaceError::Unauthorized(
                "Only the seller can update the price".into(),
            ));
        }

        let old_price = listing.price;
        listing.price = new_price;

        MarketplaceEvent::ListingPriceUpdated {
            listing_id,
            old_price,
            new_price,
        }
        .emit();
        Ok(())
    }
}
