// Internal helper functions for the marketplace

use crate::*;
use near_sdk::json_types::U128;
use near_sdk::{env, AccountId, NearToken};
use primitive_types::U256;

pub(crate) fn check_one_yocto() -> Result<(), MarketplaceError> {
    if env::attached_deposit() != NearToken::from_yoctonear(1) {
        return Err(MarketplaceError::InsufficientDeposit(
            "Requires attached deposit of exactly 1 yoctoNEAR".into(),
        ));
    }
    Ok(())
}

pub(crate) fn check_at_least_one_yocto() -> Result<(), MarketplaceError> {
    if env::attached_deposit() < NearToken::from_yoctonear(1) {
        return Err(MarketplaceError::InsufficientDeposit(
            "Requires attached deposit of at least 1 yoctoNEAR".into(),
        ));
    }
    Ok(())
}

/// `price * fee_bps / 10000` without intermediate overflow.
pub(crate) fn compute_fee(price: u128, fee_bps: u16) -> u128 {
    (U256::from(price) * U256::from(fee_bps) / U256::from(BASIS_POINTS)).as_u128()
}

impl Contract {
    /// `:` cannot appear in account IDs, so the key is unambiguous.
    pub(crate) fn make_listing_key(nft_contract_id: &AccountId, token_id: &str) -> String {
        format!("{}:{}", nft_contract_id, token_id)
    }

    pub(crate) fn assert_owner(&self) -> Result<(), MarketplaceError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(MarketplaceError::only_owner());
        }
        Ok(())
    }

    /// Stores a verified listing under a fresh ID and indexes it. Caller has
    /// already checked that no active listing exists for the pair.
    pub(crate) fn internal_add_listing(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        approval_id: u64,
        price: U128,
        seller_id: AccountId,
    ) -> u64 {
        let listing_id = self.next_listing_id;
        self.next_listing_id += 1;

        let key = Contract::make_listing_key(&nft_contract_id, &token_id);
        self.listings.insert(
            listing_id,
            Listing {
                listing_id,
                nft_contract_id: nft_contract_id.clone(),
                token_id: token_id.clone(),
                seller_id: seller_id.clone(),
                approval_id,
                price,
                active: true,
            },
        );
        self.token_to_listing.insert(key, listing_id);

        MarketplaceEvent::NftListed {
            listing_id,
            nft_contract_id,
            token_id,
            seller_id,
            price,
        }
        .emit();
        listing_id
    }

    /// Marks the listing inactive and clears the reverse index. The listing
    /// record itself is kept for auditability.
    pub(crate) fn internal_deactivate_listing(&mut self, listing_id: u64) {
        if let Some(listing) = self.listings.get_mut(&listing_id) {
            listing.active = false;
            let key = Contract::make_listing_key(&listing.nft_contract_id, &listing.token_id);
            self.token_to_listing.remove(&key);
        }
    }

    /// Credits an account's escrowed pull-payment balance.
    pub(crate) fn internal_credit(&mut self, account_id: &AccountId, amount: u128) {
        if amount == 0 {
            return;
        }
        let balance = self
            .pending_withdrawals
            .get(account_id)
            .copied()
            .unwrap_or(0)
            + amount;
        self.pending_withdrawals.insert(account_id.clone(), balance);
        self.total_pending += amount;

        MarketplaceEvent::FundsDeposited {
            account_id: account_id.clone(),
            amount: U128(amount),
            balance: U128(balance),
        }
        .emit();
    }

    /// Converts the purchase-time deposit reservation into individual escrow
    /// credits once the NFT transfer outcome is known. The reservation and
    /// the credits both total `deposit`, so `total_pending` is unchanged by
    /// settlement as a whole.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_finalize_purchase(
        &mut self,
        success: bool,
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
        buyer_id: AccountId,
        price: u128,
        deposit: u128,
        fee_bps: u16,
        fee_recipient: AccountId,
    ) {
        self.total_pending -= deposit;
        if success {
            self.internal_settle_purchase(
                listing_id,
                nft_contract_id,
                token_id,
                seller_id,
                buyer_id,
                price,
                deposit,
                fee_bps,
                fee_recipient,
            );
        } else {
            self.internal_refund_purchase(listing_id, buyer_id, deposit);
        }
    }

    /// Settlement after a confirmed NFT transfer. Splits the buyer's deposit
    /// into seller proceeds, platform fee and overpayment refund; every
    /// yoctoNEAR of the deposit lands in exactly one pending balance.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_settle_purchase(
        &mut self,
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
        buyer_id: AccountId,
        price: u128,
        deposit: u128,
        fee_bps: u16,
        fee_recipient: AccountId,
    ) {
        let fee = compute_fee(price, fee_bps);
        self.internal_credit(&seller_id, price - fee);
        self.internal_credit(&fee_recipient, fee);
        self.internal_credit(&buyer_id, deposit - price);

        MarketplaceEvent::NftSold {
            listing_id,
            nft_contract_id,
            token_id,
            seller_id,
            buyer_id,
            price: U128(price),
            fee: U128(fee),
        }
        .emit();
    }

    /// Settlement after a failed NFT transfer: the buyer's full deposit comes
    /// back as an escrow credit. The listing stays deactivated.
    pub(crate) fn internal_refund_purchase(
        &mut self,
        listing_id: u64,
        buyer_id: AccountId,
        deposit: u128,
    ) {
        self.internal_credit(&buyer_id, deposit);
        MarketplaceEvent::PurchaseFailed {
            listing_id,
            buyer_id,
            refund_credit: U128(deposit),
        }
        .emit();
    }
}
