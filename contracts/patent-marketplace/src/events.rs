use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

#[near(event_json(standard = "nep297"))]
pub enum MarketplaceEvent {
    #[event_version("1.0.0")]
    NftListed {
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
        price: U128,
    },
    #[event_version("1.0.0")]
    NftSold {
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
        buyer_id: AccountId,
        price: U128,
        fee: U128,
    },
    #[event_version("1.0.0")]
    ListingCancelled {
        listing_id: u64,
        nft_contract_id: AccountId,
        token_id: String,
        seller_id: AccountId,
    },
    #[event_version("1.0.0")]
    ListingPriceUpdated {
        listing_id: u64,
        old_price: U128,
        new_price: U128,
    },
    #[event_version("1.0.0")]
    PurchaseFailed {
        listing_id: u64,
        buyer_id: AccountId,
        refund_credit: U128,
    },
    #[event_version("1.0.0")]
    FundsDeposited {
        account_id: AccountId,
        amount: U128,
        balance: U128,
    },
    #[event_version("1.0.0")]
    FundsWithdrawn {
        account_id: AccountId,
        amount: U128,
    },
    #[event_version("1.0.0")]
    PlatformFeeUpdated { old_bps: u16, new_bps: u16 },
    #[event_version("1.0.0")]
    FeeRecipientUpdated { fee_recipient: AccountId },
    #[event_version("1.0.0")]
    EmergencyWithdrawal {
        owner_id: AccountId,
        amount: U128,
    },
}
