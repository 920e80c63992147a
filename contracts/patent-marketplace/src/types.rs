use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

/// A patent NFT offered for sale. The NFT never enters marketplace custody;
/// the standing NEP-178 approval recorded here is pulled at sale time.
///
/// `active` is one-way: it goes false on sale or cancellation and never back.
/// Relisting allocates a fresh listing ID.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct Listing {
    pub listing_id: u64,
    pub nft_contract_id: AccountId,
    pub token_id: String,
    pub seller_id: AccountId,
    pub approval_id: u64,
    pub price: U128,
    pub active: bool,
}

/// Current platform fee configuration.
#[near(serializers = [json])]
pub struct FeeConfig {
    pub fee_bps: u16,
    pub fee_recipient: Option<AccountId>,
}
