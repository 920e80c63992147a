// External contract interfaces for cross-contract calls
//
// `#[ext_contract]` generates helper structs that the compiler flags as dead_code
// even though they are used at runtime for cross-contract calls.
#![allow(dead_code)]

use near_sdk::json_types::U128;
use near_sdk::{ext_contract, near, AccountId};

/// NEP-171 token view, narrowed to the fields the marketplace verifies.
/// Unknown JSON fields (metadata, approvals) are ignored on deserialization.
#[near(serializers = [json])]
#[derive(Clone)]
pub struct Token {
    pub token_id: String,
    pub owner_id: AccountId,
}

/// External patent NFT contract interface (NEP-171 + NEP-178).
#[ext_contract(ext_nft_contract)]
pub trait ExtNftContract {
    fn nft_transfer(
        &mut self,
        receiver_id: AccountId,
        token_id: String,
        approval_id: Option<u64>,
        memo: Option<String>,
    );

    fn nft_is_approved(
        &self,
        token_id: String,
        approved_account_id: AccountId,
        approval_id: Option<u64>,
    ) -> bool;

    fn nft_token(&self, token_id: String) -> Option<Token>;
}

/// Self callback interface.
#[ext_contract(ext_self)]
pub trait ExtSelf {
    fn process_listing(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
        approval_id: u64,
        price: U128,
        seller_id: AccountId,
    );

    fn resolve_purchase(
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
    );
}
