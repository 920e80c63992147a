//! Patent registry and mint engine. NEP-171/177/178/181 compliant, with
//! NEP-199 royalty payouts and a normalized-patent-number uniqueness map.

use near_contract_standards::non_fungible_token::metadata::{
    NFTContractMetadata, NonFungibleTokenMetadataProvider, TokenMetadata, NFT_METADATA_SPEC,
};
use near_contract_standards::non_fungible_token::{NonFungibleToken, Token, TokenId};
use near_sdk::collections::LazyOption;
use near_sdk::json_types::U128;
use near_sdk::store::LookupMap;
use near_sdk::{
    env, near, AccountId, BorshStorageKey, NearToken, PanicOnDefault, Promise, PromiseOrValue,
};
use std::collections::HashMap;

mod errors;
mod events;
mod normalize;

pub use errors::RegistryError;
pub use events::RegistryEvent;
pub use normalize::{normalize_patent_number, patent_key};

/// Longest raw patent-number string accepted at mint time.
pub const MAX_PATENT_NUMBER_LEN: usize = 64;
/// Longest IPFS hash accepted at mint time.
pub const MAX_IPFS_HASH_LEN: usize = 128;
/// Maximum royalty (5000 = 50%).
pub const MAX_ROYALTY_BPS: u16 = 5_000;
/// Basis points denominator (10,000 = 100%).
pub const BASIS_POINTS: u16 = 10_000;

#[derive(BorshStorageKey)]
#[near]
enum StorageKey {
    NonFungibleToken,
    Metadata,
    TokenMetadata,
    Enumeration,
    Approval,
    PatentToToken,
}

/// NEP-199 payout map: payee -> amount in yoctoNEAR.
#[near(serializers = [json])]
pub struct Payout {
    pub payout: HashMap<AccountId, U128>,
}

#[near(serializers = [borsh, json])]
#[derive(Clone)]
pub struct RoyaltyConfig {
    pub receiver_id: AccountId,
    pub bps: u16,
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    tokens: NonFungibleToken,
    metadata: LazyOption<NFTContractMetadata>,
    owner_id: AccountId,
    /// Next sequential token ID; assigned at mint, never reused.
    next_token_id: u64,
    /// yoctoNEAR required per mint.
    mint_price: u128,
    /// sha256(normalized patent number) -> token ID. Absent = unminted.
    patent_to_token: LookupMap<Vec<u8>, u64>,
    royalty: Option<RoyaltyConfig>,
    /// Mint deposits retained and not yet withdrawn by the owner.
    collected_fees: u128,
}

#[near]
impl Contract {
    #[init]
    pub fn new(owner_id: AccountId, mint_price: U128, base_uri: Option<String>) -> Self {
        let metadata = NFTContractMetadata {
            spec: NFT_METADATA_SPEC.to_string(),
            name: "Patent NFT Registry".to_string(),
            symbol: "PATENT".to_string(),
            icon: None,
            base_uri,
            reference: None,
            reference_hash: None,
        };
        metadata.assert_valid();
        Self {
            tokens: NonFungibleToken::new(
                StorageKey::NonFungibleToken,
                owner_id.clone(),
                Some(StorageKey::TokenMetadata),
                Some(StorageKey::Enumeration),
                Some(StorageKey::Approval),
            ),
            metadata: LazyOption::new(StorageKey::Metadata, Some(&metadata)),
            owner_id,
            next_token_id: 1,
            mint_price: mint_price.0,
            patent_to_token: LookupMap::new(StorageKey::PatentToToken),
            royalty: None,
            collected_fees: 0,
        }
    }

    // --- Minting ---

    /// Mints one NFT per normalized patent number. The full attached deposit
    /// is retained as the mint fee; excess is not refunded.
    #[payable]
    #[handle_result]
    pub fn mint_patent_nft(
        &mut self,
        receiver_id: AccountId,
        patent_number: String,
        ipfs_hash: String,
    ) -> Result<TokenId, RegistryError> {
        let deposit = env::attached_deposit().as_yoctonear();
        if deposit < self.mint_price {
            return Err(RegistryError::InsufficientDeposit(format!(
                "Minting requires {} yoctoNEAR, got {}",
                self.mint_price, deposit
            )));
        }

        let token = self.internal_mint_patent(receiver_id.clone(), &patent_number, &ipfs_hash)?;
        self.collected_fees += deposit;

        RegistryEvent::PatentMinted {
            owner_id: receiver_id,
            token_id: token.token_id.clone(),
            patent_number,
            uri: ipfs_uri(&ipfs_hash),
        }
        .emit();
        Ok(token.token_id)
    }

    /// Fee-free mint bypass for special cases. Owner only; the uniqueness
    /// rule still applies.
    #[handle_result]
    pub fn mint_patent(
        &mut self,
        receiver_id: AccountId,
        patent_number: String,
        ipfs_hash: String,
    ) -> Result<TokenId, RegistryError> {
        self.assert_owner()?;
        let token = self.internal_mint_patent(receiver_id.clone(), &patent_number, &ipfs_hash)?;
        RegistryEvent::AdminPatentMinted {
            owner_id: receiver_id,
            token_id: token.token_id.clone(),
            patent_number,
            uri: ipfs_uri(&ipfs_hash),
        }
        .emit();
        Ok(token.token_id)
    }

    // --- Views ---

    pub fn patent_exists(&self, patent_number: String) -> bool {
        self.patent_to_token.contains_key(&patent_key(&patent_number))
    }

    pub fn patent_token_id(&self, patent_number: String) -> Option<TokenId> {
        self.patent_to_token
            .get(&patent_key(&patent_number))
            .map(|id| id.to_string())
    }

    pub fn get_mint_price(&self) -> U128 {
        U128(self.mint_price)
    }

    pub fn get_collected_fees(&self) -> U128 {
        U128(self.collected_fees)
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    pub fn get_royalty(&self) -> Option<RoyaltyConfig> {
        self.royalty.clone()
    }

    // --- Owner ---

    #[handle_result]
    pub fn set_mint_price(&mut self, new_price: U128) -> Result<(), RegistryError> {
        self.assert_owner()?;
        let old_price = self.mint_price;
        self.mint_price = new_price.0;
        RegistryEvent::MintPriceUpdated {
            old_price: U128(old_price),
            new_price,
        }
        .emit();
        Ok(())
    }

    #[handle_result]
    pub fn set_base_metadata_uri(&mut self, base_uri: String) -> Result<(), RegistryError> {
        self.assert_owner()?;
        if base_uri.is_empty() {
            return Err(RegistryError::InvalidInput("Base URI cannot be empty".into()));
        }
        let mut metadata = self
            .metadata
            .get()
            .unwrap_or_else(|| env::panic_str("Metadata not initialized"));
        metadata.base_uri = Some(base_uri.clone());
        self.metadata.set(&metadata);
        RegistryEvent::BaseUriUpdated { base_uri }.emit();
        Ok(())
    }

    #[handle_result]
    pub fn set_royalty(&mut self, receiver_id: AccountId, bps: u16) -> Result<(), RegistryError> {
        self.assert_owner()?;
        if bps > MAX_ROYALTY_BPS {
            return Err(RegistryError::InvalidInput(format!(
                "Royalty exceeds maximum of {} bps",
                MAX_ROYALTY_BPS
            )));
        }
        self.royalty = Some(RoyaltyConfig {
            receiver_id: receiver_id.clone(),
            bps,
        });
        RegistryEvent::RoyaltyUpdated { receiver_id, bps }.emit();
        Ok(())
    }

    /// Transfers all collected mint fees to the owner. Balance is zeroed
    /// before the transfer promise is created.
    #[handle_result]
    pub fn withdraw(&mut self) -> Result<Promise, RegistryError> {
        self.assert_owner()?;
        if self.collected_fees == 0 {
            return Err(RegistryError::InvalidState("No fees to withdraw".into()));
        }
        let amount = self.collected_fees;
        self.collected_fees = 0;
        RegistryEvent::FeesWithdrawn {
            receiver_id: self.owner_id.clone(),
            amount: U128(amount),
        }
        .emit();
        Ok(Promise::new(self.owner_id.clone()).transfer(NearToken::from_yoctonear(amount)))
    }

    // --- NEP-199 Royalties ---

    pub fn nft_payout(
        &self,
        token_id: TokenId,
        balance: U128,
        max_len_payout: Option<u32>,
    ) -> Payout {
        let owner_id = self
            .tokens
            .owner_by_id
            .get(&token_id)
            .unwrap_or_else(|| env::panic_str("Token not found"));
        self.compute_payout(&owner_id, balance.0, max_len_payout.unwrap_or(10))
    }

    /// Transfers the token and returns the payout split for `balance`.
    /// Requires 1 yoctoNEAR like `nft_transfer`.
    #[payable]
    pub fn nft_transfer_payout(
        &mut self,
        receiver_id: AccountId,
        token_id: TokenId,
        approval_id: Option<u64>,
        memo: Option<String>,
        balance: U128,
        max_len_payout: Option<u32>,
    ) -> Payout {
        let previous_owner = self
            .tokens
            .owner_by_id
            .get(&token_id)
            .unwrap_or_else(|| env::panic_str("Token not found"));
        let payout = self.compute_payout(&previous_owner, balance.0, max_len_payout.unwrap_or(10));
        self.tokens
            .nft_transfer(receiver_id, token_id, approval_id, memo);
        payout
    }

    // --- Internal ---

    fn assert_owner(&self) -> Result<(), RegistryError> {
        if env::predecessor_account_id() != self.owner_id {
            return Err(RegistryError::only_owner());
        }
        Ok(())
    }

    /// Shared mint path. The uniqueness mapping is written before the token
    /// ledger is touched so a duplicate can never slip through, whatever the
    /// mint hooks observe.
    fn internal_mint_patent(
        &mut self,
        receiver_id: AccountId,
        patent_number: &str,
        ipfs_hash: &str,
    ) -> Result<Token, RegistryError> {
        if ipfs_hash.is_empty() {
            return Err(RegistryError::InvalidInput("IPFS hash cannot be empty".into()));
        }
        if ipfs_hash.len() > MAX_IPFS_HASH_LEN {
            return Err(RegistryError::InvalidInput(format!(
                "IPFS hash too long (max {} characters)",
                MAX_IPFS_HASH_LEN
            )));
        }
        if patent_number.len() > MAX_PATENT_NUMBER_LEN {
            return Err(RegistryError::InvalidInput(format!(
                "Patent number too long (max {} characters)",
                MAX_PATENT_NUMBER_LEN
            )));
        }
        if normalize_patent_number(patent_number).is_empty() {
            return Err(RegistryError::InvalidInput(
                "Patent number cannot be empty".into(),
            ));
        }

        let key = patent_key(patent_number);
        if self.patent_to_token.contains_key(&key) {
            return Err(RegistryError::patent_already_minted(patent_number));
        }

        let token_id = self.next_token_id;
        self.next_token_id = token_id
            .checked_add(1)
            .unwrap_or_else(|| env::panic_str("Token ID counter overflow"));
        self.patent_to_token.insert(key, token_id);

        let metadata = TokenMetadata {
            title: Some(format!("Patent {}", normalize_patent_number(patent_number))),
            description: None,
            media: None,
            media_hash: None,
            copies: Some(1),
            issued_at: Some(env::block_timestamp().to_string()),
            expires_at: None,
            starts_at: None,
            updated_at: None,
            extra: None,
            reference: Some(ipfs_uri(ipfs_hash)),
            reference_hash: None,
        };

        // refund_id None: the whole deposit is the mint fee, storage included.
        let token = self.tokens.internal_mint_with_refund(
            token_id.to_string(),
            receiver_id.clone(),
            Some(metadata),
            None,
        );

        near_contract_standards::non_fungible_token::events::NftMint {
            owner_id: &receiver_id,
            token_ids: &[&token.token_id],
            memo: None,
        }
        .emit();

        Ok(token)
    }

    fn compute_payout(&self, owner_id: &AccountId, balance: u128, max_len: u32) -> Payout {
        let mut payout_map = HashMap::new();
        let mut royalty_amount: u128 = 0;

        if let Some(royalty) = &self.royalty {
            if max_len < 2 && royalty.receiver_id != *owner_id {
                env::panic_str("Royalty recipients exceed max_len_payout");
            }
            royalty_amount = balance * royalty.bps as u128 / BASIS_POINTS as u128;
            if royalty_amount > 0 {
                payout_map.insert(royalty.receiver_id.clone(), U128(royalty_amount));
            }
        }

        let owner_amount = balance.saturating_sub(royalty_amount);
        if owner_amount > 0 {
            payout_map
                .entry(owner_id.clone())
                .and_modify(|v| v.0 += owner_amount)
                .or_insert(U128(owner_amount));
        }

        Payout { payout: payout_map }
    }
}

pub fn ipfs_uri(ipfs_hash: &str) -> String {
    format!("ipfs://{}", ipfs_hash)
}

near_contract_standards::impl_non_fungible_token_core!(Contract, tokens);
near_contract_standards::impl_non_fungible_token_approval!(Contract, tokens);
near_contract_standards::impl_non_fungible_token_enumeration!(Contract, tokens);

#[near]
impl NonFungibleTokenMetadataProvider for Contract {
    fn nft_metadata(&self) -> NFTContractMetadata {
        self.metadata.get().unwrap()
    }
}
