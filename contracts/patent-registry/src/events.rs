use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

#[near(event_json(standard = "nep297"))]
pub enum RegistryEvent {
    #[event_version("1.0.0")]
    PatentMinted {
        owner_id: AccountId,
        token_id: String,
        patent_number: String,
        uri: String,
    },
    #[event_version("1.0.0")]
    AdminPatentMinted {
        owner_id: AccountId,
        token_id: String,
        patent_number: String,
        uri: String,
    },
    #[event_version("1.0.0")]
    MintPriceUpdated { old_price: U128, new_price: U128 },
    #[event_version("1.0.0")]
    BaseUriUpdated { base_uri: String },
    #[event_version("1.0.0")]
    RoyaltyUpdated { receiver_id: AccountId, bps: u16 },
    #[event_version("1.0.0")]
    FeesWithdrawn { receiver_id: AccountId, amount: U128 },
}
