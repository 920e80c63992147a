use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

#[near(event_json(standard = "nep297"))]
pub enum TokenSaleEvent {
    #[event_version("1.0.0")]
    TokensPurchased {
        buyer_id: AccountId,
        near_amount: U128,
        token_amount: U128,
    },
    #[event_version("1.0.0")]
    TokensRedeemed {
        redeemer_id: AccountId,
        token_amount: U128,
        near_amount: U128,
    },
    #[event_version("1.0.0")]
    TokensSpent {
        spender_id: AccountId,
        user_id: AccountId,
        amount: U128,
    },
    #[event_version("1.0.0")]
    TokenPriceUpdated { old_price: U128, new_price: U128 },
    #[event_version("1.0.0")]
    SpenderAuthorizationChanged {
        spender_id: AccountId,
        authorized: bool,
    },
    #[event_version("1.0.0")]
    Paused { owner_id: AccountId },
    #[event_version("1.0.0")]
    Unpaused { owner_id: AccountId },
    #[event_version("1.0.0")]
    NearWithdrawn { receiver_id: AccountId, amount: U128 },
}
