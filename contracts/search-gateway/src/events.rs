use crate::types::Currency;
use near_sdk::json_types::U128;
use near_sdk::{near, AccountId};

#[near(event_json(standard = "nep297"))]
pub enum GatewayEvent {
    #[event_version("1.0.0")]
    PaymentReceived {
        payer_id: AccountId,
        currency: Currency,
        amount: U128,
        searches_granted: u64,
    },
    #[event_version("1.0.0")]
    SearchPriceUpdated {
        currency: Currency,
        old_price: U128,
        new_price: U128,
    },
    #[event_version("1.0.0")]
    TokenAddressUpdated {
        currency: Currency,
        token_id: AccountId,
    },
    #[event_version("1.0.0")]
    Paused { owner_id: AccountId },
    #[event_version("1.0.0")]
    Unpaused { owner_id: AccountId },
    #[event_version("1.0.0")]
    FundsWithdrawn {
        currency: Currency,
        receiver_id: AccountId,
        amount: U128,
    },
}
