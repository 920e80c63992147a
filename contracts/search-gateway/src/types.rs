use near_sdk::json_types::U128;
use near_sdk::near;

/// Accepted payment currencies. NEAR is the native coin; USDC and PSP are
/// NEP-141 tokens referenced by account ID.
#[near(serializers = [json, borsh])]
#[serde(rename_all = "snake_case")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Currency {
    Near,
    Usdc,
    Psp,
}

/// Per-user cumulative audit trail. Monotonic: totals and the search counter
/// only ever increase.
#[near(serializers = [json, borsh])]
#[derive(Clone, Default)]
pub struct UserStats {
    /// yoctoNEAR.
    pub total_paid_near: U128,
    /// USDC base units (6 decimals).
    pub total_paid_usdc: U128,
    /// PSP base units (18 decimals).
    pub total_paid_psp: U128,
    pub searches_purchased: u64,
}

/// Snapshot of all three configured prices.
#[near(serializers = [json])]
pub struct SearchPrices {
    pub near: U128,
    pub usdc: U128,
    pub psp: U128,
}
