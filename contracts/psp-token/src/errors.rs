//! Typed error handling for the PSP token sale ledger.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TokenSaleError {
    /// Caller lacks permission (wrong owner, unauthorized spender).
    Unauthorized(String),
    /// Invalid parameters or dust amounts from the caller.
    InvalidInput(String),
    /// Operation not allowed given current contract state.
    InvalidState(String),
    /// Attached deposit is too low.
    InsufficientDeposit(String),
    /// Mint would push total supply over MAX_SUPPLY.
    SupplyCapExceeded(String),
}

impl std::fmt::Display for TokenSaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::InsufficientDeposit(msg) => write!(f, "Insufficient deposit: {}", msg),
            Self::SupplyCapExceeded(msg) => write!(f, "Supply cap exceeded: {}", msg),
        }
    }
}

impl TokenSaleError {
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only owner can call this method".into())
    }
    pub fn paused() -> Self {
        Self::InvalidState("Contract is paused".into())
    }
}
