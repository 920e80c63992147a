//! Typed error handling for the patent marketplace.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum MarketplaceError {
    /// Caller lacks permission for this operation.
    Unauthorized(String),
    /// Invalid parameters from the caller.
    InvalidInput(String),
    /// Requested listing or balance does not exist.
    NotFound(String),
    /// Operation not allowed given current listing or contract state.
    InvalidState(String),
    /// Attached deposit is too low.
    InsufficientDeposit(String),
}

impl std::fmt::Display for MarketplaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::InsufficientDeposit(msg) => write!(f, "Insufficient deposit: {}", msg),
        }
    }
}

impl MarketplaceError {
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only owner can call this method".into())
    }
    pub fn listing_not_found() -> Self {
        Self::NotFound("No listing found".into())
    }
}
