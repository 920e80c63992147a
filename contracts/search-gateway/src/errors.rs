//! Typed error handling for the search payment gateway.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum GatewayError {
    /// Caller lacks permission (wrong owner, wrong token contract).
    Unauthorized(String),
    /// Invalid parameters from the caller.
    InvalidInput(String),
    /// Operation not allowed given current contract state.
    InvalidState(String),
    /// Attached deposit is too low.
    InsufficientDeposit(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::InsufficientDeposit(msg) => write!(f, "Insufficient deposit: {}", msg),
        }
    }
}

impl GatewayError {
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only owner can call this method".into())
    }
    pub fn paused() -> Self {
        Self::InvalidState("Contract is paused".into())
    }
}
