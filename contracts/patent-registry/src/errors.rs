//! Typed error handling for the patent registry.
//!
//! Uses `#[derive(near_sdk::FunctionError)]` from the NEAR SDK to enable
//! `#[handle_result]` on public methods. When a method returns
//! `Err(RegistryError::Xxx)`, the SDK calls `env::panic_str()` with the
//! Display message — same on-wire behaviour as raw panics, but with
//! structured, testable code.

use near_sdk_macros::NearSchema;

#[derive(NearSchema, near_sdk::FunctionError)]
#[abi(borsh, json)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum RegistryError {
    /// Caller lacks permission (wrong owner, etc.)
    Unauthorized(String),
    /// Invalid parameters or data from the caller.
    InvalidInput(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Operation not allowed given current contract state.
    InvalidState(String),
    /// Attached deposit is too low.
    InsufficientDeposit(String),
}

impl std::fmt::Display for RegistryError {
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

impl RegistryError {
    pub fn only_owner() -> Self {
        Self::Unauthorized("Only owner can call this method".into())
    }
    pub fn patent_already_minted(patent_number: &str) -> Self {
        Self::InvalidState(format!("Patent {} is already minted", patent_number))
    }
}
