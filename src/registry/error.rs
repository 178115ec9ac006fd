//! Registry error types
//!
//! Raised while turning request parameters into registry keys. Registry
//! mutations themselves cannot fail.

/// Error type for registry key parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Client id was empty
    #[error("clientId must not be empty")]
    EmptyClientId,
    /// Stream kind is not one of `screen` or `webcam`
    #[error("Unknown stream type: {0}")]
    UnknownStreamKind(String),
}
