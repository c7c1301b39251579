use thiserror::Error;

/// Unified error type for the adapter-common library.
///
/// Each variant is terminal for the call that produced it. The same input
/// always reproduces the same error, so nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("invalid public address: {0}")]
    InvalidPublicAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid token symbol: {0}")]
    InvalidTokenSymbol(String),

    #[error("invalid token decimals: {0}")]
    InvalidDecimals(String),

    /// A currency code that should have been registered at load time.
    #[error("internal error, unknown currency code: {0}")]
    InvalidCurrencyCode(String),

    #[error("unsupported wallet type: {0}")]
    InvalidWalletType(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Stable tag for the error kind, suitable for surfacing in a UI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidUri(_) => "InvalidUriError",
            Error::InvalidPublicAddress(_) => "InvalidPublicAddressError",
            Error::InvalidAmount(_) => "InvalidAmountError",
            Error::InvalidTokenSymbol(_) => "InvalidTokenSymbolError",
            Error::InvalidDecimals(_) => "InvalidDecimalsError",
            Error::InvalidCurrencyCode(_) => "InternalErrorInvalidCurrencyCode",
            Error::InvalidWalletType(_) => "InvalidWalletType",
            Error::Config(_) => "ConfigError",
        }
    }
}

/// Errors found while loading currency or fee configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid denomination {name}: {reason}")]
    InvalidDenomination { name: String, reason: String },

    #[error("invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
