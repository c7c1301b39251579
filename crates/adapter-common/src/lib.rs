pub mod address;
pub mod amount;
pub mod denomination;
pub mod error;
pub mod fees;
pub mod networks;
pub mod plugin;
pub mod token;
pub mod uri;

use error::Error;

// Re-exports for convenience
pub use address::AddressRule;
pub use denomination::{CurrencyInfo, Denomination, MetaToken};
pub use fees::{calc_fee_parameters, FeeParameters, FeeSchedule, FeeTier, NetworkFees, ResolvedFeeSchedule};
pub use networks::NetworkConfig;
pub use plugin::{CurrencyPlugin, KeyManager, WalletDataStore};
pub use token::TokenMetadata;
pub use uri::{EncodeRequest, ParsedPaymentRequest, PaymentUriCodec};

/// Parse a payment URI for a network.
///
/// Accepts `scheme:address?params` URIs for any of the network's scheme
/// aliases, the network's web redirect link, and bare addresses.
pub fn parse_payment_uri(network: &NetworkConfig, uri: &str) -> Result<ParsedPaymentRequest, Error> {
    uri::parse_payment_uri(network, uri)
}

/// Encode a payment request as a URI for a network.
pub fn encode_payment_uri(network: &NetworkConfig, request: &EncodeRequest) -> Result<String, Error> {
    uri::encode_payment_uri(network, request)
}

/// Resolve a fully populated fee entry for `network_id`.
pub fn resolve_fee_schedule(raw: &FeeSchedule, network_id: &str) -> Result<ResolvedFeeSchedule, Error> {
    fees::resolve_fee_schedule(raw, network_id)
}

/// Convert a display amount to a native integer amount.
pub fn to_native_amount(display_amount: &str, denom: &Denomination) -> Result<String, Error> {
    amount::to_native(display_amount, denom)
}

/// Convert a native integer amount to a display amount with at most
/// `precision` fractional digits.
pub fn to_display_amount(native_amount: &str, denom: &Denomination, precision: u32) -> Result<String, Error> {
    amount::to_display(native_amount, denom, precision)
}
