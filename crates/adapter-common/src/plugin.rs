use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::denomination::CurrencyInfo;
use crate::error::{ConfigError, Error};
use crate::fees::{FeeSchedule, ResolvedFeeSchedule};
use crate::networks::{self, NetworkConfig};
use crate::uri::{EncodeRequest, ParsedPaymentRequest, PaymentUriCodec};

/// `otherData` key holding the wallet's fee schedule.
pub const NETWORK_FEES_KEY: &str = "networkFees";

/// Bytes of entropy handed to key generation.
pub const KEY_ENTROPY_LEN: usize = 32;

/// Per-wallet mutable storage owned by the sync engine.
pub trait WalletDataStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

/// In-memory wallet data store for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataStore {
    values: HashMap<String, Value>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WalletDataStore for MemoryDataStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Source of cryptographically secure random bytes.
pub trait EntropySource {
    fn random_bytes(&mut self, len: usize) -> Vec<u8>;
}

/// Key generation and derivation, supplied by the key-management layer.
pub trait KeyManager {
    /// Generate private key material for `wallet_type` from `entropy`.
    fn generate_private_key(&self, wallet_type: &str, entropy: &[u8]) -> Result<Value, Error>;

    /// Derive the public address for previously generated key material.
    fn derive_public_key(&self, wallet_type: &str, keys: &Value) -> Result<String, Error>;
}

/// Network-specific entry point shared by every chain adapter.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyPlugin<'a> {
    network: &'a NetworkConfig,
}

impl CurrencyPlugin<'static> {
    /// Build a plugin for one of the built-in networks.
    pub fn builtin(plugin_id: &str) -> Option<Self> {
        networks::by_plugin_id(plugin_id).map(CurrencyPlugin::new)
    }
}

impl<'a> CurrencyPlugin<'a> {
    pub fn new(network: &'a NetworkConfig) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &'a NetworkConfig {
        self.network
    }

    pub fn currency_info(&self) -> &'a CurrencyInfo {
        &self.network.currency_info
    }

    pub fn parse_uri(&self, uri: &str) -> Result<ParsedPaymentRequest, Error> {
        PaymentUriCodec::new(self.network).parse(uri)
    }

    pub fn encode_uri(&self, request: &EncodeRequest) -> Result<String, Error> {
        PaymentUriCodec::new(self.network).encode(request)
    }

    pub fn is_valid_address(&self, address: &str) -> bool {
        self.network.address_rule.is_valid(address)
    }

    /// Strip the `wallet:` prefix and check the type against this network.
    pub fn check_wallet_type<'w>(&self, wallet_type: &'w str) -> Result<&'w str, Error> {
        let bare = wallet_type.strip_prefix("wallet:").unwrap_or(wallet_type);
        if self.network.wallet_types.iter().any(|t| t == bare) {
            Ok(bare)
        } else {
            Err(Error::InvalidWalletType(wallet_type.to_string()))
        }
    }

    /// Generate private key material after checking the wallet type.
    pub fn create_private_key(
        &self,
        wallet_type: &str,
        keys: &dyn KeyManager,
        entropy: &mut dyn EntropySource,
    ) -> Result<Value, Error> {
        let bare = self.check_wallet_type(wallet_type)?;
        let seed = entropy.random_bytes(KEY_ENTROPY_LEN);
        keys.generate_private_key(bare, &seed)
    }

    /// Derive the public address and check it against this network's rule.
    pub fn derive_public_key(
        &self,
        wallet_type: &str,
        key_material: &Value,
        keys: &dyn KeyManager,
    ) -> Result<String, Error> {
        let bare = self.check_wallet_type(wallet_type)?;
        let address = keys.derive_public_key(bare, key_material)?;
        self.network.address_rule.validate(&address)?;
        Ok(address)
    }

    /// Write first-run defaults into the wallet store, keeping existing values.
    pub fn seed_wallet_data(&self, store: &mut dyn WalletDataStore) -> Result<(), Error> {
        if store.get(NETWORK_FEES_KEY).is_none() {
            if let Some(ref fees) = self.network.currency_info.default_network_fees {
                let value = fees.to_json().map_err(ConfigError::from)?;
                store.set(NETWORK_FEES_KEY, value);
                debug!("seeded default network fees for {}", self.network.plugin_id());
            }
        }
        for (key, value) in &self.network.other_data_defaults {
            if store.get(key).is_none() {
                store.set(key, Value::String(value.clone()));
            }
        }
        Ok(())
    }

    /// The wallet's fee schedule, falling back to the bundled default table.
    pub fn fee_schedule(&self, store: &dyn WalletDataStore) -> Result<Option<FeeSchedule>, Error> {
        match store.get(NETWORK_FEES_KEY) {
            Some(value) => {
                let schedule: FeeSchedule =
                    serde_json::from_value(value).map_err(ConfigError::from)?;
                schedule.validate_complete()?;
                Ok(Some(schedule))
            }
            None => Ok(self.network.currency_info.default_network_fees.clone()),
        }
    }

    /// Resolve the fee entry for `network_id` from the wallet's schedule.
    pub fn resolve_fees(
        &self,
        store: &dyn WalletDataStore,
        network_id: &str,
    ) -> Result<ResolvedFeeSchedule, Error> {
        let schedule = self.fee_schedule(store)?.ok_or_else(|| {
            ConfigError::InvalidFeeSchedule(format!(
                "{} has no network fee table",
                self.network.plugin_id()
            ))
        })?;
        schedule.resolve(network_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::{DEFAULT_NETWORK, TOKEN_TRANSACTION};

    const XRP_ADDR: &str = "rEb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh";

    struct CountingEntropy(u8);

    impl EntropySource for CountingEntropy {
        fn random_bytes(&mut self, len: usize) -> Vec<u8> {
            (0..len)
                .map(|_| {
                    self.0 = self.0.wrapping_add(1);
                    self.0
                })
                .collect()
        }
    }

    /// Hands back the entropy it was given and a canned address.
    struct FakeKeys {
        address: &'static str,
    }

    impl KeyManager for FakeKeys {
        fn generate_private_key(&self, wallet_type: &str, entropy: &[u8]) -> Result<Value, Error> {
            Ok(serde_json::json!({ "type": wallet_type, "key": hex::encode(entropy) }))
        }

        fn derive_public_key(&self, _wallet_type: &str, _keys: &Value) -> Result<String, Error> {
            Ok(self.address.to_string())
        }
    }

    #[test]
    fn test_check_wallet_type() {
        let plugin = CurrencyPlugin::builtin("ripple").unwrap();
        assert_eq!(plugin.check_wallet_type("wallet:ripple").unwrap(), "ripple");
        assert_eq!(plugin.check_wallet_type("ripple-secp256k1").unwrap(), "ripple-secp256k1");
        let err = plugin.check_wallet_type("wallet:bitcoin").unwrap_err();
        assert_eq!(err.kind(), "InvalidWalletType");
    }

    #[test]
    fn test_create_private_key_uses_entropy() {
        let plugin = CurrencyPlugin::builtin("ripple").unwrap();
        let keys = FakeKeys { address: XRP_ADDR };
        let mut entropy = CountingEntropy(0);
        let material = plugin
            .create_private_key("wallet:ripple", &keys, &mut entropy)
            .unwrap();
        assert_eq!(material["type"], "ripple");
        assert_eq!(material["key"].as_str().unwrap().len(), KEY_ENTROPY_LEN * 2);

        let err = plugin
            .create_private_key("wallet:ethereum", &keys, &mut entropy)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidWalletType");
    }

    #[test]
    fn test_derive_public_key_is_validated() {
        let plugin = CurrencyPlugin::builtin("ripple").unwrap();
        let keys = FakeKeys { address: XRP_ADDR };
        let material = serde_json::json!({});
        assert_eq!(plugin.derive_public_key("wallet:ripple", &material, &keys).unwrap(), XRP_ADDR);

        let bad = FakeKeys { address: "not-an-address" };
        let err = plugin.derive_public_key("wallet:ripple", &material, &bad).unwrap_err();
        assert_eq!(err.kind(), "InvalidPublicAddressError");
    }

    #[test]
    fn test_seed_wallet_data() {
        let plugin = CurrencyPlugin::builtin("ethereum").unwrap();
        let mut store = MemoryDataStore::new();
        plugin.seed_wallet_data(&mut store).unwrap();
        assert_eq!(store.get("nextNonce"), Some(Value::String("0".to_string())));
        assert!(store.get(NETWORK_FEES_KEY).is_some());

        let ripple = CurrencyPlugin::builtin("ripple").unwrap();
        let mut store = MemoryDataStore::new();
        ripple.seed_wallet_data(&mut store).unwrap();
        assert_eq!(store.get("recommendedFee"), Some(Value::String("0".to_string())));
        assert!(store.get(NETWORK_FEES_KEY).is_none());
    }

    #[test]
    fn test_seed_keeps_existing_values() {
        let plugin = CurrencyPlugin::builtin("ethereum").unwrap();
        let mut store = MemoryDataStore::new();
        store.set("nextNonce", Value::String("42".to_string()));
        plugin.seed_wallet_data(&mut store).unwrap();
        assert_eq!(store.get("nextNonce"), Some(Value::String("42".to_string())));
    }

    #[test]
    fn test_resolve_fees_from_store() {
        let plugin = CurrencyPlugin::builtin("ethereum").unwrap();
        let mut store = MemoryDataStore::new();
        plugin.seed_wallet_data(&mut store).unwrap();

        let resolved = plugin
            .resolve_fees(&store, "2983987abc9837fbabc0982347ad828")
            .unwrap();
        let default = plugin
            .resolve_fees(&store, DEFAULT_NETWORK)
            .unwrap();
        assert_eq!(resolved.gas_price, default.gas_price);
        assert_eq!(resolved.gas_limit[TOKEN_TRANSACTION], "37124");
    }

    #[test]
    fn test_resolve_fees_rejects_bad_store_data() {
        let plugin = CurrencyPlugin::builtin("ethereum").unwrap();
        let mut store = MemoryDataStore::new();
        store.set(NETWORK_FEES_KEY, serde_json::json!({ "x": {} }));
        assert_eq!(plugin.resolve_fees(&store, "x").unwrap_err().kind(), "ConfigError");

        let eos = CurrencyPlugin::builtin("eos").unwrap();
        assert!(eos.resolve_fees(&MemoryDataStore::new(), "x").is_err());
    }

    #[test]
    fn test_fee_schedule_rejects_incomplete_default() {
        let plugin = CurrencyPlugin::builtin("ethereum").unwrap();
        let mut store = MemoryDataStore::new();
        store.set(
            NETWORK_FEES_KEY,
            serde_json::json!({
                "default": {
                    "gasLimit": { "regularTransaction": "21000" },
                    "gasPrice": { "lowFee": "1" }
                }
            }),
        );
        assert_eq!(plugin.fee_schedule(&store).unwrap_err().kind(), "ConfigError");
        assert_eq!(plugin.resolve_fees(&store, DEFAULT_NETWORK).unwrap_err().kind(), "ConfigError");
    }

    #[test]
    fn test_plugin_uri_round_trip() {
        let plugin = CurrencyPlugin::builtin("ripple").unwrap();
        let mut request = EncodeRequest::new(XRP_ADDR);
        request.native_amount = Some("25".to_string());
        request.unique_identifier = Some("1".to_string());
        let uri = plugin.encode_uri(&request).unwrap();
        let parsed = plugin.parse_uri(&uri).unwrap();
        assert_eq!(parsed.native_amount.as_deref(), Some("25"));
        assert_eq!(parsed.unique_identifier.as_deref(), Some("1"));
        assert!(plugin.is_valid_address(XRP_ADDR));
    }
}
