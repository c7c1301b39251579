use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::address::AddressRule;
use crate::denomination::{CurrencyInfo, Denomination, MetaToken};
use crate::fees::{FeeSchedule, NetworkFees, DEFAULT_NETWORK};

/// An `https://host/path?to=<address>` link that stands in for a native URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebRedirect {
    pub host: String,
    pub path: String,
}

/// How a network spells its payment URIs.
#[derive(Debug, Clone)]
pub struct UriRules {
    /// Recognized schemes. The first one is used when encoding.
    pub aliases: Vec<String>,

    pub redirect: Option<WebRedirect>,

    /// Query parameters carrying a memo / destination tag. The first one is
    /// used when encoding; an empty list means the network has none.
    pub unique_id_params: Vec<String>,

    /// Address prefixes that switch parsing into token mode.
    pub token_prefixes: Vec<String>,

    /// Fractional digits kept when encoding an amount.
    pub display_precision: u32,
}

impl UriRules {
    pub fn primary_scheme(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or_default()
    }

    pub fn recognizes(&self, scheme: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(scheme))
    }
}

/// Everything the shared adapter logic needs to know about one network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub currency_info: CurrencyInfo,
    pub address_rule: AddressRule,
    pub uri: UriRules,

    /// Wallet types accepted by key management, without the `wallet:` prefix.
    pub wallet_types: Vec<String>,

    /// Per-wallet values written on first run when absent.
    pub other_data_defaults: BTreeMap<String, String>,
}

impl NetworkConfig {
    pub fn plugin_id(&self) -> &str {
        &self.currency_info.plugin_id
    }
}

static ETHEREUM: OnceLock<NetworkConfig> = OnceLock::new();
static EOS: OnceLock<NetworkConfig> = OnceLock::new();
static RIPPLE: OnceLock<NetworkConfig> = OnceLock::new();

pub fn ethereum() -> &'static NetworkConfig {
    ETHEREUM.get_or_init(build_ethereum)
}

pub fn eos() -> &'static NetworkConfig {
    EOS.get_or_init(build_eos)
}

pub fn ripple() -> &'static NetworkConfig {
    RIPPLE.get_or_init(build_ripple)
}

/// All built-in networks.
pub fn all() -> [&'static NetworkConfig; 3] {
    [ethereum(), eos(), ripple()]
}

/// Find a built-in network by plugin id.
pub fn by_plugin_id(plugin_id: &str) -> Option<&'static NetworkConfig> {
    all().into_iter().find(|n| n.plugin_id() == plugin_id)
}

/// Find the built-in network that registers `scheme` as a URI alias.
pub fn by_scheme(scheme: &str) -> Option<&'static NetworkConfig> {
    all().into_iter().find(|n| n.uri.recognizes(scheme))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fee_entry(gas_limit: &[(&str, &str)], gas_price: &[(&str, &str)]) -> NetworkFees {
    NetworkFees {
        gas_limit: string_map(gas_limit),
        gas_price: string_map(gas_price),
    }
}

fn ethereum_fees() -> FeeSchedule {
    let mut schedule = FeeSchedule::new();
    schedule.insert(
        DEFAULT_NETWORK,
        fee_entry(
            &[("regularTransaction", "21000"), ("tokenTransaction", "200000")],
            &[
                ("lowFee", "1000000001"),
                ("standardFeeLow", "40000000001"),
                ("standardFeeHigh", "300000000001"),
                ("standardFeeLowAmount", "100000000000000000"),
                ("standardFeeHighAmount", "10000000000000000000"),
                ("highFee", "40000000001"),
            ],
        ),
    );
    schedule.insert(
        "1983987abc9837fbabc0982347ad828",
        fee_entry(
            &[("regularTransaction", "21002"), ("tokenTransaction", "37124")],
            &[
                ("lowFee", "1000000002"),
                ("standardFeeLow", "40000000002"),
                ("standardFeeHigh", "300000000002"),
                ("standardFeeLowAmount", "200000000000000000"),
                ("standardFeeHighAmount", "20000000000000000000"),
                ("highFee", "40000000002"),
            ],
        ),
    );
    schedule.insert(
        "2983987abc9837fbabc0982347ad828",
        fee_entry(
            &[("regularTransaction", "21002"), ("tokenTransaction", "37124")],
            &[],
        ),
    );
    schedule
}

fn build_ethereum() -> NetworkConfig {
    let currency_info = CurrencyInfo {
        plugin_id: "ethereum".to_string(),
        currency_code: "ETH".to_string(),
        denominations: vec![
            Denomination::with_decimals("ETH", 18, Some("Ξ")),
            Denomination::with_decimals("mETH", 15, Some("mΞ")),
        ],
        meta_tokens: vec![
            MetaToken {
                currency_code: "REP".to_string(),
                currency_name: "Augur".to_string(),
                contract_address: "0x1985365e9f78359a9B6AD760e32412f4a445E862".to_string(),
                denominations: vec![Denomination::with_decimals("REP", 18, None)],
            },
            MetaToken {
                currency_code: "USDT".to_string(),
                currency_name: "Tether".to_string(),
                contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
                denominations: vec![Denomination::with_decimals("USDT", 6, None)],
            },
        ],
        default_network_fees: Some(ethereum_fees()),
    };

    NetworkConfig {
        currency_info,
        address_rule: AddressRule::ChecksummedHex,
        uri: UriRules {
            aliases: strings(&["ethereum", "ether"]),
            redirect: None,
            unique_id_params: Vec::new(),
            token_prefixes: strings(&["token", "token_info"]),
            display_precision: 18,
        },
        wallet_types: strings(&["ethereum"]),
        other_data_defaults: BTreeMap::from([("nextNonce".to_string(), "0".to_string())]),
    }
}

fn build_eos() -> NetworkConfig {
    let currency_info = CurrencyInfo {
        plugin_id: "eos".to_string(),
        currency_code: "EOS".to_string(),
        denominations: vec![Denomination::with_decimals("EOS", 4, Some("E"))],
        meta_tokens: Vec::new(),
        default_network_fees: None,
    };

    NetworkConfig {
        currency_info,
        address_rule: AddressRule::FixedLength { length: 12 },
        uri: UriRules {
            aliases: strings(&["eos"]),
            redirect: None,
            unique_id_params: strings(&["tag"]),
            token_prefixes: Vec::new(),
            display_precision: 18,
        },
        wallet_types: strings(&["eos"]),
        other_data_defaults: BTreeMap::new(),
    }
}

fn build_ripple() -> NetworkConfig {
    let currency_info = CurrencyInfo {
        plugin_id: "ripple".to_string(),
        currency_code: "XRP".to_string(),
        denominations: vec![Denomination::with_decimals("XRP", 6, Some("X"))],
        meta_tokens: Vec::new(),
        default_network_fees: None,
    };

    NetworkConfig {
        currency_info,
        address_rule: AddressRule::Base58 {
            leading: 'r',
            decoded_len: 25,
        },
        uri: UriRules {
            aliases: strings(&["ripple"]),
            redirect: Some(WebRedirect {
                host: "ripple.com".to_string(),
                path: "//send".to_string(),
            }),
            unique_id_params: strings(&["dt", "tag"]),
            token_prefixes: Vec::new(),
            display_precision: 18,
        },
        wallet_types: strings(&["ripple", "ripple-secp256k1"]),
        other_data_defaults: BTreeMap::from([("recommendedFee".to_string(), "0".to_string())]),
    }
}
