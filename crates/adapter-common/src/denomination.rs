use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::fees::FeeSchedule;

/// A named display unit and its scaling factor relative to the native amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDenomination")]
pub struct Denomination {
    pub name: String,

    /// Power of ten as a digit string, e.g. `"1000000"`.
    pub multiplier: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(skip)]
    decimals: u32,
}

#[derive(Deserialize)]
struct RawDenomination {
    name: String,
    multiplier: String,
    #[serde(default)]
    symbol: Option<String>,
}

impl TryFrom<RawDenomination> for Denomination {
    type Error = ConfigError;

    fn try_from(raw: RawDenomination) -> Result<Self, Self::Error> {
        Denomination::new(&raw.name, &raw.multiplier, raw.symbol.as_deref())
    }
}

impl Denomination {
    /// Build a denomination, rejecting multipliers that are not `1` followed by zeros.
    pub fn new(name: &str, multiplier: &str, symbol: Option<&str>) -> Result<Self, ConfigError> {
        let decimals = multiplier_decimals(multiplier).ok_or_else(|| {
            ConfigError::InvalidDenomination {
                name: name.to_string(),
                reason: format!("multiplier {multiplier:?} is not a power of ten"),
            }
        })?;

        Ok(Self {
            name: name.to_string(),
            multiplier: multiplier.to_string(),
            symbol: symbol.map(str::to_string),
            decimals,
        })
    }

    /// Build a denomination whose multiplier is `10^decimals`.
    pub fn with_decimals(name: &str, decimals: u32, symbol: Option<&str>) -> Self {
        let mut multiplier = String::with_capacity(decimals as usize + 1);
        multiplier.push('1');
        multiplier.extend(std::iter::repeat_n('0', decimals as usize));
        Self {
            name: name.to_string(),
            multiplier,
            symbol: symbol.map(str::to_string),
            decimals,
        }
    }

    /// Number of zeros in the multiplier.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}

fn multiplier_decimals(multiplier: &str) -> Option<u32> {
    let zeros = multiplier.strip_prefix('1')?;
    if !zeros.bytes().all(|b| b == b'0') {
        return None;
    }
    u32::try_from(zeros.len()).ok()
}

/// A token built into a currency plugin, e.g. an ERC-20 contract on ethereum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaToken {
    pub currency_code: String,
    pub currency_name: String,
    pub contract_address: String,
    pub denominations: Vec<Denomination>,
}

/// Immutable per-plugin currency description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    pub plugin_id: String,
    pub currency_code: String,
    pub denominations: Vec<Denomination>,

    #[serde(default)]
    pub meta_tokens: Vec<MetaToken>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_network_fees: Option<FeeSchedule>,
}

impl CurrencyInfo {
    /// Parse and validate currency info from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let info: CurrencyInfo = serde_json::from_str(json)?;
        info.validate()?;
        Ok(info)
    }

    /// Check that every currency code has exactly one canonical denomination
    /// and that the bundled fee table is complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_canonical(&self.currency_code, &self.denominations)?;
        for token in &self.meta_tokens {
            check_canonical(&token.currency_code, &token.denominations)?;
        }
        if let Some(ref fees) = self.default_network_fees {
            fees.validate_complete()?;
        }
        Ok(())
    }

    /// The denomination named after the plugin's own currency code.
    pub fn canonical_denomination(&self) -> Result<&Denomination, Error> {
        find_denomination(&self.denominations, &self.currency_code)
            .ok_or_else(|| Error::InvalidCurrencyCode(self.currency_code.clone()))
    }

    /// Look up a denomination by name, first on the parent currency and then
    /// on the built-in tokens.
    pub fn denomination(&self, code: &str) -> Result<&Denomination, Error> {
        if let Some(denom) = find_denomination(&self.denominations, code) {
            return Ok(denom);
        }
        self.meta_tokens
            .iter()
            .find_map(|token| find_denomination(&token.denominations, code))
            .ok_or_else(|| Error::InvalidCurrencyCode(code.to_string()))
    }

    /// Find a built-in token by currency code.
    pub fn meta_token(&self, code: &str) -> Option<&MetaToken> {
        self.meta_tokens.iter().find(|t| t.currency_code == code)
    }
}

fn find_denomination<'a>(denominations: &'a [Denomination], name: &str) -> Option<&'a Denomination> {
    denominations.iter().find(|d| d.name == name)
}

fn check_canonical(code: &str, denominations: &[Denomination]) -> Result<(), ConfigError> {
    let count = denominations.iter().filter(|d| d.name == code).count();
    if count != 1 {
        return Err(ConfigError::InvalidDenomination {
            name: code.to_string(),
            reason: format!("expected one canonical denomination, found {count}"),
        });
    }
    Ok(())
}
