use std::collections::BTreeMap;

use log::debug;
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};

/// Fallback key every fee schedule must carry.
pub const DEFAULT_NETWORK: &str = "default";

pub const REGULAR_TRANSACTION: &str = "regularTransaction";
pub const TOKEN_TRANSACTION: &str = "tokenTransaction";

pub const LOW_FEE: &str = "lowFee";
pub const STANDARD_FEE_LOW: &str = "standardFeeLow";
pub const STANDARD_FEE_HIGH: &str = "standardFeeHigh";
pub const STANDARD_FEE_LOW_AMOUNT: &str = "standardFeeLowAmount";
pub const STANDARD_FEE_HIGH_AMOUNT: &str = "standardFeeHighAmount";
pub const HIGH_FEE: &str = "highFee";

/// Gas limit kinds a tiered gas schedule needs.
pub const GAS_LIMIT_KINDS: [&str; 2] = [REGULAR_TRANSACTION, TOKEN_TRANSACTION];

/// Gas price tiers a tiered gas schedule needs.
pub const GAS_PRICE_TIERS: [&str; 6] = [
    LOW_FEE,
    STANDARD_FEE_LOW,
    STANDARD_FEE_HIGH,
    STANDARD_FEE_LOW_AMOUNT,
    STANDARD_FEE_HIGH_AMOUNT,
    HIGH_FEE,
];

/// Fee parameters for one network. Override entries may be partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFees {
    /// Transaction kind → gas limit.
    #[serde(default)]
    pub gas_limit: BTreeMap<String, String>,

    /// Tier name → gas price (or amount threshold) in native units.
    #[serde(default)]
    pub gas_price: BTreeMap<String, String>,
}

/// A fully merged fee entry for one network.
pub type ResolvedFeeSchedule = NetworkFees;

impl NetworkFees {
    /// Fill every key missing here from `fallback`. Keys already present win.
    pub fn merge_missing(&mut self, fallback: &NetworkFees) {
        for (kind, limit) in &fallback.gas_limit {
            self.gas_limit
                .entry(kind.clone())
                .or_insert_with(|| limit.clone());
        }
        for (tier, price) in &fallback.gas_price {
            self.gas_price
                .entry(tier.clone())
                .or_insert_with(|| price.clone());
        }
    }

    fn limit_for(&self, kind: &str) -> Result<&str, Error> {
        self.gas_limit
            .get(kind)
            .map(String::as_str)
            .ok_or_else(|| missing_key("gasLimit", kind))
    }

    fn price_for(&self, tier: &str) -> Result<BigInt, Error> {
        let raw = self
            .gas_price
            .get(tier)
            .ok_or_else(|| missing_key("gasPrice", tier))?;
        parse_uint(raw)
            .map(BigInt::from)
            .ok_or_else(|| Error::InvalidAmount(raw.clone()))
    }
}

fn missing_key(section: &str, key: &str) -> Error {
    ConfigError::InvalidFeeSchedule(format!("{section} has no {key:?} entry")).into()
}

fn parse_uint(raw: &str) -> Option<BigUint> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
}

/// Raw per-network fee table keyed by network identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    entries: BTreeMap<String, NetworkFees>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fee schedule from JSON and check it with [`Self::validate_complete`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let schedule: FeeSchedule = serde_json::from_str(json)?;
        schedule.validate_complete()?;
        Ok(schedule)
    }

    /// Serialize the schedule to JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn insert(&mut self, network_id: &str, fees: NetworkFees) {
        self.entries.insert(network_id.to_string(), fees);
    }

    pub fn get(&self, network_id: &str) -> Option<&NetworkFees> {
        self.entries.get(network_id)
    }

    /// Check the load-time invariants: a non-empty `"default"` entry that
    /// covers every key any override uses, and integer values throughout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let default = self.entries.get(DEFAULT_NETWORK).ok_or_else(|| {
            ConfigError::InvalidFeeSchedule("missing \"default\" entry".to_string())
        })?;
        if default.gas_limit.is_empty() || default.gas_price.is_empty() {
            return Err(ConfigError::InvalidFeeSchedule(
                "\"default\" entry must define gasLimit and gasPrice".to_string(),
            ));
        }

        for (network_id, fees) in &self.entries {
            let sections = [
                ("gasLimit", &fees.gas_limit, &default.gas_limit),
                ("gasPrice", &fees.gas_price, &default.gas_price),
            ];
            for (section, values, fallback) in sections {
                for (key, value) in values {
                    if parse_uint(value).is_none() {
                        return Err(ConfigError::InvalidFeeSchedule(format!(
                            "{network_id}.{section}.{key} is not an integer: {value:?}"
                        )));
                    }
                    if !fallback.contains_key(key) {
                        return Err(ConfigError::InvalidFeeSchedule(format!(
                            "{network_id}.{section}.{key} has no default"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// [`Self::validate`] plus a `"default"` entry that defines every gas
    /// limit kind and gas price tier, so any network resolves to a usable entry.
    pub fn validate_complete(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.require(&GAS_LIMIT_KINDS, &GAS_PRICE_TIERS)
    }

    /// Check that `"default"` defines all of the given keys.
    pub fn require(&self, gas_limits: &[&str], gas_prices: &[&str]) -> Result<(), ConfigError> {
        let default = self.entries.get(DEFAULT_NETWORK).ok_or_else(|| {
            ConfigError::InvalidFeeSchedule("missing \"default\" entry".to_string())
        })?;
        let missing = gas_limits
            .iter()
            .filter(|k| !default.gas_limit.contains_key(**k))
            .chain(gas_prices.iter().filter(|k| !default.gas_price.contains_key(**k)))
            .copied()
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidFeeSchedule(format!(
                "\"default\" entry is missing {}",
                missing.join(", ")
            )))
        }
    }

    /// Resolve the fee entry for `network_id`, completing it from `"default"`.
    pub fn resolve(&self, network_id: &str) -> Result<ResolvedFeeSchedule, Error> {
        let default = self.entries.get(DEFAULT_NETWORK).ok_or_else(|| {
            ConfigError::InvalidFeeSchedule("missing \"default\" entry".to_string())
        })?;

        match self.entries.get(network_id) {
            Some(fees) => {
                debug!("resolving fee schedule for network {network_id}");
                let mut resolved = fees.clone();
                resolved.merge_missing(default);
                Ok(resolved)
            }
            None => {
                debug!("no fee schedule for network {network_id}, using default");
                Ok(default.clone())
            }
        }
    }
}

/// Resolve the fee entry for `network_id` from a raw schedule.
pub fn resolve_fee_schedule(raw: &FeeSchedule, network_id: &str) -> Result<ResolvedFeeSchedule, Error> {
    raw.resolve(network_id)
}

/// Fee level requested for a spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeTier {
    Low,
    Standard,
    High,
    /// Caller-supplied values in native units.
    Custom {
        gas_price: String,
        gas_limit: Option<String>,
    },
}

/// Concrete gas parameters for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeParameters {
    pub gas_limit: String,
    pub gas_price: String,
}

/// Pick the gas limit and price for a spend of `native_amount`.
///
/// Standard fees scale linearly from `standardFeeLow` to `standardFeeHigh`
/// as the amount moves between the two threshold amounts.
pub fn calc_fee_parameters(
    fees: &ResolvedFeeSchedule,
    tier: &FeeTier,
    native_amount: &str,
    is_token: bool,
) -> Result<FeeParameters, Error> {
    let kind = if is_token {
        TOKEN_TRANSACTION
    } else {
        REGULAR_TRANSACTION
    };

    let gas_price = match tier {
        FeeTier::Low => fees.price_for(LOW_FEE)?,
        FeeTier::High => fees.price_for(HIGH_FEE)?,
        FeeTier::Standard => {
            let amount = parse_uint(native_amount)
                .map(BigInt::from)
                .ok_or_else(|| Error::InvalidAmount(native_amount.to_string()))?;
            standard_gas_price(fees, &amount)?
        }
        FeeTier::Custom { gas_price, gas_limit } => {
            let price = parse_uint(gas_price).ok_or_else(|| Error::InvalidAmount(gas_price.clone()))?;
            let limit = match gas_limit {
                Some(limit) => {
                    parse_uint(limit).ok_or_else(|| Error::InvalidAmount(limit.clone()))?;
                    limit.clone()
                }
                None => fees.limit_for(kind)?.to_string(),
            };
            return Ok(FeeParameters {
                gas_limit: limit,
                gas_price: price.to_string(),
            });
        }
    };

    Ok(FeeParameters {
        gas_limit: fees.limit_for(kind)?.to_string(),
        gas_price: gas_price.to_string(),
    })
}

fn standard_gas_price(fees: &ResolvedFeeSchedule, amount: &BigInt) -> Result<BigInt, Error> {
    let low_amount = fees.price_for(STANDARD_FEE_LOW_AMOUNT)?;
    let high_amount = fees.price_for(STANDARD_FEE_HIGH_AMOUNT)?;
    let low_fee = fees.price_for(STANDARD_FEE_LOW)?;
    let high_fee = fees.price_for(STANDARD_FEE_HIGH)?;

    if *amount <= low_amount {
        return Ok(low_fee);
    }
    if *amount >= high_amount {
        return Ok(high_fee);
    }

    // low_amount < amount < high_amount, so the span is positive
    let span = &high_amount - &low_amount;
    let offset = amount - &low_amount;
    Ok(&low_fee + offset * (&high_fee - &low_fee) / span)
}
