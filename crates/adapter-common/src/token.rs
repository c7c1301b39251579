use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::denomination::Denomination;
use crate::error::Error;

/// Allowed token symbol lengths, inclusive.
pub const SYMBOL_LEN: std::ops::RangeInclusive<usize> = 2..=5;

/// Largest token `decimals` value accepted from a URI.
pub const MAX_DECIMALS: u32 = 18;

pub const DEFAULT_TOKEN_TYPE: &str = "ERC20";

/// Token metadata discovered from a `token-` or `token_info-` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub currency_code: String,
    pub contract_address: String,
    pub currency_name: String,
    pub multiplier: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl TokenMetadata {
    /// Build token metadata from the query parameters of a token URI.
    ///
    /// `symbol` is required, `name` defaults to the symbol, `decimals`
    /// defaults to 18 and `type` defaults to `ERC20`.
    pub fn from_query(
        contract_address: &str,
        query: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        let symbol = non_empty(query, "symbol")
            .ok_or_else(|| Error::InvalidTokenSymbol("missing symbol".to_string()))?;
        if !SYMBOL_LEN.contains(&symbol.chars().count()) {
            return Err(Error::InvalidTokenSymbol(symbol.to_string()));
        }

        let decimals = match non_empty(query, "decimals") {
            Some(raw) => parse_decimals(raw)?,
            None => MAX_DECIMALS,
        };

        let multiplier = Denomination::with_decimals(symbol, decimals, None).multiplier;

        Ok(Self {
            currency_code: symbol.to_string(),
            contract_address: contract_address.to_string(),
            currency_name: non_empty(query, "name").unwrap_or(symbol).to_string(),
            multiplier,
            token_type: non_empty(query, "type")
                .map(str::to_uppercase)
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
        })
    }
}

/// Look up a query parameter, treating an empty value as absent.
pub(crate) fn non_empty<'q>(query: &'q HashMap<String, String>, key: &str) -> Option<&'q str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_decimals(raw: &str) -> Result<u32, Error> {
    raw.parse::<u32>()
        .ok()
        .filter(|d| *d <= MAX_DECIMALS)
        .ok_or_else(|| Error::InvalidDecimals(raw.to_string()))
}
