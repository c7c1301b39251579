use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::address::{split_prefix, AddressRule, DEFAULT_PREFIX};
use crate::amount::{to_display, to_native};
use crate::error::Error;
use crate::networks::NetworkConfig;
use crate::token::{non_empty, TokenMetadata};

/// Result of parsing a payment URI.
///
/// In token mode only `token` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_amount: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    /// Memo or destination tag, copied through unvalidated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_identifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenMetadata>,
}

/// A payment request to turn into a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    pub public_address: String,

    #[serde(default)]
    pub native_amount: Option<String>,

    /// Defaults to the network's own currency code.
    #[serde(default)]
    pub currency_code: Option<String>,

    #[serde(default)]
    pub unique_identifier: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl EncodeRequest {
    pub fn new(public_address: &str) -> Self {
        Self {
            public_address: public_address.to_string(),
            ..Self::default()
        }
    }
}

/// URI split into its target and decoded query parameters.
#[derive(Debug)]
struct UriParts {
    scheme: Option<String>,
    target: String,
    query: HashMap<String, String>,
}

/// Payment URI parser and encoder for one network.
#[derive(Debug, Clone, Copy)]
pub struct PaymentUriCodec<'a> {
    network: &'a NetworkConfig,
}

impl<'a> PaymentUriCodec<'a> {
    pub fn new(network: &'a NetworkConfig) -> Self {
        Self { network }
    }

    /// Parse a payment URI, a web redirect link or a bare address.
    pub fn parse(&self, uri: &str) -> Result<ParsedPaymentRequest, Error> {
        let parsed = self.parse_inner(uri.trim(), true)?;
        debug!(
            "parsed {} payment uri (token mode: {})",
            self.network.plugin_id(),
            parsed.token.is_some()
        );
        Ok(parsed)
    }

    fn parse_inner(&self, uri: &str, allow_redirect: bool) -> Result<ParsedPaymentRequest, Error> {
        let rules = &self.network.uri;
        let parts = split_uri(uri)?;

        if let Some(ref scheme) = parts.scheme {
            if !rules.recognizes(scheme) {
                if allow_redirect {
                    if let Some(rewritten) = self.rewrite_redirect(uri, &parts)? {
                        debug!("rewrote web redirect link to {rewritten}");
                        return self.parse_inner(&rewritten, false);
                    }
                }
                return Err(Error::InvalidUri(format!("unrecognized scheme {scheme:?}")));
            }
        }

        let rule = self.network.address_rule;
        let (prefix, address) = match rule {
            AddressRule::ChecksummedHex => split_prefix(&parts.target),
            _ => (DEFAULT_PREFIX, parts.target.as_str()),
        };

        if matches!(rule, AddressRule::ChecksummedHex) {
            rule.validate(address)?;
            if rules.token_prefixes.iter().any(|p| p == prefix) {
                let token = TokenMetadata::from_query(address, &parts.query)?;
                return Ok(ParsedPaymentRequest {
                    token: Some(token),
                    ..ParsedPaymentRequest::default()
                });
            }
        }

        let mut parsed = ParsedPaymentRequest::default();

        if let Some(amount) = non_empty(&parts.query, "amount") {
            let info = &self.network.currency_info;
            let denom = info.canonical_denomination()?;
            parsed.native_amount = Some(to_native(amount, denom)?);
            parsed.currency_code = Some(info.currency_code.clone());
        }

        rule.validate(address)?;
        parsed.public_address = Some(address.to_string());

        parsed.unique_identifier = rules
            .unique_id_params
            .iter()
            .find_map(|p| non_empty(&parts.query, p))
            .map(str::to_string);
        parsed.label = non_empty(&parts.query, "label").map(str::to_string);
        parsed.message = non_empty(&parts.query, "message").map(str::to_string);

        Ok(parsed)
    }

    /// Turn `https://<host><path>?to=<addr>&...` into `<scheme>:<addr>?to=<addr>&...`.
    ///
    /// Returns `None` when the link is not this network's redirect form.
    fn rewrite_redirect(&self, uri: &str, parts: &UriParts) -> Result<Option<String>, Error> {
        let Some(ref redirect) = self.network.uri.redirect else {
            return Ok(None);
        };
        let url = Url::parse(uri).map_err(|e| Error::InvalidUri(e.to_string()))?;
        let is_redirect = url.scheme() == "https"
            && url.host_str() == Some(redirect.host.as_str())
            && url.path() == redirect.path;
        if !is_redirect {
            return Ok(None);
        }

        let to = non_empty(&parts.query, "to")
            .ok_or_else(|| Error::InvalidUri(format!("redirect link without `to`: {uri}")))?;

        let mut rewritten = format!("{}:{}", self.network.uri.primary_scheme(), to);
        if let Some(query) = url.query() {
            rewritten.push('?');
            rewritten.push_str(query);
        }
        Ok(Some(rewritten))
    }

    /// Encode a payment request as `<scheme>:<address>[?amount=..&..]`.
    pub fn encode(&self, request: &EncodeRequest) -> Result<String, Error> {
        let rules = &self.network.uri;
        self.network.address_rule.validate(&request.public_address)?;

        let mut query = url::form_urlencoded::Serializer::new(String::new());

        if let Some(ref native_amount) = request.native_amount {
            let info = &self.network.currency_info;
            let code = request
                .currency_code
                .as_deref()
                .unwrap_or(&info.currency_code);
            let denom = info.denomination(code)?;
            let amount = to_display(native_amount, denom, rules.display_precision)?;
            query.append_pair("amount", &amount);
        }

        if let Some(ref unique_identifier) = request.unique_identifier {
            match rules.unique_id_params.first() {
                Some(param) => {
                    query.append_pair(param, unique_identifier);
                }
                None => warn!(
                    "{} has no unique identifier parameter, dropping it",
                    self.network.plugin_id()
                ),
            }
        }
        if let Some(ref label) = request.label {
            query.append_pair("label", label);
        }
        if let Some(ref message) = request.message {
            query.append_pair("message", message);
        }

        let query = query.finish();
        let mut uri = format!("{}:{}", rules.primary_scheme(), request.public_address);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }
        debug!("encoded {} payment uri", self.network.plugin_id());
        Ok(uri)
    }
}

fn split_uri(uri: &str) -> Result<UriParts, Error> {
    if uri.is_empty() {
        return Err(Error::InvalidUri("empty uri".to_string()));
    }

    // A bare address has no scheme but may still carry `?params`.
    if !uri.contains(':') {
        let (target, query) = uri.split_once('?').unwrap_or((uri, ""));
        return Ok(UriParts {
            scheme: None,
            target: target.to_string(),
            query: first_values(url::form_urlencoded::parse(query.as_bytes())),
        });
    }

    let url = Url::parse(uri).map_err(|e| Error::InvalidUri(format!("{uri}: {e}")))?;
    let query = first_values(url.query_pairs());

    let host = url.host_str().unwrap_or_default();
    let target = format!("{host}{}", url.path()).trim_matches('/').to_string();

    Ok(UriParts {
        scheme: Some(url.scheme().to_string()),
        target,
        query,
    })
}

// Repeated keys keep their first value.
fn first_values(pairs: url::form_urlencoded::Parse<'_>) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for (key, value) in pairs {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    query
}

/// Parse a payment URI for `network`.
pub fn parse_payment_uri(network: &NetworkConfig, uri: &str) -> Result<ParsedPaymentRequest, Error> {
    PaymentUriCodec::new(network).parse(uri)
}

/// Encode a payment request for `network`.
pub fn encode_payment_uri(network: &NetworkConfig, request: &EncodeRequest) -> Result<String, Error> {
    PaymentUriCodec::new(network).encode(request)
}
