// Persisted rows (deposit addresses, processed transactions), the inbound
// webhook payload, and the responses the provisioning endpoints return.

use bigdecimal::{BigDecimal, ParseBigDecimalError};
use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;
use std::str::FromStr;

/// Event type that carries an inbound deposit. Everything else is acknowledged
/// and dropped.
pub const DEPOSIT_ACTIVITY_EVENT: &str = "onchain.activity.detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Evm,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Evm => "evm",
            Chain::Solana => "solana",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evm" => Ok(Chain::Evm),
            "solana" => Ok(Chain::Solana),
            other => Err(format!("unknown chain: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositAddress {
    pub owner_address: String,
    pub smart_address: Option<String>,
    pub chain: Chain,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub tx_hash: String,
    /// Free-form: the sender may report chains this service does not issue
    /// addresses on.
    pub chain: String,
    pub address: String,
    pub amount: Amount,
    pub processed_at: i64,
}

/// Deposit amount in chain-native units, kept as the decimal text the sender
/// reported. Wei-denominated values routinely exceed what an `f64` holds
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Amount {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BigDecimal::from_str(s)?;
        Ok(Amount(s.to_string()))
    }
}

// Accepts a JSON number or a numeric string. Numbers are read from the raw
// token so no digits are lost to float conversion.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = match serde_json::from_str::<String>(raw.get()) {
            Ok(quoted) => quoted,
            Err(_) => raw.get().to_string(),
        };

        text.parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&text), &"a decimal amount"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Only decoded for deposit events, other types may carry anything.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositActivity {
    pub address: String,
    pub tx_hash: String,
    pub amount: Amount,
    pub chain: String,
}

impl WebhookEvent {
    pub fn is_deposit_activity(&self) -> bool {
        self.event_type == DEPOSIT_ACTIVITY_EVENT
    }

    pub fn deposit_activity(&self) -> Result<DepositActivity, serde_json::Error> {
        let data = self.data.as_deref().map(RawValue::get).unwrap_or("null");
        serde_json::from_str(data)
    }
}

// API response models
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvmAccountResponse {
    /// The smart account, which is where deposits are sent.
    pub address: String,
    pub owner_address: String,
    pub smart_address: String,
    #[serde(rename = "type")]
    pub account_type: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SolanaAccountResponse {
    pub address: String,
}
