// src/models.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A transaction body as returned inside a full block.
/// Fields are read leniently so one odd transaction cannot sink its block;
/// a value that is not a string is kept as raw JSON text and fails the scan's
/// amount parse instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "text_or_raw")]
    pub from: String,
    #[serde(default, deserialize_with = "text_or_none")]
    pub to: Option<String>, // None for contract creation
    #[serde(default, deserialize_with = "text_or_raw")]
    pub value: String, // hex wei, parsed during the scan
}

fn text_or_raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub transactions: Vec<Transaction>,
}

/// Response body of the largest-balance-change endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentBalanceChange {
    pub sender: String,
    pub receiver: String,   // empty when no receiver exists
    pub balance_change: String, // ether, decimal string
}
