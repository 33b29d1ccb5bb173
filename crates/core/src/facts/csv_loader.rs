//! CSV adapter for the fact table.
//!
//! Accepts the English column names as well as the Hebrew headers of the
//! ERP sales export. Normalization mirrors the upstream ingestion: ids are
//! trimmed, rows without an account are dropped and non-numeric amounts
//! count as zero.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::fact_table::FactTable;
use super::facts_model::SalesFact;
use crate::errors::{Result, ValidationError};

#[derive(Debug, Deserialize)]
struct RawFactRecord {
    #[serde(alias = "סוכן בחשבון", default)]
    agent_id: Option<String>,
    #[serde(alias = "שם חשבון", default)]
    account_id: Option<String>,
    #[serde(alias = "שם קוד מיון פריט", default)]
    class_id: Option<String>,
    #[serde(alias = "שם פריט", default)]
    item_id: Option<String>,
    #[serde(alias = "סהכ כמות", default)]
    quantity: Option<String>,
    #[serde(alias = "מכירות/קניות נטו", default)]
    net_money: Option<String>,
}

fn parse_amount(raw: Option<&str>) -> Decimal {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Decimal::ZERO;
    };
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or_else(|_| {
            debug!("Coercing non-numeric amount '{}' to zero", value);
            Decimal::ZERO
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads sales facts from CSV data with a header row.
pub fn load_facts_csv<R: Read>(reader: R) -> Result<FactTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for (required, hebrew) in [("agent_id", "סוכן בחשבון"), ("account_id", "שם חשבון")] {
        if !headers.iter().any(|h| h == required || h == hebrew) {
            return Err(ValidationError::MissingField(required.to_string()).into());
        }
    }

    let mut facts = Vec::new();
    let mut dropped = 0usize;
    for record in csv_reader.deserialize::<RawFactRecord>() {
        let raw = record?;
        let Some(account_id) = non_empty(raw.account_id) else {
            dropped += 1;
            continue;
        };
        facts.push(SalesFact {
            agent_id: non_empty(raw.agent_id).unwrap_or_default(),
            account_id,
            class_id: non_empty(raw.class_id).unwrap_or_default(),
            item_id: non_empty(raw.item_id),
            quantity: parse_amount(raw.quantity.as_deref()),
            net_money: parse_amount(raw.net_money.as_deref()),
        });
    }

    if dropped > 0 {
        warn!("Dropped {} fact rows without an account", dropped);
    }
    debug!("Loaded {} sales facts", facts.len());
    FactTable::new(facts)
}

/// Reads sales facts from a CSV file on disk.
pub fn load_facts_csv_path(path: impl AsRef<Path>) -> Result<FactTable> {
    let file = File::open(path.as_ref())?;
    load_facts_csv(file)
}
