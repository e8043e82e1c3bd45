use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    transaction::{
        EXPENSE_TAG, INCOME_TAG, Transaction, TransactionType, generate_id, is_storable,
        parse_instant, truncate_to_millis,
    },
};

/// A repair made while importing a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoercionNote {
    /// The record had no usable id, so one was generated.
    IdGenerated {
        /// The generated id.
        replacement: String,
    },
    /// The record's id was already used earlier in the batch, so it was
    /// replaced.
    IdRegenerated {
        /// The duplicated id.
        original: String,
        /// The id the record was given instead.
        replacement: String,
    },
    /// The description was not a string and was converted to one.
    DescriptionConverted {
        /// The converted text.
        description: String,
    },
    /// The amount was not a number but could be read as one.
    AmountConverted {
        /// The original value as JSON text.
        original: String,
        /// The number it was read as.
        amount: f64,
    },
    /// The amount was missing or unreadable and was set to zero.
    AmountDefaulted {
        /// The original value as JSON text, if there was one.
        original: Option<String>,
    },
    /// The type was not one of the two tags and was set to income.
    TypeDefaulted {
        /// The original value as JSON text, if there was one.
        original: Option<String>,
    },
    /// The date was readable but not in the stored format.
    DateConverted {
        /// The original value as JSON text.
        original: String,
    },
    /// The date was missing or unreadable and was set to the import time.
    DateDefaulted {
        /// The original value as JSON text, if there was one.
        original: Option<String>,
    },
}

/// A coerced record together with the repairs made to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// The transaction built from the record.
    pub transaction: Transaction,
    /// What had to be repaired, empty for a well-formed record.
    pub notes: Vec<CoercionNote>,
}

/// A repair made to the record at `index` of the imported array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordNote {
    /// Zero-based position in the imported array.
    pub index: usize,
    /// What was repaired.
    #[serde(flatten)]
    pub note: CoercionNote,
}

/// The result of importing a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    /// One transaction per array element, in the same order.
    pub transactions: Vec<Transaction>,
    /// Every repair made, in array order.
    pub notes: Vec<RecordNote>,
}

/// Parse `text` as a JSON array and coerce every element into a transaction.
///
/// Unlike the store, which drops invalid records, import repairs them. See
/// [decode_lenient] for the rules. `now` is used for missing dates and
/// `local_offset` for dates written without an offset.
///
/// # Errors
/// Returns [Error::ImportParse] if `text` is not valid JSON or the top-level
/// value is not an array.
pub fn import_transactions(
    text: &str,
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> Result<ImportOutcome, Error> {
    let value: Value =
        serde_json::from_str(text).map_err(|error| Error::ImportParse(error.to_string()))?;
    let Value::Array(elements) = value else {
        return Err(Error::ImportParse("expected an array".to_owned()));
    };

    let mut seen_ids = HashSet::with_capacity(elements.len());
    let mut transactions = Vec::with_capacity(elements.len());
    let mut notes = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let decoded = decode_lenient(element, &mut seen_ids, now, local_offset);
        transactions.push(decoded.transaction);
        notes.extend(
            decoded
                .notes
                .into_iter()
                .map(|note| RecordNote { index, note }),
        );
    }

    if !notes.is_empty() {
        tracing::info!(
            "Repaired {} field(s) while importing {} transaction(s)",
            notes.len(),
            transactions.len()
        );
    }

    Ok(ImportOutcome {
        transactions,
        notes,
    })
}

/// Coerce one imported element into a transaction.
///
/// - `id` is kept when it is a non-empty string or a non-zero number not yet
///   in `seen_ids`, otherwise a new id is generated. The id used is added to
///   `seen_ids`.
/// - `description` becomes a string, missing means empty.
/// - `amount` becomes a number, zero when missing or unreadable.
/// - `type` is expense only for the exact expense tag, income otherwise.
/// - `date` is parsed, falling back to `now`.
///
/// Elements that are not objects are treated as empty objects.
pub fn decode_lenient(
    element: &Value,
    seen_ids: &mut HashSet<String>,
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> DecodedRecord {
    let empty = Map::new();
    let fields = element.as_object().unwrap_or(&empty);
    let mut notes = Vec::new();

    let id = decode_id(fields.get("id"), seen_ids, &mut notes);
    let description = decode_description(fields.get("description"), &mut notes);
    let amount = decode_amount(fields.get("amount"), &mut notes);
    let kind = decode_type(fields.get("type"), &mut notes);
    let date = decode_date(fields.get("date"), now, local_offset, &mut notes);

    DecodedRecord {
        transaction: Transaction {
            id,
            kind,
            description,
            amount,
            date: truncate_to_millis(date),
        },
        notes,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn decode_id(
    value: Option<&Value>,
    seen_ids: &mut HashSet<String>,
    notes: &mut Vec<CoercionNote>,
) -> String {
    let original = match value {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        _ => None,
    };

    let id = match original {
        Some(original) if !seen_ids.contains(&original) => original,
        Some(original) => {
            let replacement = generate_id();
            notes.push(CoercionNote::IdRegenerated {
                original,
                replacement: replacement.clone(),
            });
            replacement
        }
        None => {
            let replacement = generate_id();
            notes.push(CoercionNote::IdGenerated {
                replacement: replacement.clone(),
            });
            replacement
        }
    };

    seen_ids.insert(id.clone());
    id
}

fn decode_description(value: Option<&Value>, notes: &mut Vec<CoercionNote>) -> String {
    match present(value) {
        None => String::new(),
        Some(Value::String(description)) => description.clone(),
        Some(other) => {
            let description = other.to_string();
            notes.push(CoercionNote::DescriptionConverted {
                description: description.clone(),
            });
            description
        }
    }
}

fn decode_amount(value: Option<&Value>, notes: &mut Vec<CoercionNote>) -> f64 {
    let Some(value) = present(value) else {
        return 0.0;
    };

    let converted = match value {
        Value::Number(number) => {
            if let Some(amount) = number.as_f64().filter(|amount| amount.is_finite()) {
                return amount;
            }
            None
        }
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|amount| amount.is_finite());

    match converted {
        Some(amount) => {
            notes.push(CoercionNote::AmountConverted {
                original: value.to_string(),
                amount,
            });
            amount
        }
        None => {
            notes.push(CoercionNote::AmountDefaulted {
                original: Some(value.to_string()),
            });
            0.0
        }
    }
}

fn decode_type(value: Option<&Value>, notes: &mut Vec<CoercionNote>) -> TransactionType {
    match value.and_then(Value::as_str) {
        Some(EXPENSE_TAG) => TransactionType::Expense,
        Some(INCOME_TAG) => TransactionType::Income,
        _ => {
            notes.push(CoercionNote::TypeDefaulted {
                original: value.map(Value::to_string),
            });
            TransactionType::Income
        }
    }
}

fn decode_date(
    value: Option<&Value>,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    notes: &mut Vec<CoercionNote>,
) -> OffsetDateTime {
    let Some(value) = present(value) else {
        notes.push(CoercionNote::DateDefaulted { original: None });
        return now;
    };

    let parsed = match value {
        Value::String(text) => parse_instant(text, local_offset).map(|date| (date, false)),
        // Numbers are milliseconds since the Unix epoch.
        Value::Number(number) => number
            .as_f64()
            .filter(|millis| millis.is_finite())
            .and_then(|millis| {
                OffsetDateTime::from_unix_timestamp_nanos((millis * 1_000_000.0) as i128).ok()
            })
            .filter(|date| is_storable(*date))
            .map(|date| (date, true)),
        _ => None,
    };

    match parsed {
        Some((date, converted)) => {
            let needs_note = converted || !is_stored_format(value, date);
            if needs_note {
                notes.push(CoercionNote::DateConverted {
                    original: value.to_string(),
                });
            }
            date
        }
        None => {
            notes.push(CoercionNote::DateDefaulted {
                original: Some(value.to_string()),
            });
            now
        }
    }
}

fn is_stored_format(value: &Value, date: OffsetDateTime) -> bool {
    match (value.as_str(), crate::transaction::format_instant(date)) {
        (Some(text), Ok(formatted)) => text == formatted,
        _ => false,
    }
}
