//! Defines the transaction record, its wire format and the strict validation
//! predicate applied whenever records cross the storage boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};
use uuid::Uuid;

/// The wire tag for income.
pub const INCOME_TAG: &str = "Pemasukan";
/// The wire tag for expenses.
pub const EXPENSE_TAG: &str = "Pengeluaran";

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money earned, tagged as [INCOME_TAG].
    #[serde(rename = "Pemasukan")]
    Income,
    /// Money spent, tagged as [EXPENSE_TAG].
    #[serde(rename = "Pengeluaran")]
    Expense,
}

impl TransactionType {
    /// Match one of the two literal wire tags exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            INCOME_TAG => Some(Self::Income),
            EXPENSE_TAG => Some(Self::Expense),
            _ => None,
        }
    }

    /// The literal wire tag for this type.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Income => INCOME_TAG,
            Self::Expense => EXPENSE_TAG,
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// A transaction is never mutated in place: an edit builds a new record with
/// the same `id` and a delete omits the record from the next saved list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Non-empty identifier, unique within the stored list by convention.
    pub id: String,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Free text, may be empty.
    pub description: String,
    /// The amount of money, always finite once validated.
    #[serde(with = "amount_format")]
    pub amount: f64,
    /// When the transaction happened.
    #[serde(with = "instant_format")]
    pub date: OffsetDateTime,
}

impl Transaction {
    /// Create a transaction with a freshly generated id.
    ///
    /// `date` is truncated to millisecond precision, the precision of the
    /// stored format.
    pub fn new(
        kind: TransactionType,
        description: &str,
        amount: f64,
        date: OffsetDateTime,
    ) -> Self {
        Self {
            id: generate_id(),
            kind,
            description: description.to_owned(),
            amount,
            date: truncate_to_millis(date),
        }
    }
}

/// Generate a random, practically unique transaction id.
pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn truncate_to_millis(instant: OffsetDateTime) -> OffsetDateTime {
    instant
        .replace_millisecond(instant.millisecond())
        .unwrap_or(instant)
}

/// Stored and exported instants, e.g. "2024-01-05T00:00:00.000Z".
const INSTANT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Date-times without an offset, read in the local timezone.
const LOCAL_DATE_TIME_FORMATS: [&[BorrowedFormatItem]; 3] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
];

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 instants with an explicit offset, date-times without an
/// offset and bare dates. The last two are interpreted in `local_offset`, a
/// bare date being the start of that day.
pub fn parse_instant(text: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    let text = text.trim();

    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(instant).filter(|instant| is_storable(*instant));
    }

    LOCAL_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, *format).ok())
        .or_else(|| {
            Date::parse(text, DATE_FORMAT)
                .ok()
                .map(|date| date.midnight())
        })
        .map(|date_time| date_time.assume_offset(local_offset))
        .filter(|instant| is_storable(*instant))
}

/// Whether `instant` falls in a UTC year between 0000 and 9999, the range
/// the stored format can write and read back.
pub(crate) fn is_storable(instant: OffsetDateTime) -> bool {
    instant
        .checked_to_offset(UtcOffset::UTC)
        .is_some_and(|utc| (0..=9999).contains(&utc.year()))
}

/// Format `instant` in UTC with millisecond precision.
pub(crate) fn format_instant(instant: OffsetDateTime) -> Result<String, time::error::Format> {
    instant.to_offset(UtcOffset::UTC).format(INSTANT_FORMAT)
}

pub(crate) mod instant_format {
    //! Serializes instants the way browsers print them with `toISOString`,
    //! which the default [time::OffsetDateTime] serializer does not do.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, UtcOffset};

    use super::{format_instant, parse_instant};

    pub fn serialize<S>(instant: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = format_instant(*instant).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_instant(&text, UtcOffset::UTC)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date \"{text}\"")))
    }
}

pub(crate) mod amount_format {
    //! Writes whole amounts as JSON integers so that exported files read
    //! `1000000` rather than `1000000.0`.
    use serde::{Deserialize, Deserializer, Serializer};

    /// Integers above this cannot be represented exactly by an `f64`.
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    pub fn serialize<S>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if amount.fract() == 0.0 && amount.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(*amount as i64)
        } else {
            serializer.serialize_f64(*amount)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        f64::deserialize(deserializer)
    }
}

/// The strict validation predicate.
///
/// Returns the transaction when `record` is an object whose `id` is a
/// non-empty string, `type` is one of the two literal tags, `description`
/// is a string, `amount` is a finite number and `date` parses to a valid
/// instant. Returns `None` otherwise. Extra fields such as the export
/// sequence number `no` are ignored.
pub fn validate_record(record: &Value) -> Option<Transaction> {
    let fields = record.as_object()?;

    let id = fields.get("id")?.as_str().filter(|id| !id.is_empty())?;
    let kind = fields
        .get("type")?
        .as_str()
        .and_then(TransactionType::from_tag)?;
    let description = fields.get("description")?.as_str()?;
    let amount = fields
        .get("amount")?
        .as_f64()
        .filter(|amount| amount.is_finite())?;
    let date = fields
        .get("date")?
        .as_str()
        .and_then(|date| parse_instant(date, UtcOffset::UTC))?;

    Some(Transaction {
        id: id.to_owned(),
        kind,
        description: description.to_owned(),
        amount,
        date: truncate_to_millis(date),
    })
}

/// Keep only the records that pass [validate_record].
///
/// Invalid records are dropped, not repaired. The only signal of a drop is
/// the shorter list and a warning in the logs.
pub fn sanitize(records: &[Value]) -> Vec<Transaction> {
    let transactions: Vec<Transaction> = records.iter().filter_map(validate_record).collect();

    let dropped = records.len() - transactions.len();
    if dropped > 0 {
        tracing::warn!("Dropped {dropped} invalid transaction record(s)");
    }

    transactions
}
