//! Building transactions from what the user typed into the create and edit
//! forms.

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, Time, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    Error,
    transaction::record::{
        Transaction, TransactionType, is_storable, parse_instant, truncate_to_millis,
    },
};

const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// An amount as submitted, either a JSON number or the text of a number input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number.
    Number(f64),
    /// The raw text of a number input, e.g. "50000".
    Text(String),
}

impl AmountInput {
    /// The finite number this input represents, if any.
    fn value(&self) -> Option<f64> {
        let amount = match self {
            AmountInput::Number(amount) => *amount,
            AmountInput::Text(text) => text.trim().parse().ok()?,
        };

        amount.is_finite().then_some(amount)
    }
}

/// The data submitted by the form for adding a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the transaction was for. Required.
    #[serde(default)]
    pub description: String,
    /// How much money. Required.
    pub amount: AmountInput,
    /// Optional date. A bare date is combined with the current time of day;
    /// leaving it out means now.
    #[serde(default)]
    pub date: Option<String>,
}

impl NewTransaction {
    /// Build a transaction with a freshly generated id.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransaction] if the description or amount is
    /// missing, the amount is not a number, or the date cannot be parsed.
    pub fn into_transaction(
        self,
        now: OffsetDateTime,
        local_offset: UtcOffset,
    ) -> Result<Transaction, Error> {
        let amount_missing =
            matches!(&self.amount, AmountInput::Text(text) if text.trim().is_empty());
        if self.description.is_empty() || amount_missing {
            return Err(Error::InvalidTransaction(
                "Enter a description and an amount.".to_owned(),
            ));
        }

        let amount = self.amount.value().ok_or_else(|| {
            Error::InvalidTransaction(format!("{:?} is not a valid amount.", self.amount))
        })?;

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => now,
            Some(text) => parse_form_date(text, now, local_offset)?,
        };

        Ok(Transaction::new(self.kind, &self.description, amount, date))
    }
}

/// The data submitted by the form for editing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTransaction {
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the transaction was for, may be empty.
    #[serde(default)]
    pub description: String,
    /// How much money; anything that is not a number becomes zero.
    pub amount: AmountInput,
    /// The date and time, e.g. "2024-01-05T10:30" in local time.
    pub date: String,
}

impl EditTransaction {
    /// Build the replacement for `existing`, keeping its id.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransaction] if the date cannot be parsed.
    pub fn replace(
        self,
        existing: &Transaction,
        local_offset: UtcOffset,
    ) -> Result<Transaction, Error> {
        let date = parse_instant(&self.date, local_offset).ok_or_else(|| {
            Error::InvalidTransaction(format!("\"{}\" is not a valid date.", self.date))
        })?;

        Ok(Transaction {
            id: existing.id.clone(),
            kind: self.kind,
            description: self.description,
            amount: self.amount.value().unwrap_or(0.0),
            date: truncate_to_millis(date),
        })
    }
}

/// A bare date picks up the current local time of day to the minute, other
/// inputs are parsed as instants.
fn parse_form_date(
    text: &str,
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> Result<OffsetDateTime, Error> {
    if let Ok(day) = Date::parse(text, DATE_INPUT_FORMAT) {
        let local_now = now.to_offset(local_offset);
        let time_of_day = Time::from_hms(local_now.hour(), local_now.minute(), 0)
            .map_err(|error| Error::InvalidTransaction(error.to_string()))?;

        return Some(day.with_time(time_of_day).assume_offset(local_offset))
            .filter(|date| is_storable(*date))
            .ok_or_else(|| Error::InvalidTransaction(format!("\"{text}\" is not a valid date.")));
    }

    parse_instant(text, local_offset)
        .ok_or_else(|| Error::InvalidTransaction(format!("\"{text}\" is not a valid date.")))
}
