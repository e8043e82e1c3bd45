//! Printable receipt and warranty card views.
//!
//! Both pages are rendered from their query string alone and touch no stored
//! data.

mod receipt;
mod warranty;

use axum::extract::FromRef;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::AppState;

pub use receipt::get_receipt_page;
pub use warranty::get_warranty_page;

/// The state needed by the print views.
#[derive(Debug, Clone)]
pub struct PrintState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for PrintState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The shop printed on receipts and warranty cards.
pub const SHOP_NAME: &str = "Gadget Nusantara";

/// Indonesian short dates, e.g. "5/1/2024".
const SHORT_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day padding:none]/[month padding:none]/[year]");

/// Parse a number typed into a form field, `None` for blank or non-numeric text.
fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
