use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use serde::Deserialize;
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, format_rupiah,
        print_styles,
    },
    print::{PrintState, SHOP_NAME, parse_number},
    timezone::get_local_offset,
};

const PRINTED_AT_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[day padding:none]/[month padding:none]/[year], [hour].[minute].[second]"
);

/// The largest unit price accepted on a receipt, in rupiah.
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;
/// The largest quantity accepted on a receipt line.
pub const MAX_QUANTITY: f64 = 100_000.0;

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// What was sold or serviced.
    pub name: String,
    /// The unit price in whole rupiah.
    pub price: i64,
    /// How many units, at least one.
    pub quantity: i64,
}

impl LineItem {
    /// Build a line item from form text.
    ///
    /// Returns `None` when the name is blank, or the price or quantity is not
    /// a positive number no larger than [MAX_PRICE] or [MAX_QUANTITY]. The
    /// price is rounded to whole rupiah and the quantity rounded, with a
    /// minimum of one.
    pub fn parse(name: &str, price: &str, quantity: &str) -> Option<Self> {
        let name = name.trim();
        let price = parse_number(price).filter(|price| *price > 0.0 && *price <= MAX_PRICE)?;
        let quantity = parse_number(quantity)
            .filter(|quantity| *quantity > 0.0 && *quantity <= MAX_QUANTITY)?;

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_owned(),
            price: price.round() as i64,
            quantity: (quantity.round() as i64).max(1),
        })
    }

    /// Price times quantity.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(self.quantity)
    }
}

/// A receipt: line items with subtotal, tax and total.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// The items in the order they were entered.
    pub items: Vec<LineItem>,
    /// The tax rate as a fraction, e.g. `0.11`.
    pub tax_rate: f64,
}

impl Receipt {
    /// The sum of the line subtotals.
    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(LineItem::subtotal)
            .fold(0, i64::saturating_add)
    }

    /// The tax on the subtotal, rounded to whole rupiah.
    pub fn tax(&self) -> i64 {
        (self.subtotal() as f64 * self.tax_rate).round() as i64
    }

    /// Subtotal plus tax.
    pub fn total(&self) -> i64 {
        self.subtotal().saturating_add(self.tax())
    }
}

/// The query string of the receipt page.
///
/// Items are given as repeated keys, the n-th `name` pairing with the n-th
/// `price` and `qty`, e.g. `?name=LCD&price=350000&qty=1&name=Baterai&price=150000`.
#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    /// Item names.
    #[serde(default)]
    pub name: Vec<String>,
    /// Unit prices.
    #[serde(default)]
    pub price: Vec<String>,
    /// Quantities, one when missing.
    #[serde(default)]
    pub qty: Vec<String>,
    /// The tax rate as a fraction, zero when missing.
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

impl ReceiptQuery {
    /// Build the receipt, skipping items that do not parse.
    pub fn receipt(&self) -> Receipt {
        let items = self
            .name
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                let price = self.price.get(index).map(String::as_str).unwrap_or_default();
                let quantity = self.qty.get(index).map(String::as_str).unwrap_or("1");

                LineItem::parse(name, price, quantity)
            })
            .collect();

        Receipt {
            items,
            tax_rate: self
                .tax_rate
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .unwrap_or(0.0),
        }
    }
}

fn rupiah(amount: i64) -> String {
    format_rupiah(amount as f64)
}

fn add_item_form(receipt: &Receipt) -> Markup {
    html! {
        form method="get" action=(endpoints::RECEIPT_VIEW) class="no-print space-y-2 mb-4"
        {
            @for item in &receipt.items
            {
                input type="hidden" name="name" value=(item.name);
                input type="hidden" name="price" value=(item.price);
                input type="hidden" name="qty" value=(item.quantity);
            }

            @if receipt.tax_rate > 0.0
            {
                input type="hidden" name="tax_rate" value=(receipt.tax_rate);
            }

            label for="name" class=(FORM_LABEL_STYLE) { "Nama barang / jasa" }
            input type="text" name="name" id="name" placeholder="Contoh: Ganti LCD" class=(FORM_TEXT_INPUT_STYLE);

            label for="price" class=(FORM_LABEL_STYLE) { "Harga" }
            input type="number" name="price" id="price" min="1" class=(FORM_TEXT_INPUT_STYLE);

            label for="qty" class=(FORM_LABEL_STYLE) { "Jumlah" }
            input type="number" name="qty" id="qty" min="1" value="1" class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Tambah" }
        }
    }
}

fn receipt_view(receipt: &Receipt, printed_at: &str) -> Markup {
    html! {
        div class="print-page"
        {
            div class="text-center mb-4"
            {
                div class="font-bold" { (SHOP_NAME) }
                div class="text-xs" { "Jl. simpang - cikangkung" }
                div class="text-xs" { "Telp: 0858-6330-8655" }
            }

            (add_item_form(receipt))

            table class="w-full text-xs"
            {
                thead
                {
                    tr
                    {
                        th class="text-left" { "Item" }
                        th class="text-center" { "Jumlah" }
                        th class="text-right" { "Subtotal" }
                    }
                }

                tbody
                {
                    @for item in &receipt.items
                    {
                        tr class="line-item"
                        {
                            td { (item.name) }
                            td class="text-center" { (item.quantity) }
                            td class="text-right" { (rupiah(item.subtotal())) }
                        }
                    }
                }
            }

            dl class="mt-2 text-xs"
            {
                dt { "Subtotal" }
                dd id="subtotal" class="text-right" { (rupiah(receipt.subtotal())) }
                dt { "Tax" }
                dd id="tax" class="text-right" { (rupiah(receipt.tax())) }
                dt class="font-semibold" { "Total" }
                dd id="total" class="text-right font-semibold" { (rupiah(receipt.total())) }
            }

            p class="mt-3 text-center text-xs" { "Tanggal: " (printed_at) }
            p class="mt-4 text-center text-xs"
            {
                "Terima kasih -- Barang yang sudah di service tidak dapat dikembalikan"
            }

            button type="button" onclick="window.print()" class={"no-print mt-4 " (BUTTON_PRIMARY_STYLE)}
            {
                "Cetak Nota"
            }
        }
    }
}

/// Display a printable receipt for the items in the query string.
pub async fn get_receipt_page(
    State(state): State<PrintState>,
    Query(query): Query<ReceiptQuery>,
) -> Response {
    let receipt = query.receipt();
    let local_offset = get_local_offset(&state.local_timezone).unwrap_or_else(|| {
        tracing::warn!("Invalid timezone \"{}\", printing the time in UTC", state.local_timezone);
        UtcOffset::UTC
    });
    let printed_at = OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .format(PRINTED_AT_FORMAT)
        .unwrap_or_default();

    base("Nota", &[print_styles()], &receipt_view(&receipt, &printed_at)).into_response()
}
