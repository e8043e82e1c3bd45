use axum::{
    extract::Query,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, format_rupiah,
        print_styles,
    },
    print::{SHOP_NAME, SHORT_DATE_FORMAT, parse_number},
};

const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The date a warranty for a service on `service_date` runs out: the same
/// day one calendar month later.
///
/// Days past the end of the next month are clamped to its last day, e.g. a
/// service on 31 January is covered until 29 February in a leap year.
pub fn warranty_expiry(service_date: Date) -> Date {
    let (year, month) = match service_date.month() {
        Month::December => (service_date.year() + 1, Month::January),
        month => (service_date.year(), month.next()),
    };

    (1..=service_date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
        .unwrap_or(service_date)
}

/// The query string of the warranty card page. Every field may be left out.
#[derive(Debug, Default, Deserialize)]
pub struct WarrantyQuery {
    /// The phone model.
    #[serde(default)]
    pub model: String,
    /// The service price.
    #[serde(default)]
    pub price: String,
    /// How many units were serviced.
    #[serde(default)]
    pub quantity: String,
    /// What was done, e.g. "Ganti LCD".
    #[serde(default)]
    pub service_type: String,
    /// The service date as `YYYY-MM-DD`.
    #[serde(default)]
    pub service_date: String,
}

/// The details printed on a warranty card.
#[derive(Debug, Clone, PartialEq)]
pub struct WarrantyCard {
    /// The phone model.
    pub model: String,
    /// The service price in whole rupiah.
    pub price: i64,
    /// How many units were serviced, at least one.
    pub quantity: i64,
    /// What was done.
    pub service_type: String,
    /// When the service was done, if given.
    pub service_date: Option<Date>,
}

impl WarrantyCard {
    /// The last day of the warranty, if the service date is known.
    pub fn expiry(&self) -> Option<Date> {
        self.service_date.map(warranty_expiry)
    }
}

impl From<&WarrantyQuery> for WarrantyCard {
    fn from(query: &WarrantyQuery) -> Self {
        Self {
            model: query.model.trim().to_owned(),
            price: parse_number(&query.price)
                .map(|price| price.round() as i64)
                .unwrap_or(0),
            quantity: parse_number(&query.quantity)
                .map(|quantity| (quantity.round() as i64).max(1))
                .unwrap_or(1),
            service_type: query.service_type.trim().to_owned(),
            service_date: Date::parse(query.service_date.trim(), DATE_INPUT_FORMAT).ok(),
        }
    }
}

fn short_date(date: Option<Date>) -> String {
    date.and_then(|date| date.format(SHORT_DATE_FORMAT).ok())
        .unwrap_or_default()
}

fn warranty_form(query: &WarrantyQuery) -> Markup {
    html! {
        form method="get" action=(endpoints::WARRANTY_VIEW) class="no-print space-y-2 mb-4"
        {
            label for="model" class=(FORM_LABEL_STYLE) { "Model HP" }
            input type="text" name="model" id="model" value=(query.model) class=(FORM_TEXT_INPUT_STYLE);

            label for="price" class=(FORM_LABEL_STYLE) { "Harga" }
            input type="number" name="price" id="price" min="0" value=(query.price) class=(FORM_TEXT_INPUT_STYLE);

            label for="quantity" class=(FORM_LABEL_STYLE) { "Qty" }
            input type="number" name="quantity" id="quantity" min="1" value=(query.quantity) class=(FORM_TEXT_INPUT_STYLE);

            label for="service_type" class=(FORM_LABEL_STYLE) { "Jenis service" }
            input type="text" name="service_type" id="service_type" value=(query.service_type) class=(FORM_TEXT_INPUT_STYLE);

            label for="service_date" class=(FORM_LABEL_STYLE) { "Tanggal service" }
            input type="date" name="service_date" id="service_date" value=(query.service_date) class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Tampilkan" }
        }
    }
}

fn card_field(label: &str, id: &str, value: &str) -> Markup {
    html! {
        div
        {
            p class="font-semibold" { (label) }
            p id=(id) class="border-b border-black" { (value) }
        }
    }
}

fn warranty_view(query: &WarrantyQuery, card: &WarrantyCard) -> Markup {
    html! {
        div class="print-page"
        {
            (warranty_form(query))

            div class="text-center"
            {
                h2 class="font-bold" { "KARTU GARANSI" }
                p class="text-xs" { "Garansi berlaku 1 bulan sejak tanggal service" }
            }

            div class="space-y-2 text-sm"
            {
                (card_field("Model HP:", "model-value", &card.model))
                (card_field("Harga:", "price-value", &format_rupiah(card.price as f64)))
                (card_field("Qty:", "quantity-value", &format!("{} unit", card.quantity)))
                (card_field("Service:", "service-value", &card.service_type))
                (card_field("Tgl Service:", "service-date-value", &short_date(card.service_date)))
                (card_field("Garansi Sampai:", "expiry-value", &short_date(card.expiry())))

                p class="text-xs"
                {
                    "* Garansi berlaku untuk kerusakan yang sama" br;
                    "* Garansi tidak berlaku jika kartu garansi hilang" br;
                    "* Simpan kartu garansi untuk klaim"
                }

                div id="shop-name" class="mt-4 text-center text-xs" { (SHOP_NAME) }
            }

            button type="button" onclick="window.print()" class={"no-print mt-4 " (BUTTON_PRIMARY_STYLE)}
            {
                "Print Garansi"
            }
        }
    }
}

/// Display a printable warranty card for the service in the query string.
pub async fn get_warranty_page(Query(query): Query<WarrantyQuery>) -> Response {
    let card = WarrantyCard::from(&query);

    base("Kartu Garansi", &[print_styles()], &warranty_view(&query, &card)).into_response()
}
