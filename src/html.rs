use maud::{DOCTYPE, Markup, PreEscaped, html};

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

pub enum HeadElement {
    /// Inline CSS.
    Style(PreEscaped<String>),
    /// JavaScript source code.
    ScriptSource(PreEscaped<String>),
}

pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="id"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Keuangan" }
                link rel="icon" href="/favicon.ico";
                link href="/static/main.css" rel="stylesheet";

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::Style(text) => style { (text) }
                        HeadElement::ScriptSource(text) => script { (text) }
                    }
                }
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

/// A centred card with a heading, used by the log-in page.
pub fn card(title: &str, body: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (title)
                    }

                    (body)
                }
            }
        }
    }
}

/// Styles shared by the printable views: a narrow page without decoration
/// and a print button that disappears on paper.
pub fn print_styles() -> HeadElement {
    HeadElement::Style(PreEscaped(
        r#"
        .print-page {
            max-width: 80mm;
            margin: 0 auto;
            padding: 1rem;
            background: white;
            color: black;
            font-family: monospace;
        }
        @media print {
            .no-print {
                display: none;
            }
            body {
                background: white;
            }
        }
        "#
        .to_owned(),
    ))
}

/// Format `number` as Indonesian Rupiah rounded to a whole number, e.g.
/// "Rp 1.250.000".
pub fn format_rupiah(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("Rp ")
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(0)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-Rp ")
            .ok()
            .map(|fmt| fmt.precision(Precision::Decimals(0)))
    });

    let number = number.round();

    let formatted = match (positive_fmt, negative_fmt) {
        (Some(positive_fmt), Some(negative_fmt)) => {
            if number < 0.0 {
                negative_fmt.fmt_string(number.abs())
            } else if number > 0.0 {
                positive_fmt.fmt_string(number)
            } else {
                // Zero is hardcoded as "0", so we must specify the formatted string for zero
                "Rp 0".to_owned()
            }
        }
        _ => format!("Rp {number:.0}"),
    };

    // Rupiah groups thousands with dots.
    formatted.replace(',', ".")
}

#[cfg(test)]
mod format_rupiah_tests {
    use super::format_rupiah;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_rupiah(1_250_000.0), "Rp 1.250.000");
    }

    #[test]
    fn rounds_to_whole_rupiah() {
        assert_eq!(format_rupiah(999.6), "Rp 1.000");
    }

    #[test]
    fn formats_zero_and_negatives() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(-45_000.0), "-Rp 45.000");
    }
}
