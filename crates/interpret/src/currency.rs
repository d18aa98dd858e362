//! Currency conversion against a live rates endpoint.
//!
//! Accepted shapes, after currency symbols are rewritten to ISO codes:
//! `10 usd to eur`, `10usd eur`, `eur 25 in gbp`, `$25`, `200 pln`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use runbar_plugin::PluginContext;
use runbar_types::ExecutableCommand;
use serde_json::Value;
use tracing::{debug, warn};

use crate::format::synthetic_result;

/// Currency symbols and the code each one stands for.
pub const CURRENCY_SYMBOLS: [(&str, &str); 13] = [
    ("$", "usd"),
    ("€", "eur"),
    ("£", "gbp"),
    ("¥", "jpy"),
    ("₽", "rub"),
    ("₹", "inr"),
    ("₩", "krw"),
    ("₿", "btc"),
    ("฿", "thb"),
    ("₴", "uah"),
    ("₺", "try"),
    ("₼", "azn"),
    ("₾", "gel"),
];

const KNOWN_CODES: &[&str] = &[
    "aed", "afn", "all", "amd", "ang", "aoa", "ars", "aud", "awg", "azn", "bam", "bbd", "bdt", "bgn", "bhd", "bif",
    "bmd", "bnd", "bob", "brl", "bsd", "btc", "btn", "bwp", "byn", "bzd", "cad", "cdf", "chf", "clp", "cny", "cop",
    "crc", "cve", "czk", "djf", "dkk", "dop", "dzd", "egp", "ern", "etb", "eth", "eur", "fjd", "fkp", "gbp",
    "gel", "ghs", "gip", "gmd", "gnf", "gtq", "gyd", "hkd", "hnl", "htg", "huf", "idr", "ils", "inr", "iqd", "irr",
    "isk", "jmd", "jod", "jpy", "kes", "khr", "kmf", "kpw", "krw", "kwd", "kyd", "kzt", "lak", "lbp", "lkr",
    "lrd", "lsl", "lyd", "mad", "mdl", "mga", "mkd", "mmk", "mnt", "mop", "mru", "mur", "mvr", "mwk", "mxn", "myr",
    "mzn", "nad", "ngn", "nio", "nok", "npr", "nzd", "omr", "pab", "pen", "pgk", "php", "pkr", "pln", "pyg", "qar",
    "ron", "rsd", "rub", "rwf", "sar", "sbd", "scr", "sdg", "sek", "sgd", "shp", "sll", "sos", "srd", "ssp", "stn",
    "syp", "szl", "thb", "tjs", "tmt", "tnd", "top", "try", "ttd", "twd", "tzs", "uah", "ugx", "usd", "uyu", "uzs",
    "ves", "vnd", "vuv", "wst", "xaf", "xcd", "xof", "xpf", "yer", "zar", "zmw",
];

/// Currencies rendered without minor units.
const ZERO_DECIMAL_CODES: [&str; 2] = ["jpy", "krw"];

static CODE_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]{3})\s*(\d+(?:\.\d+)?)(.*)$").expect("valid currency prefix pattern")
});
static CONVERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-z]{3})(?:\s+(?:(?:to|in|into)\s+)?([a-z]{3}))?$")
        .expect("valid currency pattern")
});

static SYMBOL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let symbols = CURRENCY_SYMBOLS
        .iter()
        .map(|(symbol, _)| regex::escape(symbol))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"({symbols})\s*(\d+(?:\.\d+)?)")).expect("valid currency symbol pattern")
});

fn symbol_code(symbol: &str) -> &'static str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(candidate, _)| *candidate == symbol)
        .map_or("", |(_, code)| *code)
}

/// A recognised conversion request, before rates are known.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

fn is_known(code: &str) -> bool {
    KNOWN_CODES.binary_search(&code).is_ok()
}

/// Rewrite currency symbols to codes: `$25` and `25$` both become `25 usd`.
fn normalize(query: &str) -> String {
    let lowered = query.trim().to_lowercase();
    let mut text = SYMBOL_PREFIX
        .replace_all(&lowered, |captures: &Captures| {
            format!("{} {}", &captures[2], symbol_code(&captures[1]))
        })
        .into_owned();
    for (symbol, code) in CURRENCY_SYMBOLS {
        if text.contains(symbol) {
            text = text.replace(symbol, &format!(" {code} "));
        }
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match CODE_FIRST.captures(&text) {
        Some(captures) if is_known(&captures[1]) => {
            format!("{} {}{}", &captures[2], &captures[1], &captures[3])
        }
        _ => text,
    }
}

/// Recognise a conversion request.
///
/// A single code converts into `base_currency`; when the amount is already in
/// the base currency the target becomes EUR, or USD when the base is EUR.
pub fn parse_currency_query(query: &str, base_currency: &str) -> Option<CurrencyQuery> {
    let text = normalize(query);
    let captures = CONVERSION.captures(&text)?;
    let amount: f64 = captures[1].parse().ok()?;
    let from = captures[2].to_string();
    if !is_known(&from) {
        return None;
    }
    let base = base_currency.to_lowercase();
    let to = match captures.get(3) {
        Some(code) => code.as_str().to_string(),
        None if from == base => (if base == "eur" { "usd" } else { "eur" }).to_string(),
        None => base,
    };
    if !is_known(&to) {
        return None;
    }
    Some(CurrencyQuery { amount, from, to })
}

/// Pull the `to` rate out of either `{ "eur": 0.9 }` or `{ "usd": { "eur": 0.9 } }`.
fn extract_rate(body: &Value, from: &str, to: &str) -> Option<f64> {
    let rates = match body.get(from) {
        Some(nested @ Value::Object(_)) => nested,
        _ => body,
    };
    rates.get(to)?.as_f64().filter(|rate| rate.is_finite() && *rate > 0.0)
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(_, candidate)| *candidate == code)
        .map(|(symbol, _)| *symbol)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `€1,234.50`, `¥1,235`, `1,234.50 PLN`.
pub fn format_currency(amount: f64, code: &str) -> String {
    let decimals = if ZERO_DECIMAL_CODES.contains(&code) { 0 } else { 2 };
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let mut number = group_thousands(whole);
    if let Some(fraction) = fraction {
        number.push('.');
        number.push_str(fraction);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    match currency_symbol(code) {
        Some(symbol) => format!("{sign}{symbol}{number}"),
        None => format!("{sign}{number} {}", code.to_uppercase()),
    }
}

/// Convert a currency query using rates fetched through the context.
///
/// Fetch and decode failures are reported through [`PluginContext::fail`] and
/// produce no result.
pub async fn parse_currency_conversion(query: &str, context: &PluginContext) -> Vec<ExecutableCommand> {
    let Some(request) = parse_currency_query(query, &context.settings().base_currency) else {
        return Vec::new();
    };

    let rate = if request.from == request.to {
        1.0
    } else {
        let url = context.settings().currency_rates_url_for(&request.from);
        let body = match context.fetch_json(&url).await {
            Ok(body) => body,
            Err(error) => {
                warn!(from = %request.from, to = %request.to, %error, "currency rates request failed");
                context.fail(&context.t("commands.failures.currency", &[]));
                return Vec::new();
            }
        };
        match extract_rate(&body, &request.from, &request.to) {
            Some(rate) => rate,
            None => {
                warn!(from = %request.from, to = %request.to, "currency rate missing from response");
                context.fail(&context.t("commands.failures.currency", &[]));
                return Vec::new();
            }
        }
    };

    let converted = request.amount * rate;
    debug!(from = %request.from, to = %request.to, rate, "converted currency");
    let text = format_currency(converted, &request.to);
    vec![synthetic_result(text.clone(), text)]
}
