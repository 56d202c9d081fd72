//! Receipt text parsing.
//!
//! Pure functions over OCR output: line items, totals, date, store, payment
//! method and a confidence score. No I/O happens here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SAMPLE_RECEIPT: &str = "WELCOME TO CITY MART
123 Main Street, Anytown, USA

01/15/2024  2:34 PM

Milk 1% Gallon    $3.49
Bread Whole Wheat  $2.99
Eggs Large Dozen   $4.29
Apples Red 3lb     $5.99

SUBTOTAL          $16.76
TAX               $1.34
TOTAL             $18.10

PAID WITH CARD
THANK YOU FOR SHOPPING!
";

const MAX_ITEM_PRICE: f64 = 1000.0;
const RULE_WIDTH: usize = 50;
const STORE_HINTS: [&str; 7] = ["mart", "store", "shop", "grocery", "market", "super", "pharmacy"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
    pub quantity: f64,
    pub total: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub items: Vec<ReceiptItem>,
    pub total_amount: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    /// Kept as printed; receipts disagree on day/month order.
    pub purchase_date: Option<String>,
    pub store_name: Option<String>,
    pub payment_method: Option<String>,
    pub confidence: f64,
    pub raw_text: String,
    pub total_items: usize,
    pub calculated_total: Option<f64>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("receipt regex")
}

// "name qty @ price" (or "qty x price", or just whitespace), then "name price".
// First hit wins. The quantity must be set off from the price so "Eggs 12.99"
// is not read as 1 x 2.99.
static ITEM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?i)^(.*?)\s+(\d+(?:\.\d{1,2})?)(?:\s*[@x]\s*|\s+)\$?(\d+\.\d{2})"),
        re(r"(?i)^(.*?)\s+\$?(\d+\.\d{2})"),
    ]
});

static NOT_AN_ITEM: Lazy<Regex> = Lazy::new(|| re(r"(?i)total|\btax\b|\bchange\b|\bbalance\b|amount\s+due"));

// Matched against the lowercased line.
static TOTAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"total[\s:]*\$?(\d+\.\d{2})"),
        re(r"amount\s+due[\s:]*\$?(\d+\.\d{2})"),
        re(r"balance[\s:]*\$?(\d+\.\d{2})"),
        re(r"grand\s+total[\s:]*\$?(\d+\.\d{2})"),
        re(r"subtotal[\s:]*\$?(\d+\.\d{2})"),
        re(r"tax[\s:]*\$?(\d+\.\d{2})"),
    ]
});

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"),
        re(r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b"),
        re(r"(?i)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{4}"),
    ]
});

static PAYMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(cash|credit|debit|visa|mastercard|amex|paypal|check)"),
        re(r"(paid\s+with\s+.*)"),
    ]
});

static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| re(r"\d"));
static HAS_CURRENCY: Lazy<Regex> = Lazy::new(|| re(r"[$€£¥₹]"));
static HAS_LINE_ITEM: Lazy<Regex> = Lazy::new(|| re(r"\n.*\$?\d+\.\d{2}"));

pub fn parse(text: &str) -> ParsedReceipt {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return ParsedReceipt { raw_text: text.to_string(), ..Default::default() };
    }

    let items: Vec<ReceiptItem> = lines.iter().filter_map(|l| parse_item(l)).collect();
    let (total_amount, subtotal, tax) = parse_totals(&lines);
    let confidence = parsing_confidence(&items, total_amount, subtotal, tax);
    let calculated_total = (!items.is_empty()).then(|| round2(items.iter().map(|i| i.total).sum()));

    ParsedReceipt {
        total_items: items.len(),
        items,
        total_amount,
        subtotal,
        tax,
        purchase_date: parse_date(&lines),
        store_name: parse_store(&lines),
        payment_method: parse_payment(&lines),
        confidence,
        raw_text: text.to_string(),
        calculated_total,
    }
}

fn parse_item(line: &str) -> Option<ReceiptItem> {
    if line.chars().count() < 3 {
        return None;
    }
    let caps = ITEM_PATTERNS.iter().find_map(|p| p.captures(line))?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() || NOT_AN_ITEM.is_match(name) {
        return None;
    }
    let (quantity, price) = match (caps.get(2), caps.get(3)) {
        (Some(q), Some(p)) => (q.as_str().parse().ok()?, p.as_str().parse::<f64>().ok()?),
        (Some(p), None) => (1.0, p.as_str().parse::<f64>().ok()?),
        _ => return None,
    };
    if price >= MAX_ITEM_PRICE {
        return None;
    }
    Some(ReceiptItem { name: name.to_string(), price, quantity, total: round2(quantity * price) })
}

/// Tax and subtotal lines set those fields; any other total-like line keeps the max.
fn parse_totals(lines: &[&str]) -> (Option<f64>, Option<f64>, Option<f64>) {
    let (mut total, mut subtotal, mut tax) = (None::<f64>, None, None);
    for line in lines {
        let lower = line.to_lowercase();
        for pattern in TOTAL_PATTERNS.iter() {
            let Some(amount) = pattern.captures(&lower).and_then(|c| c.get(1)?.as_str().parse::<f64>().ok()) else {
                continue;
            };
            if lower.contains("tax") {
                tax = Some(amount);
            } else if lower.contains("subtotal") {
                subtotal = Some(amount);
            } else if total.map_or(true, |t| amount > t) {
                total = Some(amount);
            }
        }
    }
    (total, subtotal, tax)
}

/// Last dated line wins.
fn parse_date(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .filter_map(|l| DATE_PATTERNS.iter().find_map(|p| p.find(l)).map(|m| m.as_str().to_string()))
        .last()
}

fn parse_store(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(3)
        .find(|l| {
            let n = l.chars().count();
            let lower = l.to_lowercase();
            n > 3 && n < 50 && STORE_HINTS.iter().any(|h| lower.contains(h))
        })
        .or_else(|| lines.first())
        .map(|l| l.to_string())
}

fn parse_payment(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .filter_map(|l| {
            let lower = l.to_lowercase();
            PAYMENT_PATTERNS.iter().find_map(|p| p.captures(&lower).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
        })
        .last()
}

/// Items reconcile against whichever of total, subtotal or total-minus-tax
/// they come closest to.
fn parsing_confidence(items: &[ReceiptItem], total: Option<f64>, subtotal: Option<f64>, tax: Option<f64>) -> f64 {
    let mut confidence: f64 = 0.0;
    if !items.is_empty() {
        confidence += 0.3;
        let sum: f64 = items.iter().map(|i| i.total).sum();
        let candidates = [total, subtotal, total.zip(tax).map(|(t, x)| t - x)];
        let diff = candidates.iter().flatten().map(|c| (sum - c).abs()).fold(f64::INFINITY, f64::min);
        if diff < 0.1 {
            confidence += 0.3;
        } else if diff < 1.0 {
            confidence += 0.2;
        }
    }
    if total.is_some_and(|t| t > 0.0) {
        confidence += 0.2;
    }
    if subtotal.is_some_and(|s| s > 0.0) {
        confidence += 0.1;
    }
    if tax.is_some_and(|t| t > 0.0) {
        confidence += 0.1;
    }
    round2(confidence.min(1.0))
}

/// Heuristic quality of raw OCR text.
pub fn text_confidence(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let mut c: f64 = 0.5;
    if HAS_DIGIT.is_match(text) {
        c += 0.2;
    }
    if HAS_CURRENCY.is_match(text) {
        c += 0.15;
    }
    if HAS_LINE_ITEM.is_match(text) {
        c += 0.15;
    }
    round2(c.min(1.0))
}

pub fn format_display(parsed: &ParsedReceipt) -> String {
    if parsed.items.is_empty() {
        return "No items detected in receipt.".to_string();
    }
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = vec![heavy.clone()];
    if let Some(store) = &parsed.store_name {
        out.push(format!("Store: {store}"));
    }
    if let Some(date) = &parsed.purchase_date {
        out.push(format!("Date: {date}"));
    }
    out.push(light.clone());
    out.push("Items:".to_string());
    out.push(light.clone());
    for (i, item) in parsed.items.iter().enumerate() {
        let n = i + 1;
        if item.quantity > 1.0 {
            out.push(format!("{n:2}. {} ({}x ${:.2}) = ${:.2}", item.name, fmt_qty(item.quantity), item.price, item.total));
        } else {
            out.push(format!("{n:2}. {} = ${:.2}", item.name, item.total));
        }
    }
    out.push(light);
    if let Some(v) = parsed.subtotal {
        out.push(format!("Subtotal: ${v:.2}"));
    }
    if let Some(v) = parsed.tax {
        out.push(format!("Tax: ${v:.2}"));
    }
    if let Some(v) = parsed.total_amount {
        out.push(format!("TOTAL: ${v:.2}"));
    }
    if let Some(p) = &parsed.payment_method {
        out.push(format!("Payment: {}", title_case(p)));
    }
    out.push(heavy);
    out.push(format!("Confidence: {:.1}%", parsed.confidence * 100.0));
    out.join("\n")
}

/// Map a user-facing language name or ISO code to the OCR engine's code.
pub fn language_code(lang: &str) -> String {
    let lower = lang.trim().to_lowercase();
    let code = match lower.as_str() {
        "" | "en" | "english" => "eng",
        "es" | "spanish" => "spa",
        "fr" | "french" => "fra",
        "de" | "german" => "deu",
        "it" | "italian" => "ita",
        "pt" | "portuguese" => "por",
        "ru" | "russian" => "rus",
        "zh" | "chinese" | "chinese_simplified" => "chi_sim",
        "zh-tw" | "chinese_traditional" => "chi_tra",
        "ja" | "japanese" => "jpn",
        "ko" | "korean" => "kor",
        "ar" | "arabic" => "ara",
        "hi" | "hindi" => "hin",
        "th" | "thai" => "tha",
        "vi" | "vietnamese" => "vie",
        _ => return lower,
    };
    code.to_string()
}

pub fn sample() -> ParsedReceipt {
    parse(SAMPLE_RECEIPT)
}

fn fmt_qty(q: f64) -> String {
    if q.fract() == 0.0 { format!("{}", q as i64) } else { format!("{q}") }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sample_receipt() {
        let r = sample();
        let names: Vec<_> = r.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Milk 1% Gallon", "Bread Whole Wheat", "Eggs Large Dozen", "Apples Red 3lb"]);
        assert_eq!(r.subtotal, Some(16.76));
        assert_eq!(r.tax, Some(1.34));
        assert_eq!(r.total_amount, Some(18.10));
        assert_eq!(r.calculated_total, Some(16.76));
        assert_eq!(r.purchase_date.as_deref(), Some("01/15/2024"));
        assert_eq!(r.store_name.as_deref(), Some("WELCOME TO CITY MART"));
        assert_eq!(r.payment_method.as_deref(), Some("paid with card"));
        assert_eq!(r.total_items, 4);
        assert_eq!(r.confidence, 1.0);
    }

    #[test]
    fn quantity_patterns() {
        let r = parse("Oranges 3 @ $0.50\nYogurt 2 x 1.25\nEggs 12.99\nTOTAL 16.99");
        assert_eq!(r.items.len(), 3);
        assert_eq!(r.items[0].quantity, 3.0);
        assert_eq!(r.items[0].total, 1.5);
        assert_eq!(r.items[1].quantity, 2.0);
        assert_eq!(r.items[1].price, 1.25);
        assert_eq!((r.items[2].quantity, r.items[2].price), (1.0, 12.99));
        assert_eq!(r.calculated_total, Some(16.99));
        assert_eq!(r.confidence, 0.8);
    }

    #[test]
    fn skips_summary_lines_and_huge_prices() {
        let r = parse("Corner Shop\nTV 1299.00\nChange $2.00\nBalance due $0.00\nGum $1.00");
        let names: Vec<_> = r.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gum"]);
        assert_eq!(r.store_name.as_deref(), Some("Corner Shop"));
    }

    #[test]
    fn store_falls_back_to_first_line() {
        let r = parse("Joe's\nCoffee 3.00\nVISA ****1234");
        assert_eq!(r.store_name.as_deref(), Some("Joe's"));
        assert_eq!(r.payment_method.as_deref(), Some("visa"));
    }

    #[test]
    fn dates_in_several_shapes() {
        assert_eq!(parse("x\n2024-03-09 10:00").purchase_date.as_deref(), Some("2024-03-09"));
        assert_eq!(parse("x\nMarch 9, 2024").purchase_date.as_deref(), Some("March 9, 2024"));
        assert_eq!(parse("x\n1/2/24\n3/4/24").purchase_date.as_deref(), Some("3/4/24"));
    }

    #[test]
    fn empty_text() {
        let r = parse("   \n  ");
        assert!(r.items.is_empty());
        assert_eq!(r.confidence, 0.0);
        assert_eq!(format_display(&r), "No items detected in receipt.");
        assert_eq!(text_confidence(""), 0.0);
    }

    #[test]
    fn text_confidence_factors() {
        assert_eq!(text_confidence("hello"), 0.5);
        assert_eq!(text_confidence("hello 42"), 0.7);
        assert_eq!(text_confidence("shop\nmilk $3.49"), 1.0);
    }

    #[test]
    fn display_layout() {
        let mut r = sample();
        r.items[0].quantity = 2.0;
        r.items[0].total = 6.98;
        let text = format_display(&r);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1], "Store: WELCOME TO CITY MART");
        assert_eq!(lines[2], "Date: 01/15/2024");
        assert_eq!(lines[4], "Items:");
        assert_eq!(lines[6], " 1. Milk 1% Gallon (2x $3.49) = $6.98");
        assert_eq!(lines[7], " 2. Bread Whole Wheat = $2.99");
        assert!(text.contains("TOTAL: $18.10"));
        assert!(text.contains("Payment: Paid With Card"));
        assert!(text.ends_with("Confidence: 100.0%"));
    }

    #[test]
    fn language_codes() {
        assert_eq!(language_code("en"), "eng");
        assert_eq!(language_code("Chinese_Traditional"), "chi_tra");
        assert_eq!(language_code("zh-TW"), "chi_tra");
        assert_eq!(language_code("KLINGON"), "klingon");
        assert_eq!(language_code(""), "eng");
    }
}
