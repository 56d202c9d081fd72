use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use configs::OcrConfig;
use models::category::{guess_category, Category};
use models::inventory::{InventoryInput, InventoryItem};
use upstream::{ClientOptions, Upload, UpstreamClient, UpstreamError};

use crate::errors::ServiceError;
use crate::inventory::InventoryService;
use crate::receipt::{self, ParsedReceipt, ReceiptItem, SAMPLE_RECEIPT};

/// Text recognition backend.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Returns the engine's JSON reply; it must carry a `text` field on success.
    async fn recognize(&self, upload: Upload, language: &str) -> Result<Value, UpstreamError>;
}

/// Talks to the external OCR service: `POST {base_url}/ocr?lang=..` with a multipart `file`.
pub struct HttpOcrEngine {
    client: UpstreamClient,
}

impl HttpOcrEngine {
    pub fn new(cfg: &OcrConfig) -> Result<Self, UpstreamError> {
        let client = UpstreamClient::new("ocr", cfg.base_url.clone(), ClientOptions::from_ocr(cfg))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    async fn recognize(&self, upload: Upload, language: &str) -> Result<Value, UpstreamError> {
        self.client.post_multipart("/ocr", &[("lang", language)], upload).await
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub text_length: usize,
    pub item_count: usize,
    pub confidence_score: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptScan {
    pub success: bool,
    pub text: String,
    pub items: Vec<ReceiptItem>,
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub purchase_date: Option<String>,
    pub store_name: Option<String>,
    pub payment_method: Option<String>,
    pub confidence: f64,
    pub text_confidence: f64,
    pub formatted_display: String,
    #[serde(rename = "detected_language", skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<Value>,
    pub processing_stats: ProcessingStats,
}

impl ReceiptScan {
    fn from_text(text: String, detected_language: Option<String>, raw_result: Option<Value>) -> Self {
        let parsed = receipt::parse(&text);
        let formatted_display = receipt::format_display(&parsed);
        Self {
            success: true,
            processing_stats: ProcessingStats {
                text_length: text.chars().count(),
                item_count: parsed.items.len(),
                confidence_score: parsed.confidence,
            },
            text_confidence: receipt::text_confidence(&text),
            text,
            items: parsed.items,
            total: parsed.total_amount,
            subtotal: parsed.subtotal,
            tax: parsed.tax,
            purchase_date: parsed.purchase_date,
            store_name: parsed.store_name,
            payment_method: parsed.payment_method,
            confidence: parsed.confidence,
            formatted_display,
            detected_language,
            raw_result,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemSuggestion {
    pub name: String,
    pub category: Category,
    pub quantity: f64,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemScan {
    pub success: bool,
    pub text: String,
    pub text_confidence: f64,
    pub suggestion: Option<ItemSuggestion>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleScan {
    pub success: bool,
    pub sample_text: &'static str,
    pub parsed_data: ParsedReceipt,
    pub formatted_display: String,
    pub test_type: &'static str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReceiptImport {
    pub items: Vec<ReceiptItem>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Clone)]
pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    inventory: Arc<InventoryService>,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>, inventory: Arc<InventoryService>) -> Self {
        Self { engine, inventory }
    }

    pub async fn scan_receipt(&self, upload: Upload, lang: &str) -> Result<ReceiptScan, ServiceError> {
        let (text, raw) = self.recognize(upload, lang).await?;
        let scan = ReceiptScan::from_text(text, Some(lang.to_string()), Some(raw));
        info!(event = "ocr_receipt_scanned", items = scan.items.len(), confidence = scan.confidence);
        Ok(scan)
    }

    pub async fn scan_item(&self, upload: Upload, lang: &str) -> Result<ItemScan, ServiceError> {
        let (text, _) = self.recognize(upload, lang).await?;
        let suggestion = suggest_item(&text);
        Ok(ItemScan { success: true, text_confidence: receipt::text_confidence(&text), text, suggestion })
    }

    /// Local parsing only; nothing leaves the process.
    pub fn parse_text(&self, text: &str) -> Result<ReceiptScan, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::invalid("text required"));
        }
        Ok(ReceiptScan::from_text(text.to_string(), None, None))
    }

    pub fn sample(&self) -> SampleScan {
        let parsed = receipt::sample();
        SampleScan {
            success: true,
            sample_text: SAMPLE_RECEIPT,
            formatted_display: receipt::format_display(&parsed),
            parsed_data: parsed,
            test_type: "sample_receipt",
        }
    }

    /// Add confirmed receipt lines to the inventory.
    pub async fn import(&self, req: ReceiptImport, today: NaiveDate) -> Result<Vec<InventoryItem>, ServiceError> {
        if req.items.is_empty() {
            return Err(ServiceError::invalid("no items to import"));
        }
        let purchased = req.purchase_date.unwrap_or(today);
        let inputs = req
            .items
            .into_iter()
            .map(|i| InventoryInput {
                price: (i.price > 0.0).then_some(i.price),
                purchase_date: Some(purchased),
                location: req.location.clone(),
                ..InventoryInput::named(i.name, if i.quantity > 0.0 { i.quantity } else { 1.0 })
            })
            .collect();
        let created = self.inventory.create_many(inputs).await?;
        info!(event = "ocr_receipt_imported", count = created.len());
        Ok(created)
    }

    async fn recognize(&self, upload: Upload, lang: &str) -> Result<(String, Value), ServiceError> {
        if upload.bytes.is_empty() {
            return Err(ServiceError::invalid("uploaded file is empty"));
        }
        let language = receipt::language_code(lang);
        let raw = self.engine.recognize(upload, &language).await.map_err(|e| {
            warn!(event = "ocr_failed", error = %e);
            ServiceError::from(e)
        })?;
        if raw.get("success").and_then(Value::as_bool) == Some(false) {
            let msg = raw.get("error").and_then(Value::as_str).unwrap_or("OCR processing failed");
            return Err(ServiceError::Upstream(msg.to_string()));
        }
        let text = raw
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Upstream("OCR reply has no text".into()))?
            .to_string();
        Ok((text, raw))
    }
}

/// First receipt-style line item, else the first line with a few letters in it.
fn suggest_item(text: &str) -> Option<ItemSuggestion> {
    let parsed = receipt::parse(text);
    if let Some(item) = parsed.items.first() {
        return Some(ItemSuggestion {
            category: guess_category(&item.name),
            name: item.name.clone(),
            quantity: 1.0,
            price: Some(item.price),
        });
    }
    text.lines()
        .map(str::trim)
        .find(|l| l.chars().filter(|c| c.is_alphabetic()).count() >= 3)
        .map(|l| ItemSuggestion { category: guess_category(l), name: l.to_string(), quantity: 1.0, price: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedEngine(Result<Value, UpstreamError>);

    #[async_trait]
    impl OcrEngine for FixedEngine {
        async fn recognize(&self, _upload: Upload, language: &str) -> Result<Value, UpstreamError> {
            assert_eq!(language, "eng");
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(UpstreamError::CircuitOpen(n)) => Err(UpstreamError::CircuitOpen(*n)),
                Err(e) => Err(UpstreamError::Transport(e.to_string())),
            }
        }
    }

    fn service(reply: Result<Value, UpstreamError>) -> (Arc<InventoryService>, OcrService) {
        let inventory = Arc::new(InventoryService::new());
        (inventory.clone(), OcrService::new(Arc::new(FixedEngine(reply)), inventory))
    }

    fn upload() -> Upload {
        Upload { field: "file".into(), filename: "r.jpg".into(), content_type: Some("image/jpeg".into()), bytes: vec![1, 2, 3] }
    }

    #[tokio::test]
    async fn receipt_scan_parses_upstream_text() {
        let (_, svc) = service(Ok(json!({ "success": true, "text": SAMPLE_RECEIPT })));
        let scan = svc.scan_receipt(upload(), "en").await.unwrap();
        assert_eq!(scan.items.len(), 4);
        assert_eq!(scan.total, Some(18.10));
        assert_eq!(scan.processing_stats.item_count, 4);
        assert!(scan.formatted_display.contains("TOTAL: $18.10"));
        let body = serde_json::to_value(&scan).unwrap();
        assert_eq!(body["detected_language"], "en");
        assert_eq!(body["storeName"], "WELCOME TO CITY MART");
        assert!(body["rawResult"]["text"].is_string());
    }

    #[tokio::test]
    async fn upstream_failures_map_to_errors() {
        let (_, svc) = service(Ok(json!({ "success": false, "error": "bad image" })));
        assert!(matches!(svc.scan_receipt(upload(), "en").await, Err(ServiceError::Upstream(m)) if m == "bad image"));

        let (_, svc) = service(Err(UpstreamError::CircuitOpen("ocr")));
        assert!(matches!(svc.scan_receipt(upload(), "en").await, Err(ServiceError::Unavailable(_))));

        let (_, svc) = service(Ok(json!({ "success": true, "text": "x" })));
        let empty = Upload { bytes: vec![], ..upload() };
        assert!(matches!(svc.scan_receipt(empty, "en").await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn item_scan_suggests_name() {
        let (_, svc) = service(Ok(json!({ "text": "Organic Bananas 1.29\nPLU 4011" })));
        let scan = svc.scan_item(upload(), "english").await.unwrap();
        let s = scan.suggestion.unwrap();
        assert_eq!(s.name, "Organic Bananas");
        assert_eq!(s.category, Category::Produce);
        assert_eq!(s.price, Some(1.29));

        let (_, svc) = service(Ok(json!({ "text": "42\nGreek Yogurt" })));
        let s = svc.scan_item(upload(), "en").await.unwrap().suggestion.unwrap();
        assert_eq!(s.name, "Greek Yogurt");
        assert_eq!(s.category, Category::Dairy);
    }

    #[tokio::test]
    async fn import_adds_inventory() {
        let (inventory, svc) = service(Ok(json!({})));
        let parsed = receipt::sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let created = svc
            .import(ReceiptImport { items: parsed.items, purchase_date: None, location: Some("fridge".into()) }, today)
            .await
            .unwrap();
        assert_eq!(created.len(), 4);
        let milk = created.iter().find(|i| i.name.starts_with("Milk")).unwrap();
        assert_eq!(milk.category, Category::Dairy);
        assert_eq!(milk.expiry_date, NaiveDate::from_ymd_opt(2024, 1, 25));
        assert_eq!(milk.price, Some(3.49));
        assert_eq!(inventory.count().await, 4);

        let err = svc.import(ReceiptImport { items: vec![], purchase_date: None, location: None }, today).await;
        assert!(err.is_err());
    }

    #[test]
    fn sample_and_local_parse() {
        let (_, svc) = service(Ok(json!({})));
        let s = svc.sample();
        assert_eq!(s.test_type, "sample_receipt");
        assert_eq!(s.parsed_data.total_items, 4);
        assert!(svc.parse_text("  ").is_err());
        let scan = svc.parse_text("Bread 2.50\nTOTAL 2.50").unwrap();
        assert_eq!(scan.items.len(), 1);
        assert!(scan.raw_result.is_none());
    }
}
