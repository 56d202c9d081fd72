use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::AppConfig;
use service::ocr::OcrEngine;
use service::receipt::SAMPLE_RECEIPT;
use service::AppServices;
use upstream::{Upload, UpstreamError};

const BOUNDARY: &str = "pantry-test-boundary";

/// Plays the OCR service: records the language it was asked for and replays a canned reply.
struct FakeOcr {
    reply: Result<Value, String>,
    seen_lang: Mutex<Option<String>>,
}

impl FakeOcr {
    fn text(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(json!({ "success": true, "text": text })), seen_lang: Mutex::new(None) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { reply: Err("connection refused".into()), seen_lang: Mutex::new(None) })
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, _upload: Upload, language: &str) -> Result<Value, UpstreamError> {
        *self.seen_lang.lock().unwrap() = Some(language.to_string());
        self.reply.clone().map_err(UpstreamError::Transport)
    }
}

fn app_with(engine: Arc<FakeOcr>) -> Router {
    let services = AppServices::with_ocr_engine(&AppConfig::default(), engine).unwrap();
    server::build_router(Arc::new(services), "/nonexistent/frontend")
}

fn app() -> Router {
    app_with(FakeOcr::text(SAMPLE_RECEIPT))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn multipart(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"receipt.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::post(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pantry");
}

#[tokio::test]
async fn metrics_count_api_requests() {
    let app = app();
    send(&app, get("/api/inventory")).await;
    let res = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("pantry_http_requests_total"));
    assert!(text.contains("group=\"inventory\""));
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let (status, body) = send(&app(), get("/docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/inventory"].is_object());
    assert!(body["paths"]["/api/ocr/receipt"].is_object());
    assert!(body["paths"]["/api/shopping/ai/smart-prioritize"].is_object());
    assert!(body["paths"]["/api/ai/meals/suggestions/{user}"].is_object());
}

#[tokio::test]
async fn inventory_lifecycle() {
    let app = app();
    let (status, created) = send(&app, post_json("/api/inventory", json!({ "name": "Milk", "quantity": 2, "unit": "l" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["category"], "dairy");
    assert_eq!(created["location"], "pantry");
    let id = created["id"].as_str().unwrap().to_string();

    let (_, list) = send(&app, get("/api/inventory?search=mil")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, outcome) = send(&app, post_json(&format!("/api/inventory/{id}/consume"), json!({ "amount": 0.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["remaining"], 1.5);
    assert_eq!(outcome["removed"], false);

    let (_, outcome) = send(&app, post_json(&format!("/api/inventory/{id}/consume"), json!({ "amount": 5 }))).await;
    assert_eq!(outcome["removed"], true);

    let (status, err) = send(&app, get(&format!("/api/inventory/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["success"], false);
    assert_eq!(err["error"], "Not Found");
}

#[tokio::test]
async fn invalid_input_is_a_400() {
    let app = app();
    let (status, err) = send(&app, post_json("/api/inventory", json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("name"));

    let (status, _) = send(&app, get("/api/recipes?meal_type=brunch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shopping_merge_toggle_and_checkout() {
    let app = app();
    let (status, first) = send(&app, post_json("/api/shopping", json!({ "name": "Apples", "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = send(&app, post_json("/api/shopping", json!({ "name": "apple", "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["merged"], true);
    assert_eq!(second["item"]["quantity"], 3.0);

    let id = first["item"]["id"].as_str().unwrap().to_string();
    let (_, toggled) = send(&app, post_empty(&format!("/api/shopping/{id}/toggle"))).await;
    assert_eq!(toggled["purchased"], true);

    let (status, checkout) = send(&app, post_empty("/api/shopping/checkout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["moved"], 1);

    let (_, inventory) = send(&app, get("/api/inventory")).await;
    assert_eq!(inventory.as_array().unwrap().len(), 1);
    let (_, pending) = send(&app, get("/api/shopping?purchased=true")).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn meal_plan_from_recipe_and_week_view() {
    let app = app();
    let (status, plan) = send(
        &app,
        post_json("/api/meal-plans", json!({ "date": "2024-06-03", "meal_type": "dinner", "recipe_id": "tomato-basil-pasta" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!plan["title"].as_str().unwrap().is_empty());

    let (_, week) = send(&app, get("/api/meal-plans/week?start=2024-06-01")).await;
    let days = week.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[2]["meals"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        post_json("/api/meal-plans", json!({ "date": "2024-06-03", "meal_type": "dinner", "recipe_id": "no-such-recipe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn receipt_upload_is_parsed() {
    let engine = FakeOcr::text(SAMPLE_RECEIPT);
    let app = app_with(engine.clone());
    let (status, scan) = send(&app, multipart("/api/ocr/receipt?lang=es", "file", b"fake-jpeg")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scan["success"], true);
    assert_eq!(scan["items"].as_array().unwrap().len(), 4);
    assert_eq!(scan["total"], 18.10);
    assert!(scan["formattedDisplay"].as_str().unwrap().contains("Milk"));
    assert_eq!(engine.seen_lang.lock().unwrap().as_deref(), Some("spa"));
}

#[tokio::test]
async fn receipt_upload_errors() {
    let app = app();
    let (status, _) = send(&app, multipart("/api/ocr/receipt", "image", b"fake-jpeg")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, multipart("/api/ocr/receipt", "file", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let broken = app_with(FakeOcr::failing());
    let (status, err) = send(&broken, multipart("/api/ocr/receipt", "file", b"fake-jpeg")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(err["success"], false);
}

#[tokio::test]
async fn sample_and_import() {
    let app = app();
    let (_, sample) = send(&app, get("/api/ocr/test")).await;
    assert_eq!(sample["success"], true);
    let items = sample["parsedData"]["items"].clone();

    let (status, imported) = send(&app, post_json("/api/ocr/receipt/import", json!({ "items": items }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(imported["count"], 4);
    let (_, inventory) = send(&app, get("/api/inventory")).await;
    assert_eq!(inventory.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn barcode_lookup_and_add() {
    let app = app();
    let (status, product) = send(&app, get("/api/barcode/3017620422003")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["source"], "mock_db");

    let (status, _) = send(&app, get("/api/barcode/3017620422004")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, get("/api/barcode/4006381333931")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, item) = send(&app, post_empty("/api/barcode/3017620422003/add?quantity=2")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["quantity"], 2.0);
    assert_eq!(item["barcode"], "3017620422003");
}

#[tokio::test]
async fn shopping_ai_routes() {
    let app = app();
    let (_, cats) = send(&app, get("/api/shopping/ai/categories")).await;
    assert_eq!(cats["categories"].as_array().unwrap().len(), 10);

    let (status, _) = send(&app, get("/api/shopping/ai/seasonal/smarch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, july) = send(&app, get("/api/shopping/ai/seasonal/7")).await;
    assert_eq!(july["seasonal_recommendations"][0], "summer fruits");

    let (status, _) = send(
        &app,
        post_json("/api/shopping/ai/feedback", json!({ "user_id": "ghost", "item_name": "milk", "feedback": "positive" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = send(
        &app,
        post_json("/api/shopping/ai/predict", json!({ "user_id": "u1", "budget_limit": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{list}");
}

#[tokio::test]
async fn meal_ai_routes() {
    let app = app();
    let (_, prefs) = send(&app, get("/api/ai/meals/preferences/new-user")).await;
    assert_eq!(prefs["success"], false);
    assert_eq!(prefs["preferences"]["family_size"], 1);

    let (status, _) = send(&app, post_json("/api/ai/meals/generate", json!({ "user_id": "u1", "days": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, plan) = send(&app, post_json("/api/ai/meals/generate", json!({ "user_id": "u1", "days": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["success"], true);
    assert_eq!(plan["summary"]["waste_optimized"], false);

    let (status, _) = send(
        &app,
        post_json("/api/ai/meals/rate", json!({ "user_id": "u1", "meal_name": "Never Cooked", "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seeded_dashboard() {
    let app = server::startup::build_app(&AppConfig::default()).await.unwrap();
    let (status, stats) = send(&app, get("/api/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["inventory_count"], 10);
    assert_eq!(stats["shopping_pending"], 3);

    let (_, ideas) = send(&app, get("/api/ai/suggestions?limit=3")).await;
    assert_eq!(ideas.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_bodies_and_paths_use_json_errors() {
    let app = app();
    let broken = Request::post("/api/inventory")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, err) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["success"], false);
    assert_eq!(err["error"], "Invalid Request Body");

    let (status, err) = send(&app, post_json("/api/inventory", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid Request Body");
    assert!(err["detail"].as_str().unwrap().contains("name"));

    let untyped = Request::post("/api/inventory").body(Body::from("{}")).unwrap();
    let (status, err) = send(&app, untyped).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(err["success"], false);

    let (status, err) = send(&app, get("/api/inventory/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["success"], false);
    assert_eq!(err["error"], "Invalid Path");

    let (status, err) = send(&app, get("/api/inventory?expiring_within_days=soon")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid Query");
}

#[tokio::test]
async fn inventory_rejects_unknown_category_filter() {
    let app = app();
    send(&app, post_json("/api/inventory", json!({ "name": "Milk", "quantity": 1 }))).await;
    let (status, list) = send(&app, get("/api/inventory?category=Dairy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, err) = send(&app, get("/api/inventory?category=dairyy")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("dairyy"));
}

#[tokio::test]
async fn shopping_checkout_edges() {
    let app = app();
    let (status, checkout) = send(&app, post_empty("/api/shopping/checkout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["moved"], 0);

    let long = "x".repeat(101);
    let (status, err) = send(&app, post_json("/api/shopping", json!({ "name": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("100"));

    let (status, cleared) = send(&app, post_empty("/api/shopping/clear-purchased")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["removed"], 0);
}

#[tokio::test]
async fn consumption_log_summary_and_delete() {
    let app = app();
    let (_, milk) = send(&app, post_json("/api/inventory", json!({ "name": "Milk", "quantity": 2, "unit": "l" }))).await;
    let milk_id = milk["id"].as_str().unwrap().to_string();

    let (status, linked) = send(
        &app,
        post_json("/api/consumption", json!({ "member": "ana", "inventory_id": milk_id, "quantity": 0.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(linked["item_name"], "Milk");
    assert_eq!(linked["unit"], "l");
    let (_, left) = send(&app, get(&format!("/api/inventory/{milk_id}"))).await;
    assert_eq!(left["quantity"], 1.5);

    let (status, _) = send(
        &app,
        post_json("/api/consumption", json!({ "member": "ben", "item_name": "Apple", "quantity": 1, "calories": 95 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = send(&app, post_json("/api/consumption", json!({ "member": "ben" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("item_name"));
    let (status, _) = send(
        &app,
        post_json("/api/consumption", json!({ "member": "ben", "inventory_id": "00000000-0000-0000-0000-000000000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, bens) = send(&app, get("/api/consumption?member=ben")).await;
    assert_eq!(bens.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, get("/api/consumption/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_entries"], 2);
    assert_eq!(summary["members"].as_array().unwrap().len(), 2);

    let entry_id = linked["id"].as_str().unwrap().to_string();
    let req = Request::delete(format!("/api/consumption/{entry_id}")).body(Body::empty()).unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let req = Request::delete(format!("/api/consumption/{entry_id}")).body(Body::empty()).unwrap();
    let (status, err) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["success"], false);
}

#[tokio::test]
async fn nutrition_routes() {
    let app = app();
    let (status, apple) = send(&app, post_json("/api/nutrition/calculate", json!({ "food_name": "apple", "weight_g": 200 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(apple["food_name"], "apple");
    assert_eq!(apple["calories"], 104.0);

    let (status, precise) = send(
        &app,
        post_json("/api/nutrition/calculate", json!({ "food_name": "apple", "weight_g": 100, "precise": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(precise.is_object());

    let (status, err) = send(&app, post_json("/api/nutrition/calculate", json!({ "food_name": "unobtainium", "weight_g": 10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("Unknown food"));
    let (status, _) = send(&app, post_json("/api/nutrition/calculate", json!({ "food_name": "apple", "weight_g": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, check) = send(&app, post_json("/api/nutrition/portion", json!({ "food_name": "apple", "weight_g": 182 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["valid"], true);

    let (status, meal) = send(
        &app,
        post_json("/api/nutrition/meal", json!({ "ingredients": [{ "name": "apple", "confidence": 0.9 }, { "name": "banana" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meal["detailed_breakdown"].as_array().unwrap().len(), 2);
    assert!(meal["total_calories"].as_f64().unwrap() > 0.0);

    let (status, err) = send(&app, post_json("/api/nutrition/meal", json!({ "ingredients": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["success"], false);

    let (_, foods) = send(&app, get("/api/nutrition/foods")).await;
    assert!(foods.as_array().unwrap().iter().any(|f| f["name"] == "apple"));
}

#[tokio::test]
async fn smart_prioritize_route() {
    let app = app();
    let list = json!([
        { "name": "Milk", "category": "dairy", "price": 2.0 },
        { "name": "Steak", "category": "meat", "price": 12.0 },
        { "name": "Salt", "price": 1.0 }
    ]);
    let (status, body) = send(
        &app,
        post_json("/api/shopping/ai/smart-prioritize", json!({ "user_id": "u1", "shopping_list": list })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["budget_applied"], false);
    assert_eq!(body["prioritized_list"][0]["name"], "salt");

    let (_, budgeted) = send(
        &app,
        post_json("/api/shopping/ai/smart-prioritize", json!({ "user_id": "u1", "shopping_list": list, "budget_limit": 3.0 })),
    )
    .await;
    assert_eq!(budgeted["budget_applied"], true);
    assert_eq!(budgeted["total_items"], 2);

    let (status, _) = send(
        &app,
        post_json("/api/shopping/ai/smart-prioritize", json!({ "user_id": "u1", "shopping_list": list, "budget_limit": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn meal_batch_learn_and_suggestions() {
    let app = app();
    let meals = json!([
        { "user_id": "u2", "meal_name": "Veggie Stir Fry", "ingredients": ["broccoli", "rice"], "meal_type": "dinner", "rating": 5 },
        { "user_id": "u2", "meal_name": "Oat Bowl", "ingredients": ["oats", "banana"], "meal_type": "breakfast", "prep_time": 10 }
    ]);
    let (status, body) = send(&app, post_json("/api/ai/meals/batch-learn", meals)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["processed_count"], 2);

    let (status, _) = send(&app, post_json("/api/ai/meals/batch-learn", json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let bad = json!([
        { "user_id": "u3", "meal_name": "Fine", "ingredients": [], "meal_type": "lunch" },
        { "user_id": "u3", "meal_name": "Slow", "ingredients": [], "meal_type": "lunch", "prep_time": 100000 }
    ]);
    let (status, _) = send(&app, post_json("/api/ai/meals/batch-learn", bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ideas) = send(&app, get("/api/ai/meals/suggestions/u2?meal_type=dinner&count=2")).await;
    assert_eq!(status, StatusCode::OK, "{ideas}");
    assert_eq!(ideas["meal_type"], "dinner");
    let picks = ideas["suggestions"].as_array().unwrap();
    assert!(!picks.is_empty() && picks.len() <= 2);
    assert_eq!(ideas["count"], picks.len());
    assert!(picks.iter().all(|m| m["meal_type"] == "dinner"));

    let (_, default_type) = send(&app, get("/api/ai/meals/suggestions/u2")).await;
    assert_eq!(default_type["meal_type"], "lunch");

    let (status, _) = send(&app, get("/api/ai/meals/suggestions/u2?meal_type=brunch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, get("/api/ai/meals/suggestions/u2?count=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
