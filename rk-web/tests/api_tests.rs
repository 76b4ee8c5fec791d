//! HTTP surface tests: JSON API, HTML form flow and health
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`.

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::util::ServiceExt;

use helpers::{test_state, MirrorChat, StubProvider, UnconfiguredChat};
use rk_web::chat::ChatProvider;
use rk_web::providers::{Enrichment, ProviderError, ProviderRegistry};
use rk_web::records::EntityKind;

async fn create_test_app(providers: ProviderRegistry, chat: Arc<dyn ChatProvider>) -> Router {
    rk_web::build_router(test_state(providers, chat).await)
}

async fn default_app() -> Router {
    create_test_app(ProviderRegistry::new(), Arc::new(UnconfiguredChat)).await
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> JsonValue {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn json_request(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// `name=value` part of a Set-Cookie header, ready to send back
fn cookie_pair(response: &axum::response::Response) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let app = default_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rk-web");
    assert!(body["uptime_seconds"].is_number());
}

// ---------------------------------------------------------------------------
// JSON record API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ticker_crud_roundtrip() {
    let app = default_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickers",
            json!({"symbol": " aapl ", "name": "Apple Inc."}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["symbol"], "AAPL");
    assert_eq!(created["price"], 0.0);
    let id = created["ticker_id"].as_i64().unwrap();

    let response = app.clone().oneshot(get("/api/tickers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/tickers/{}", id),
            json!({"symbol": "AAPL", "name": "Apple", "price": "175.5"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Apple");
    assert_eq!(updated["price"], 175.5);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/tickers/{}", id))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_rejects_missing_required_field() {
    let app = default_app().await;

    let response = app
        .oneshot(json_request("POST", "/api/tickers", json!({"symbol": "AAPL"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "Symbol and name are required."
    );
}

#[tokio::test]
async fn test_new_weather_row_gets_placeholder_temperature() {
    let app = default_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/weather",
            json!({"city": "Macon", "state": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["temperature"], 75.0);
    assert!(created["state"].is_null());
}

#[tokio::test]
async fn test_enrich_endpoint_reports_new_price() {
    let stub = StubProvider::new(EntityKind::Ticker, |_| Ok(Enrichment::Quote { price: 191.45 }));
    let mut providers = ProviderRegistry::new();
    providers.register(stub);
    let app = create_test_app(providers, Arc::new(UnconfiguredChat)).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickers",
            json!({"symbol": "AAPL", "name": "Apple Inc.", "price": 0}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["ticker_id"].as_i64().unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/tickers/{}/enrich", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Price updated for AAPL: $191.45");
    assert_eq!(body["record"]["price"], 191.45);
}

#[tokio::test]
async fn test_enrich_endpoint_provider_miss_is_404() {
    let stub = StubProvider::new(EntityKind::Movie, |_| {
        Err(ProviderError::NotFound("Movie not found!".to_string()))
    });
    let mut providers = ProviderRegistry::new();
    providers.register(stub);
    let app = create_test_app(providers, Arc::new(UnconfiguredChat)).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/movies",
            json!({"title": "Nonexistent Film 12345"}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["movie_id"].as_i64().unwrap();

    let response = app
        .oneshot(json_request("POST", &format!("/api/movies/{}/enrich", id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let message = body_json(response).await["error"]["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.starts_with("Could not fetch data for 'Nonexistent Film 12345'"));
}

// ---------------------------------------------------------------------------
// HTML pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_add_form_redirects_with_one_shot_flash() {
    let app = default_app().await;

    let response = app
        .clone()
        .oneshot(form_request("/movies/add", "title=Inception"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/movies");
    let cookie = cookie_pair(&response);
    assert!(cookie.starts_with("rk_flash="));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/movies")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.contains("Max-Age=0"));

    let html = body_string(response).await;
    assert!(html.contains("Movie &#39;Inception&#39; added successfully!"));
    assert!(html.contains("Fetch Data"));
}

#[tokio::test]
async fn test_add_form_validation_error_is_flashed() {
    let app = default_app().await;

    let response = app
        .oneshot(form_request("/weather/add", "city=++&state=GA"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = cookie_pair(&response);
    let value = cookie.trim_start_matches("rk_flash=");
    let flash = rk_web::api::ui::flash::Flash::decode(value).unwrap();
    assert_eq!(flash.message, "City name is required.");
}

#[tokio::test]
async fn test_list_page_escapes_record_text() {
    let app = default_app().await;

    app.clone()
        .oneshot(form_request(
            "/movies/add",
            "title=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/movies")).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert(1)</script>"));
}

#[tokio::test]
async fn test_detail_of_missing_record_redirects_to_list() {
    let app = default_app().await;

    let response = app.oneshot(get("/tickers/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/tickers");
}

#[tokio::test]
async fn test_edit_form_updates_row() {
    let app = default_app().await;

    app.clone()
        .oneshot(form_request("/weather/add", "city=Gray&state=Georgia"))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/weather/1/edit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains(r#"value="75""#));

    let response = app
        .clone()
        .oneshot(form_request(
            "/weather/1/edit",
            "city=Gray&state=Georgia&temperature=45",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/weather");

    let response = app.oneshot(get("/api/weather/1")).await.unwrap();
    assert_eq!(body_json(response).await["temperature"], 45.0);
}

#[tokio::test]
async fn test_edit_form_keeps_unrounded_price() {
    let app = default_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickers",
            json!({"symbol": "AAPL", "name": "Apple", "price": 191.456}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["ticker_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/tickers/{}/edit", id)))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains(r#"value="191.456""#), "{}", html);

    // Rename only; the price goes back exactly as the form showed it
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/tickers/{}/edit", id),
            "symbol=AAPL&name=Apple+Inc.&price=191.456",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .oneshot(get(&format!("/api/tickers/{}", id)))
        .await
        .unwrap();
    let stored = body_json(response).await;
    assert_eq!(stored["name"], "Apple Inc.");
    assert_eq!(stored["price"], 191.456);
}

/// Router whose pool is already closed, so every acquire fails
async fn app_without_database() -> Router {
    let state = test_state(ProviderRegistry::new(), Arc::new(UnconfiguredChat)).await;
    let pool = state.db.clone();
    let app = rk_web::build_router(state);
    pool.close().await;
    app
}

#[tokio::test]
async fn test_pages_without_database_render_html_503() {
    let app = app_without_database().await;

    let requests = [
        get("/movies"),
        get("/tickers/1/edit"),
        form_request("/weather/add", "city=Gray"),
    ];
    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let html = body_string(response).await;
        assert!(html.contains("Database connection failed."), "{}", html);
        assert!(html.contains("<nav"), "{}", html);
    }
}

#[tokio::test]
async fn test_api_without_database_is_json_503() {
    let app = app_without_database().await;

    let response = app.oneshot(get("/api/movies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_delete_form_of_missing_row_flashes_not_found() {
    let app = default_app().await;

    let response = app
        .oneshot(form_request("/tickers/77/delete", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = cookie_pair(&response);
    let flash = rk_web::api::ui::flash::Flash::decode(cookie.trim_start_matches("rk_flash="))
        .unwrap();
    assert_eq!(flash.message, "Ticker not found.");
}

#[tokio::test]
async fn test_root_page_lists_collections() {
    let app = default_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"href="/movies""#));
    assert!(html.contains(r#"href="/tickers""#));
    assert!(html.contains(r#"href="/weather""#));
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chat_without_key_reports_configuration() {
    let app = default_app().await;

    let response = app
        .oneshot(json_request("POST", "/api/chat", json!({"question": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "Groq API key is not configured. Please set GROQ_API_KEY in environment variables."
    );
}

#[tokio::test]
async fn test_chat_empty_question_is_rejected() {
    let app = create_test_app(ProviderRegistry::new(), Arc::new(MirrorChat)).await;

    let response = app
        .oneshot(json_request("POST", "/api/chat", json!({"question": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["message"], "Question is required");
}

#[tokio::test]
async fn test_chatbot_page_renders_escaped_answer() {
    let app = create_test_app(ProviderRegistry::new(), Arc::new(MirrorChat)).await;

    let response = app
        .oneshot(form_request("/chatbot/ask", "question=%3Eb%3C"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // "<b>" reversed from ">b<"
    let html = body_string(response).await;
    assert!(html.contains("&lt;b&gt;"));
    assert!(!html.contains("<b>"));
}
