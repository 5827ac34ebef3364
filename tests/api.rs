// HTTP surface tests: the router served on an ephemeral port, backed by a
// mock listing service.

use std::{sync::Arc, time::Duration};

use motor_metrics::{AppState, config::Settings, listing_api, routes};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(service: &MockServer) -> String {
    let settings = Settings::for_service(&service.uri());
    let client = Arc::new(listing_api::build_client(&settings).unwrap());
    let app = routes::create_router(AppState::new(settings, client));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn create_session(client: &reqwest::Client, base: &str) -> u64 {
    let response = client
        .post(format!("{}/api/sessions", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["id"].as_u64().unwrap()
}

// Polls the session until its search has settled
async fn settled_view(client: &reqwest::Client, base: &str, id: u64) -> Value {
    for _ in 0..100 {
        let view: Value = client
            .get(format!("{}/api/sessions/{}", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if view["phase"] != "searching" {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("search never settled");
}

fn listing(id: &str, year: i32, price: u64) -> Value {
    json!({
        "listing": { "id": id, "heading": format!("{} Honda Civic", year), "price": price, "miles": 12000 },
        "build": { "year": year, "make": "Honda", "model": "Civic" }
    })
}

#[tokio::test]
async fn health_and_makes_are_served() {
    let service = MockServer::start().await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    let makes: Vec<String> = client
        .get(format!("{}/api/makes", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(makes.iter().any(|m| m == "Honda"));
}

#[tokio::test]
async fn new_session_starts_idle_and_unknown_sessions_are_404() {
    let service = MockServer::start().await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();

    let id = create_session(&client, &base).await;
    let view = settled_view(&client, &base, id).await;
    assert_eq!(view["phase"], "idle");
    assert_eq!(view["sortKey"], "none");
    assert_eq!(view["listings"], json!([]));

    let missing = client
        .get(format!("{}/api/sessions/{}", base, id + 1000))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_zip_is_rejected_without_a_request() {
    let service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listings": [] })))
        .expect(0)
        .mount(&service)
        .await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    let response = client
        .post(format!("{}/api/sessions/{}/search", base, id))
        .json(&json!({ "zip": "  ", "radius": 50 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("ZIP"));

    let view = settled_view(&client, &base, id).await;
    assert_eq!(view["phase"], "idle");
}

#[tokio::test]
async fn search_sort_and_select_over_http() {
    let service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("zip", "30301"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "listings": [
                listing("old", 2012, 9_000),
                listing("pricey", 2022, 28_000),
                listing("cheap", 2021, 19_000),
            ]
        })))
        .mount(&service)
        .await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    let accepted = client
        .post(format!("{}/api/sessions/{}/search", base, id))
        .json(&json!({ "zip": "30301", "radius": "25", "yearMin": 2015, "yearMax": 2024 }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);

    let view = settled_view(&client, &base, id).await;
    assert_eq!(view["phase"], "success");
    assert_eq!(view["resultCount"], 2);

    let sorted: Value = client
        .put(format!("{}/api/sessions/{}/sort", base, id))
        .json(&json!({ "sortKey": "price-asc" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order: Vec<&str> = sorted["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["listing"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["cheap", "pricey"]);

    let bad_sort = client
        .put(format!("{}/api/sessions/{}/sort", base, id))
        .json(&json!({ "sortKey": "cheapest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_sort.status(), StatusCode::BAD_REQUEST);

    // Filtered out by the year range, so not selectable
    let hidden = client
        .put(format!("{}/api/sessions/{}/selection", base, id))
        .json(&json!({ "key": "old" }))
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let selected: Value = client
        .put(format!("{}/api/sessions/{}/selection", base, id))
        .json(&json!({ "key": "pricey" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(selected["selected"]["listing"]["id"], "pricey");

    let cleared: Value = client
        .delete(format!("{}/api/sessions/{}/selection", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cleared["selected"].is_null());
}

#[tokio::test]
async fn model_without_make_is_rejected() {
    let service = MockServer::start().await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    let response = client
        .put(format!("{}/api/sessions/{}/model", base, id))
        .json(&json!({ "model": "Civic" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn models_endpoint_proxies_the_lookup() {
    let service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .and(query_param("make", "Honda"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": ["Civic", "Accord"] })))
        .mount(&service)
        .await;
    let base = spawn_app(&service).await;

    let body: Value = reqwest::get(format!("{}/api/models/Honda", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "make": "Honda", "models": ["Accord", "Civic"] }));
}

#[tokio::test]
async fn landing_page_redirects_to_a_rendered_session() {
    let service = MockServer::start().await;
    let base = spawn_app(&service).await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.url().path().starts_with("/sessions/"));
    let html = response.text().await.unwrap();
    assert!(html.contains("Enter your search criteria above to find vehicles"));
}

#[tokio::test]
async fn form_without_zip_rerenders_with_the_problem() {
    let service = MockServer::start().await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    let response = client
        .post(format!("{}/sessions/{}/search", base, id))
        .form(&[("make", ""), ("model", ""), ("zip", ""), ("radius", "50")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = response.text().await.unwrap();
    assert!(html.contains("a ZIP code is required"));
}

#[tokio::test]
async fn empty_results_render_the_empty_state() {
    let service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listings": [], "count": 0 })))
        .mount(&service)
        .await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    let accepted = client
        .post(format!("{}/api/sessions/{}/search", base, id))
        .json(&json!({ "zip": "92617" }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);
    assert_eq!(settled_view(&client, &base, id).await["phase"], "success");

    let html = client
        .get(format!("{}/sessions/{}", base, id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("No vehicles found"));
    assert!(!html.contains("error-banner"));
}

#[tokio::test]
async fn search_form_keeps_what_was_entered() {
    let service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listings": [] })))
        .mount(&service)
        .await;
    let base = spawn_app(&service).await;
    let client = reqwest::Client::new();
    let id = create_session(&client, &base).await;

    // Rejected: the page comes back with the typed values
    let rejected = client
        .post(format!("{}/sessions/{}/search", base, id))
        .form(&[("zip", ""), ("radius", "75"), ("yearMin", "2016"), ("yearMax", "2020")])
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    let html = rejected.text().await.unwrap();
    assert!(html.contains(r#"value="75""#));
    assert!(html.contains(r#"value="2016""#));
    assert!(html.contains(r#"value="2020""#));

    // Accepted: the redirected page shows the search that ran
    let accepted = client
        .post(format!("{}/sessions/{}/search", base, id))
        .form(&[("zip", "92617"), ("radius", "30"), ("yearMin", "2018"), ("yearMax", "2022")])
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    settled_view(&client, &base, id).await;
    let html = client
        .get(format!("{}/sessions/{}", base, id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"value="92617""#));
    assert!(html.contains(r#"value="30""#));
    assert!(html.contains(r#"value="2018""#));
}
