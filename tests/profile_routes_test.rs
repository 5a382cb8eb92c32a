mod common;

use std::sync::Arc;

use actix_web::test;
use serde_json::json;

use common::{bearer, CannedLlm, TestApp};
use itinera_api::services::llm_service::LlmError;

fn profile_body() -> serde_json::Value {
    json!({
        "start_city": "Mumbai",
        "destination_city": "Goa",
        "trip_start_date": "2026-11-07",
        "trip_end_date": "2026-11-10",
        "travel_purpose": "couple",
        "budget_max": 20000,
        "accommodation_style": "midrange",
        "dining_preference": "street food",
        "travel_pace": "moderate",
        "preferred_activities": ["Beaches"],
        "special_interests": ["Photography"],
        "profile_completed": true
    })
}

#[actix_rt::test]
async fn test_profile_requires_sign_in() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_profile_upsert_and_read() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .set_json(&profile_body())
        .to_request();
    let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["budget_min"], 10000);
    assert_eq!(saved["user_id"], "alice");

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .to_request();
    let loaded: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(loaded["start_city"], "Mumbai");
}

#[actix_rt::test]
async fn test_oversized_budget_is_rejected_before_packages() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut body = profile_body();
    body["budget_max"] = json!(1_000_000_000_000_000_000u64);
    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer("carol"))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/packages/generate")
        .insert_header(bearer("carol"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
async fn test_profile_validation() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut zero_budget = profile_body();
    zero_budget["budget_max"] = json!(0);
    let mut reversed = profile_body();
    reversed["trip_end_date"] = json!("2026-11-01");
    let mut no_interests = profile_body();
    no_interests["special_interests"] = json!([]);

    for body in [zero_budget, reversed, no_interests] {
        let req = test::TestRequest::put()
            .uri("/api/profile")
            .insert_header(bearer("alice"))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}

#[actix_rt::test]
async fn test_packages_fall_back_per_tier() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .set_json(&profile_body())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/packages/generate")
        .insert_header(bearer("alice"))
        .to_request();
    let variations: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let variations = variations.as_array().unwrap();
    assert_eq!(variations.len(), 3);
    for variation in variations {
        assert_eq!(variation["source"], "mock");
    }
    assert_eq!(variations[0]["tier"], "budget");
}

#[actix_rt::test]
async fn test_packages_need_a_profile() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/packages/generate")
        .insert_header(bearer("bob"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
async fn test_recommendation_parse_failure_is_reported() {
    let test_app = TestApp::with_llm(Arc::new(CannedLlm(Ok("Sorry, no ideas today".to_string()))));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .set_json(&profile_body())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "SCHEMA_ERROR");
    assert_eq!(body["error"]["retryable"], true);
}

#[actix_rt::test]
async fn test_recommendation_upstream_failure() {
    let test_app = TestApp::with_llm(Arc::new(CannedLlm(Err(LlmError::Status {
        status: 503,
        body: "overloaded".to_string(),
    }))));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer("alice"))
        .set_json(&profile_body())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}
