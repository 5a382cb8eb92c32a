mod common;

use actix_web::test;
use serde_json::json;

use common::{bearer, guest_header, TestApp};

#[actix_rt::test]
async fn test_generate_requires_an_identity() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["retryable"], false);
}

#[actix_rt::test]
async fn test_invalid_token_is_rejected_even_with_guest_session() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .insert_header(guest_header())
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_guest_generation_falls_back_to_mock_tiers() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(guest_header())
        .set_json(&json!({ "destination": "Goa", "tripBrief": "beaches and seafood" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["source"], "mock");
    let tiers = body["tiers"].as_array().unwrap();
    let names: Vec<&str> = tiers.iter().map(|t| t["tier"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Budget", "Balanced", "Luxe"]);
    for tier in tiers {
        assert_eq!(tier["duration_days"], 2);
        assert_eq!(tier["owner"]["type"], "guest");
    }

    let req = test::TestRequest::get()
        .uri("/api/guest/itineraries")
        .insert_header(guest_header())
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[actix_rt::test]
async fn test_empty_destination_is_a_validation_error() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(guest_header())
        .set_json(&json!({ "destination": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["retryable"], false);
}

#[actix_rt::test]
async fn test_user_itineraries_are_owner_scoped() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(bearer("alice"))
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let generated: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = generated["tiers"][0]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/itineraries")
        .insert_header(bearer("alice"))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer("mallory"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer("mallory"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}", id))
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
async fn test_user_save_failure_is_fatal() {
    let test_app = TestApp::new();
    test_app.itineraries.set_unavailable(true);
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(bearer("alice"))
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "PERSISTENCE_ERROR");
    assert_eq!(body["error"]["retryable"], true);
}

#[actix_rt::test]
async fn test_guest_generation_survives_remote_outage() {
    let test_app = TestApp::new();
    test_app.guest_itineraries.set_unavailable(true);
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(guest_header())
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    for tier in body["tiers"].as_array().unwrap() {
        assert!(tier["id"].as_str().unwrap().starts_with("local_"));
    }
}

#[actix_rt::test]
async fn test_exports_are_downloadable() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(bearer("alice"))
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let generated: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = generated["tiers"][0]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}/export/calendar", id))
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let disposition = resp.headers().get("Content-Disposition").unwrap().to_str().unwrap().to_string();
    assert!(disposition.contains("goa-budget-itinerary.ics"));
    let body = test::read_body(resp).await;
    let ics = String::from_utf8(body.to_vec()).unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 6);

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}/export/document", id))
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("Content-Type").unwrap(), "application/pdf");
    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF-1.4"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/itineraries/{}/export/spreadsheet", id))
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
async fn test_image_population_without_search_leaves_activities_empty() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/itineraries/generate")
        .insert_header(bearer("alice"))
        .set_json(&json!({ "destination": "Goa" }))
        .to_request();
    let generated: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = generated["tiers"][1]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/itineraries/{}/images", id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["filled"], 0);
    assert_eq!(body["itinerary"]["id"], id.as_str());
}
