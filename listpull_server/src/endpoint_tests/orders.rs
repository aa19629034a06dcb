use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use listpull_engine::{
    db_types::{EmailJob, EmailStatus, EmailTemplate, Order, OrderStatusType},
    OrderFlowApi,
};
use serde_json::Value;

use super::{
    helpers::{sample_items, sample_order, send_request},
    mocks::MockBackend,
};
use crate::{
    routes::{health, OrderByNumberRoute, SubmitOrderRoute},
    server::json_config,
};

const NEW_ORDER_JSON: &str = r#"{
    "customer_name": "Nissa Revane",
    "customer_email": "nissa@example.com",
    "customer_phone": "555-0142",
    "game": "Magic: The Gathering",
    "decklist": "4 Llanowar Elves (M19)\n2 Forest"
}"#;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn submit_order() {
    let _ = env_logger::try_init().ok();
    let req = json_post(NEW_ORDER_JSON);
    let (status, body) = send_request(req, configure_submission).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "submitted");
    assert_eq!(order["customer_email"], "nissa@example.com");
    assert!(order["order_number"].as_str().unwrap().starts_with("LP-"));
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["card_name"], "Llanowar Elves");
}

#[actix_web::test]
async fn submit_order_with_empty_decklist() {
    let _ = env_logger::try_init().ok();
    let payload = NEW_ORDER_JSON.replace(r"4 Llanowar Elves (M19)\n2 Forest", r"// nothing\n");
    let req = json_post(payload);
    let (status, body) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"error":"Could not read request body: Invalid decklist. The decklist does not contain any cards"}"#
    );
}

#[actix_web::test]
async fn submit_order_with_bad_email() {
    let _ = env_logger::try_init().ok();
    let payload = NEW_ORDER_JSON.replace("nissa@example.com", "nissa");
    let req = json_post(payload);
    let (status, body) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not a valid email address"));
}

#[actix_web::test]
async fn submit_malformed_json() {
    let _ = env_logger::try_init().ok();
    let req = json_post(r#"{"customer_name": "Nissa"}"#);
    let (status, body) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#));
}

#[actix_web::test]
async fn fetch_order_by_number() {
    let _ = env_logger::try_init().ok();
    // Lower case numbers are accepted
    let req = TestRequest::get().uri("/orders/lp-240517-abcd");
    let (status, body) = send_request(req, configure_lookup).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_number"], "LP-240517-ABCD");
    assert_eq!(order["status"], "ready");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders/LP-240517-ZZZZ");
    let (status, body) = send_request(req, configure_lookup).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order LP-240517-ZZZZ does not exist"}"#);
}

fn json_post<S: Into<String>>(payload: S) -> TestRequest {
    TestRequest::post().uri("/orders").insert_header(("content-type", "application/json")).set_payload(payload.into())
}

fn configure_submission(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_order().times(1).returning(|number, new_order, now| {
        assert_eq!(new_order.items.len(), 2);
        assert_eq!(new_order.customer_phone.as_deref(), Some("555-0142"));
        let order = sample_order(OrderStatusType::Submitted);
        Ok(Order { order_number: number.clone(), created_at: now, updated_at: now, ..order })
    });
    backend.expect_enqueue_email().times(1).returning(|job| {
        assert_eq!(job.template, EmailTemplate::Confirmation);
        Ok(EmailJob {
            id: 1,
            order_id: job.order_id,
            recipient: job.recipient,
            template: job.template,
            status: EmailStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: job.created_at,
            sent_at: None,
        })
    });
    backend.expect_fetch_order_items().returning(|id| Ok(sample_items(id)));
    cfg.app_data(web::Data::new(OrderFlowApi::new(backend)))
        .app_data(json_config())
        .service(SubmitOrderRoute::<MockBackend>::new());
}

/// Requests that are rejected before they reach storage. Any backend call would panic.
fn configure_untouched(cfg: &mut ServiceConfig) {
    let backend = MockBackend::new();
    cfg.app_data(web::Data::new(OrderFlowApi::new(backend)))
        .app_data(json_config())
        .service(SubmitOrderRoute::<MockBackend>::new());
}

fn configure_lookup(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_by_number().returning(|number| {
        if number.as_str() == "LP-240517-ABCD" {
            Ok(Some(sample_order(OrderStatusType::Ready)))
        } else {
            Ok(None)
        }
    });
    backend.expect_fetch_order_items().returning(|id| Ok(sample_items(id)));
    cfg.app_data(web::Data::new(OrderFlowApi::new(backend))).service(OrderByNumberRoute::<MockBackend>::new());
}
