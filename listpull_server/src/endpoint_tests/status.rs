use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use listpull_engine::{
    db_types::{AuditActor, EmailJob, EmailStatus, EmailTemplate, Order, OrderStatusType},
    OrderFlowApi,
};
use serde_json::Value;

use super::{
    helpers::{sample_job, sample_order, sample_staff, send_request, with_staff_token, ORDER_NUMBER, STAFF_TOKEN},
    mocks::MockBackend,
};
use crate::{auth::StaffApiToken, routes::UpdateOrderStatusRoute, server::json_config};

fn status_request(token: &str, order_number: &str, payload: &str) -> TestRequest {
    let req = TestRequest::patch()
        .uri(&format!("/api/orders/{order_number}/status"))
        .insert_header(("content-type", "application/json"))
        .set_payload(payload.to_string());
    with_staff_token(req, token)
}

#[actix_web::test]
async fn status_change_without_token() {
    let _ = env_logger::try_init().ok();
    let req = status_request("", ORDER_NUMBER, r#"{"status": "in_progress"}"#);
    let (status, body) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"A valid staff API token is required."}"#);
}

#[actix_web::test]
async fn status_change_with_wrong_token() {
    let _ = env_logger::try_init().ok();
    let req = status_request("not-the-token", ORDER_NUMBER, r#"{"status": "in_progress"}"#);
    let (status, _) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn staff_api_disabled_without_configured_token() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "in_progress"}"#);
    let (status, body) = send_request(req, configure_no_token).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"The staff API is disabled on this server."}"#);
}

#[actix_web::test]
async fn status_change_by_staff_member() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "in_progress", "staff_id": 3}"#);
    let (status, body) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "in_progress");
    assert_eq!(order["order_number"], ORDER_NUMBER);
}

#[actix_web::test]
async fn ready_by_the_system_queues_an_email() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "ready"}"#);
    let (status, body) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "ready");
}

#[actix_web::test]
async fn status_change_by_unknown_staff_member() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "in_progress", "staff_id": 99}"#);
    let (status, body) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: Staff user 99 does not exist"}"#);
}

#[actix_web::test]
async fn unknown_status_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "lost_in_the_mail"}"#);
    let (status, _) = send_request(req, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn terminal_orders_cannot_change() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, "LP-240517-DONE", r#"{"status": "ready"}"#);
    let (status, body) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("is picked_up, and can no longer change status"));
}

#[actix_web::test]
async fn unchanged_status_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, ORDER_NUMBER, r#"{"status": "submitted"}"#);
    let (status, body) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("is already submitted"));
}

#[actix_web::test]
async fn missing_order() {
    let _ = env_logger::try_init().ok();
    let req = status_request(STAFF_TOKEN, "LP-240517-NOPE", r#"{"status": "ready"}"#);
    let (status, _) = send_request(req, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn register(cfg: &mut ServiceConfig, backend: MockBackend, token: StaffApiToken) {
    cfg.app_data(web::Data::new(OrderFlowApi::new(backend)))
        .app_data(web::Data::new(token))
        .app_data(json_config())
        .service(web::scope("/api").service(UpdateOrderStatusRoute::<MockBackend>::new()));
}

/// Any backend call would panic.
fn configure_untouched(cfg: &mut ServiceConfig) {
    register(cfg, MockBackend::new(), StaffApiToken::new(STAFF_TOKEN));
}

fn configure_no_token(cfg: &mut ServiceConfig) {
    register(cfg, MockBackend::new(), StaffApiToken::default());
}

fn configure_transitions(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order_by_number().returning(|number| match number.as_str() {
        ORDER_NUMBER => Ok(Some(sample_order(OrderStatusType::Submitted))),
        "LP-240517-DONE" => {
            let order = sample_order(OrderStatusType::PickedUp);
            Ok(Some(Order { order_number: number.clone(), ..order }))
        },
        _ => Ok(None),
    });
    backend.expect_fetch_staff_user().returning(|id| Ok((id == 3).then(|| sample_staff(id))));
    backend.expect_update_order_status().returning(|_, old, new, actor, now| {
        assert_eq!(old, OrderStatusType::Submitted);
        match new {
            OrderStatusType::InProgress => assert_eq!(actor.to_string(), "staff:3"),
            _ => assert_eq!(*actor, AuditActor::System),
        }
        Ok(Order { status: new, updated_at: now, ..sample_order(old) })
    });
    backend.expect_enqueue_email().times(0..=1).returning(|job| {
        assert_eq!(job.template, EmailTemplate::Ready);
        Ok(EmailJob { order_id: job.order_id, ..sample_job(2, EmailTemplate::Ready, EmailStatus::Pending) })
    });
    register(cfg, backend, StaffApiToken::new(STAFF_TOKEN));
}
