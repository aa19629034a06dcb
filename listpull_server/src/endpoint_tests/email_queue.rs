use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use listpull_engine::{
    db_types::{EmailStatus, EmailTemplate},
    EmailQueueApi,
};
use serde_json::Value;

use super::{
    helpers::{sample_job, send_request, with_staff_token, STAFF_TOKEN},
    mocks::MockBackend,
};
use crate::{auth::StaffApiToken, routes::EmailQueueRoute, server::query_config};

#[actix_web::test]
async fn failed_emails() {
    let _ = env_logger::try_init().ok();
    let req = with_staff_token(TestRequest::get().uri("/api/email_queue?status=failed"), STAFF_TOKEN);
    let (status, body) = send_request(req, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let jobs: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["status"], "failed");
    assert_eq!(jobs[0]["attempts"], 3);
    assert_eq!(jobs[0]["last_error"], "Mail service rejected the message");
}

#[actix_web::test]
async fn whole_queue() {
    let _ = env_logger::try_init().ok();
    let req = with_staff_token(TestRequest::get().uri("/api/email_queue"), STAFF_TOKEN);
    let (status, body) = send_request(req, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let jobs: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[1]["template"], "ready");
}

#[actix_web::test]
async fn unknown_status_filter() {
    let _ = env_logger::try_init().ok();
    let req = with_staff_token(TestRequest::get().uri("/api/email_queue?status=bounced"), STAFF_TOKEN);
    let (status, body) = send_request(req, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read query parameters"#));
}

#[actix_web::test]
async fn queue_needs_staff_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/email_queue");
    let (status, _) = send_request(req, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_emails().returning(|status| {
        let jobs = vec![
            sample_job(1, EmailTemplate::Confirmation, EmailStatus::Sent),
            sample_job(2, EmailTemplate::Ready, EmailStatus::Pending),
            sample_job(3, EmailTemplate::Ready, EmailStatus::Failed),
        ];
        Ok(jobs.into_iter().filter(|j| status.map(|s| s == j.status).unwrap_or(true)).collect())
    });
    cfg.app_data(web::Data::new(EmailQueueApi::new(backend)))
        .app_data(web::Data::new(StaffApiToken::new(STAFF_TOKEN)))
        .app_data(query_config())
        .service(web::scope("/api").service(EmailQueueRoute::<MockBackend>::new()));
}
