use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, TimeZone, Utc};
use listpull_engine::db_types::{
    EmailJob,
    EmailStatus,
    EmailTemplate,
    Order,
    OrderItem,
    OrderNumber,
    OrderStatusType,
    StaffRole,
    StaffUser,
};
use log::debug;

pub const STAFF_TOKEN: &str = "pull-them-cards";
pub const ORDER_NUMBER: &str = "LP-240517-ABCD";

pub fn with_staff_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }
}

pub async fn send_request(
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().map_err(|_| "Could not read response body".to_string())?;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 14, 30, 0).unwrap()
}

pub fn sample_order(status: OrderStatusType) -> Order {
    Order {
        id: 7,
        order_number: OrderNumber::from(ORDER_NUMBER),
        customer_name: "Nissa Revane".into(),
        customer_email: "nissa@example.com".into(),
        customer_phone: Some("555-0142".into()),
        game: "Magic: The Gathering".into(),
        notes: None,
        status,
        stale_alert_sent: false,
        pickup_alert_sent: false,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub fn sample_items(order_id: i64) -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: 1,
            order_id,
            quantity: 4,
            card_name: "Llanowar Elves".into(),
            set_code: Some("M19".into()),
            collector_number: None,
        },
        OrderItem { id: 2, order_id, quantity: 2, card_name: "Forest".into(), set_code: None, collector_number: None },
    ]
}

pub fn sample_job(id: i64, template: EmailTemplate, status: EmailStatus) -> EmailJob {
    EmailJob {
        id,
        order_id: 7,
        recipient: "nissa@example.com".into(),
        template,
        status,
        attempts: if status == EmailStatus::Failed { 3 } else { 0 },
        last_error: (status == EmailStatus::Failed).then(|| "Mail service rejected the message".to_string()),
        created_at: fixed_now(),
        sent_at: (status == EmailStatus::Sent).then(fixed_now),
    }
}

pub fn sample_staff(id: i64) -> StaffUser {
    StaffUser {
        id,
        email: "pull@example.com".into(),
        password_hash: "$argon2id$fake".into(),
        role: StaffRole::Staff,
        must_change_password: false,
        created_at: fixed_now(),
    }
}
