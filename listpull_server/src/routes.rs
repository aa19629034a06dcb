//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two should push their logic down
//! into the engine's APIs. Keep this module neat and tidy 🙏
//!
//! Public routes:
//! * `GET /health`
//! * `POST /orders` submits a decklist order.
//! * `GET /orders/{order_number}` looks up an order and its cards.
//!
//! Staff routes live under `/api` and need the staff bearer token (see [`crate::auth`]):
//! * `PATCH /api/orders/{order_number}/status`
//! * `GET /api/email_queue?status=failed`
//!
//! Handlers must never block the worker thread. Database and network work is always awaited.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use listpull_engine::{
    db_types::{AuditActor, OrderNumber},
    traits::{EmailQueueManagement, OrderManagement, StaffManagement},
    EmailQueueApi,
    OrderFlowApi,
};
use log::*;

use crate::{
    auth::StaffAuth,
    data_objects::{EmailQueueQuery, StatusUpdateRequest, SubmitOrderRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement, EmailQueueManagement);
/// Route handler for customer order submission.
///
/// The decklist is parsed into line items, the order is stored under a new order number and a confirmation email is
/// queued. Responds with `201 Created` and the stored order, including its items.
pub async fn submit_order<B>(
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<SubmitOrderRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + EmailQueueManagement,
{
    let (order, decklist) = body.into_inner().into_parts();
    debug!("💻️ POST new order for {}", order.customer_email);
    let result = api.submit_decklist(order, &decklist).await.map_err(|e| {
        debug!("💻️ Order submission rejected. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(result))
}

route!(order_by_number => Get "/orders/{order_number}" impl OrderManagement, EmailQueueManagement);
pub async fn order_by_number<B>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + EmailQueueManagement,
{
    let order_number = parse_order_number(&path.into_inner())?;
    debug!("💻️ GET order {order_number}");
    let order = api
        .fetch_order(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{order_number}/status"
    impl OrderManagement, EmailQueueManagement, StaffManagement);
/// Route handler for staff status changes.
///
/// The change is attributed to `staff_id` if one is given (it must belong to an existing staff account), otherwise to
/// the system. Terminal orders and no-op changes are refused with `409 Conflict`.
pub async fn update_order_status<B>(
    _staff: StaffAuth,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + EmailQueueManagement + StaffManagement,
{
    let order_number = parse_order_number(&path.into_inner())?;
    let StatusUpdateRequest { status, staff_id } = body.into_inner();
    let actor = match staff_id {
        Some(id) => {
            let user = api.db().fetch_staff_user(id).await?.ok_or_else(|| {
                debug!("💻️ Status change for {order_number} names unknown staff user #{id}");
                ServerError::InvalidRequestBody(format!("Staff user {id} does not exist"))
            })?;
            AuditActor::Staff(user.identity())
        },
        None => AuditActor::System,
    };
    info!("💻️ PATCH order {order_number} status to {status} by {actor}");
    let order = api.update_status(&order_number, status, actor).await?;
    Ok(HttpResponse::Ok().json(order))
}

// ----------------------------------------------   Email queue  -----------------------------------------------
route!(email_queue => Get "/email_queue" impl EmailQueueManagement);
pub async fn email_queue<B>(
    _staff: StaffAuth,
    query: web::Query<EmailQueueQuery>,
    api: web::Data<EmailQueueApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: EmailQueueManagement,
{
    let status = query.into_inner().status;
    debug!("💻️ GET email queue (status: {status:?})");
    let jobs = api.jobs(status).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

fn parse_order_number(s: &str) -> Result<OrderNumber, ServerError> {
    OrderNumber::from_str(s).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}
