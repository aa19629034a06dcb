use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use actix_web::{web, App, HttpResponse, HttpServer};
use discord_tools::{DiscordConfig, DiscordError, DiscordWebhook, Embed, EmbedField, Notifier, COLOR_RED};
use serde_json::{json, Value};

/// How the fake webhook should answer each request, in order. Once the script runs out, every request succeeds.
#[derive(Debug, Clone, Copy)]
enum Reply {
    Ok,
    RateLimitedHeader,
    RateLimitedBody,
    RateLimitedSilent,
    ServerError,
}

struct HookState {
    hits: AtomicUsize,
    script: Mutex<VecDeque<Reply>>,
    bodies: Mutex<Vec<Value>>,
}

impl HookState {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn hook(state: web::Data<HookState>, body: web::Json<Value>) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().unwrap().push(body.into_inner());
    let reply = state.script.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
    match reply {
        Reply::Ok => HttpResponse::NoContent().finish(),
        Reply::RateLimitedHeader => HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", "0"))
            .json(json!({"message": "You are being rate limited.", "retry_after": 30.0})),
        Reply::RateLimitedBody => {
            HttpResponse::TooManyRequests().json(json!({"message": "You are being rate limited.", "retry_after": 0.05}))
        },
        Reply::RateLimitedSilent => HttpResponse::TooManyRequests().finish(),
        Reply::ServerError => HttpResponse::InternalServerError().body("upstream is on fire"),
    }
}

async fn start_fake_discord(script: Vec<Reply>) -> (String, web::Data<HookState>) {
    let _ = env_logger::try_init();
    let state = web::Data::new(HookState {
        hits: AtomicUsize::new(0),
        script: Mutex::new(script.into()),
        bodies: Mutex::new(Vec::new()),
    });
    let data = state.clone();
    let server = HttpServer::new(move || App::new().app_data(data.clone()).route("/hook", web::post().to(hook)))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("could not bind the fake webhook");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    (format!("http://{addr}/hook"), state)
}

fn webhook(url: &str) -> DiscordWebhook {
    DiscordWebhook::new(DiscordConfig::new(url)).unwrap().with_default_retry_delay(Duration::from_millis(10))
}

fn alert() -> Vec<Embed> {
    vec![Embed::new("Stale order", COLOR_RED).with_field(EmbedField::new("Order", "LP-240517-ABCD"))]
}

#[actix_web::test]
async fn successful_post_sends_one_request() {
    let (url, state) = start_fake_discord(vec![]).await;
    assert!(webhook(&url).notify(alert()).await);
    assert_eq!(state.hits(), 1);
    let bodies = state.bodies.lock().unwrap();
    assert_eq!(bodies[0]["embeds"][0]["title"], "Stale order");
    assert_eq!(bodies[0]["embeds"][0]["color"], COLOR_RED);
    assert_eq!(bodies[0]["embeds"][0]["fields"][0]["value"], "LP-240517-ABCD");
}

#[actix_web::test]
async fn rate_limit_then_success_sends_two_requests() {
    let (url, state) = start_fake_discord(vec![Reply::RateLimitedHeader]).await;
    assert!(webhook(&url).notify(alert()).await);
    assert_eq!(state.hits(), 2);
}

#[actix_web::test]
async fn retry_after_falls_back_to_the_body_then_the_default() {
    let (url, state) = start_fake_discord(vec![Reply::RateLimitedBody]).await;
    assert!(webhook(&url).notify(alert()).await);
    assert_eq!(state.hits(), 2);

    let (url, state) = start_fake_discord(vec![Reply::RateLimitedSilent]).await;
    assert!(webhook(&url).notify(alert()).await);
    assert_eq!(state.hits(), 2);
}

#[actix_web::test]
async fn gives_up_after_two_rate_limits() {
    let (url, state) = start_fake_discord(vec![Reply::RateLimitedHeader, Reply::RateLimitedHeader]).await;
    let hook = webhook(&url);
    let err = hook.send(alert()).await.unwrap_err();
    assert!(matches!(err, DiscordError::RateLimited(_)));
    assert_eq!(state.hits(), 2);
}

#[actix_web::test]
async fn server_errors_are_not_retried() {
    let (url, state) = start_fake_discord(vec![Reply::ServerError]).await;
    let hook = webhook(&url);
    assert!(!hook.notify(alert()).await);
    assert_eq!(state.hits(), 1);
}

#[actix_web::test]
async fn unreachable_webhooks_do_not_panic() {
    // Nothing listens on port 9 on the loopback interface
    let hook = webhook("http://127.0.0.1:9/hook");
    assert!(!hook.notify(alert()).await);
}

#[actix_web::test]
async fn disabled_webhook_sends_nothing() {
    let (_url, state) = start_fake_discord(vec![]).await;
    let hook = DiscordWebhook::new(DiscordConfig::new("  ")).unwrap();
    assert!(!hook.is_enabled());
    assert!(!hook.notify(alert()).await);
    assert!(matches!(hook.send(alert()).await, Err(DiscordError::Disabled)));
    assert_eq!(state.hits(), 0);
}
