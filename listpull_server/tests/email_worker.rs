use std::sync::Arc;

use chrono::{Duration, Utc};
use listpull_engine::{
    db_types::{EmailStatus, EmailTemplate, NewEmailJob, NewOrder},
    mailer::LogMailTransport,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    DrainOutcome,
    EmailDispatcher,
    EmailQueueManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use listpull_server::workers::{EmailWorker, CLEANUP_EVERY_N_TICKS};

async fn setup() -> (SqliteDatabase, EmailWorker<SqliteDatabase, LogMailTransport>) {
    let db = prepare_test_env(&random_db_path()).await;
    let dispatcher = Arc::new(EmailDispatcher::new(db.clone(), LogMailTransport, "ListPull"));
    (db, EmailWorker::new(dispatcher))
}

/// A sent job that is well past the retention window.
async fn old_sent_job(db: &SqliteDatabase) -> i64 {
    let long_ago = Utc::now() - Duration::days(40);
    let job = NewEmailJob::new(1, "gideon@example.com", EmailTemplate::Confirmation).with_created_at(long_ago);
    let job = db.enqueue_email(job).await.unwrap();
    db.mark_email_sent(job.id, long_ago).await.unwrap();
    job.id
}

#[tokio::test]
async fn each_tick_drains_the_queue() {
    let (db, mut worker) = setup().await;
    let api = OrderFlowApi::new(db.clone());
    let order = NewOrder::new("Gideon Jura", "gideon@example.com", "Magic: The Gathering");
    api.submit_decklist(order, "1 Gideon, Ally of Zendikar").await.unwrap();

    match worker.tick().await {
        Some(DrainOutcome::Completed(summary)) => assert_eq!(summary.sent, 1),
        other => panic!("Unexpected drain outcome: {other:?}"),
    }
    let jobs = db.fetch_emails(None).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, EmailStatus::Sent);
    assert!(jobs[0].sent_at.is_some());

    match worker.tick().await {
        Some(DrainOutcome::Completed(summary)) => assert_eq!(summary.total(), 0),
        other => panic!("Unexpected drain outcome: {other:?}"),
    }
    assert_eq!(worker.ticks(), 2);
}

#[tokio::test]
async fn startup_cleans_the_queue() {
    let (db, worker) = setup().await;
    let id = old_sent_job(&db).await;
    worker.startup().await;
    assert!(db.fetch_email_job(id).await.unwrap().is_none());
}

#[tokio::test]
async fn cleanup_runs_once_an_hour() {
    let (db, mut worker) = setup().await;
    let id = old_sent_job(&db).await;
    for _ in 1..CLEANUP_EVERY_N_TICKS {
        worker.tick().await;
    }
    assert!(db.fetch_email_job(id).await.unwrap().is_some());
    worker.tick().await;
    assert_eq!(worker.ticks(), CLEANUP_EVERY_N_TICKS);
    assert!(db.fetch_email_job(id).await.unwrap().is_none());
}
