use chrono::Utc;
use listpull_engine::{db_types::EmailStatus, db_url, EmailQueueApi, OrderManagement, SqliteDatabase};

use crate::{
    formatting::{format_email_job, format_email_jobs},
    QueueCommand,
};

pub async fn open_database(url: Option<String>) -> SqliteDatabase {
    let url = url.unwrap_or_else(db_url);
    match SqliteDatabase::open_and_migrate(&url, 1).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Could not open the database at {url}. {e}");
            std::process::exit(1);
        },
    }
}

pub async fn run_migrations(url: Option<String>) {
    let db = open_database(url).await;
    println!("Database at {} is up to date", db.url());
}

pub async fn handle_queue_command(url: Option<String>, command: QueueCommand) {
    let db = open_database(url).await;
    match command {
        QueueCommand::List { status } => list_jobs(db, status).await,
        QueueCommand::Show { id } => show_job(db, id).await,
        QueueCommand::Cleanup => cleanup(db).await,
    }
}

async fn list_jobs(db: SqliteDatabase, status: Option<EmailStatus>) {
    let api = EmailQueueApi::new(db);
    match api.jobs(status).await {
        Ok(jobs) => println!("{}", format_email_jobs(&jobs)),
        Err(e) => eprintln!("Could not fetch the email queue. {e}"),
    }
}

async fn show_job(db: SqliteDatabase, id: i64) {
    let api = EmailQueueApi::new(db.clone());
    let job = match api.fetch_job(id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            eprintln!("Email job #{id} does not exist");
            return;
        },
        Err(e) => {
            eprintln!("Could not fetch email job #{id}. {e}");
            return;
        },
    };
    let order = db.fetch_order_by_id(job.order_id).await.unwrap_or_else(|e| {
        eprintln!("Could not fetch order #{}. {e}", job.order_id);
        None
    });
    match format_email_job(&job, order.as_ref()) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Could not format email job #{id}. {e}"),
    }
}

async fn cleanup(db: SqliteDatabase) {
    let api = EmailQueueApi::new(db);
    match api.cleanup(Utc::now()).await {
        Ok(removed) => println!("Removed {removed} finished email jobs"),
        Err(e) => eprintln!("Could not clean up the email queue. {e}"),
    }
}
