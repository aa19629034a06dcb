//! The server takes no command line arguments. If any are given, it prints the help text and a report of the current
//! settings, then exits.
use std::{env, fmt::Write};

/// Settings that are safe to print as-is.
const PLAIN_ENVS: [&str; 11] = [
    "RUST_LOG",
    "LP_HOST",
    "LP_PORT",
    "LP_DATABASE_URL",
    "LP_DIGEST_HOUR",
    "LP_DIGEST_TIMEZONE",
    "LP_STALE_ORDER_HOURS",
    "LP_PICKUP_HOLD_DAYS",
    "LP_MAIL_API_URL",
    "LP_MAIL_FROM",
    "LP_STORE_NAME",
];

/// Only whether these are set is reported, never their value.
const SECRET_ENVS: [&str; 3] = ["LP_DISCORD_WEBHOOK_URL", "LP_MAIL_API_KEY", "LP_STAFF_API_TOKEN"];

/// Returns true if the help text was printed and the process should exit.
pub fn handle_command_line_args() -> bool {
    if env::args().count() <= 1 {
        return false;
    }
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
    println!("{}", env_report(|name| env::var(name).ok()));
    true
}

fn env_report<F: Fn(&str) -> Option<String>>(lookup: F) -> String {
    let mut report = String::from("Current environment values:\n");
    for name in PLAIN_ENVS {
        let val = lookup(name).unwrap_or_else(|| "Not set".into());
        let _ = writeln!(report, "  {name:<35} {val}");
    }
    for name in SECRET_ENVS {
        let val = match lookup(name) {
            Some(s) if !s.trim().is_empty() => "<set, hidden>",
            _ => "Not set",
        };
        let _ = writeln!(report, "  {name:<35} {val}");
    }
    report
}
