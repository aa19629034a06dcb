use std::fs;

use anyhow::{Context, Result};
use tcg_pricing::{evaluate_alert, generate_csv, parse_csv, reprice_rows, RepricingSettings};

use crate::{formatting::format_price_changes, PriceAlertParams, RepriceParams};

pub fn reprice_file(params: RepriceParams) {
    if let Err(e) = try_reprice_file(params) {
        eprintln!("Repricing failed. {e:#}");
        std::process::exit(1);
    }
}

fn try_reprice_file(params: RepriceParams) -> Result<()> {
    let content = fs::read_to_string(&params.input).with_context(|| format!("Could not read {}", params.input))?;
    let original = parse_csv(&content)?;
    let mut settings = RepricingSettings::new(params.strategy).with_undercut_pct(params.undercut_pct);
    settings.floor_price = params.floor_price;
    let mut rows = original.clone();
    let summary = reprice_rows(&mut rows, &settings);
    println!("{}", format_price_changes(&original, &rows));
    println!(
        "{} repriced, {} unchanged, {} skipped (no market data), {} failed",
        summary.repriced, summary.unchanged, summary.skipped, summary.failed
    );
    if params.dry_run {
        return Ok(());
    }
    let csv = generate_csv(&rows)?;
    fs::write(&params.output, csv).with_context(|| format!("Could not write {}", params.output))?;
    println!("Wrote {}", params.output);
    Ok(())
}

pub fn print_price_alert(params: PriceAlertParams) {
    let PriceAlertParams { old_price, new_price, threshold_pct, direction } = params;
    let triggered = evaluate_alert(old_price, new_price, threshold_pct, direction);
    let verdict = if triggered { "triggers" } else { "does not trigger" };
    println!("{old_price} -> {new_price} {verdict} a {threshold_pct}% '{direction}' alert");
}
