//! `lazykit defaults` – show the default retry policy.

use anyhow::Result;
use lazykit_core::config::LazykitConfig;

pub fn run_defaults(cfg: &LazykitConfig, json: bool) -> Result<()> {
    let retry = cfg.retry_or_default();
    if json {
        println!("{}", serde_json::to_string_pretty(&retry)?);
        return Ok(());
    }
    let opt = |v: Option<f64>| v.map(|s| format!("{s}s")).unwrap_or_else(|| "-".to_string());
    println!("{:<18} {}", "max_retries", retry.max_retries);
    println!("{:<18} {}s", "delay", retry.delay_secs);
    println!("{:<18} {}", "backoff_multiplier", retry.backoff_multiplier);
    println!("{:<18} {}", "max_duration", opt(retry.max_duration_secs));
    println!(
        "{:<18} {}",
        "alert_threshold",
        retry
            .alert_threshold
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("{:<18} {}", "max_delay", opt(retry.max_delay_secs));
    Ok(())
}
