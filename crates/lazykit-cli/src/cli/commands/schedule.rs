//! `lazykit schedule` – dry run of the backoff waits.

use anyhow::Result;
use lazykit_core::config::{secs, LazykitConfig};
use lazykit_core::retry::Backoff;

pub fn run_schedule(cfg: &LazykitConfig, count: Option<usize>) -> Result<()> {
    let retry = cfg.retry_or_default();
    let max_delay = retry.max_delay_secs.map(secs).transpose()?;
    let count = count.unwrap_or_else(|| retry.max_retries.saturating_sub(1) as usize);

    let waits = Backoff::new(secs(retry.delay_secs)?, retry.backoff_multiplier, max_delay);
    let mut total = 0.0;
    println!("  {:>7}  {:>10}  {:>10}", "Retry", "Wait(s)", "Total(s)");
    for (i, wait) in waits.take(count).enumerate() {
        total += wait.as_secs_f64();
        println!("  {:>7}  {:>10.3}  {:>10.3}", i + 1, wait.as_secs_f64(), total);
    }
    Ok(())
}
