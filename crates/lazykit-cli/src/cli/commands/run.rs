//! `lazykit run -- PROGRAM [ARGS]...` – run a program under the retry policy.

use anyhow::{bail, Result};
use clap::Args;
use lazykit_core::command::{self, CommandError, CommandSpec};
use lazykit_core::config::{multiplier, secs, LazykitConfig, RetryConfig};
use lazykit_core::retry::{self, RetryOptions, TracingReporter};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Maximum number of attempts, including the first (0 = use the default).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Initial wait before the first retry, in seconds (0 = use the default).
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Factor applied to the wait after each retry (>= 1.0).
    #[arg(long, value_name = "FACTOR")]
    pub backoff: Option<f64>,

    /// Give up once this many seconds have passed since the first attempt.
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<f64>,

    /// Warn on every failed attempt from this attempt number onward.
    #[arg(long, value_name = "N")]
    pub alert_threshold: Option<u32>,

    /// Upper bound on a single wait, in seconds.
    #[arg(long, value_name = "SECS")]
    pub max_delay: Option<f64>,

    /// Only retry these exit codes (repeatable). Default: any failure.
    #[arg(long = "retry-on", value_name = "CODE")]
    pub retry_on: Vec<i32>,

    /// Send retry messages to the log file instead of stderr.
    #[arg(long, short)]
    pub quiet: bool,

    /// Program to run, followed by its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Merge the config file section with command-line overrides.
///
/// `max_retries` and `delay` only become overrides when given on the command
/// line; otherwise they come from the default policy at resolution time.
pub(crate) fn run_options(
    retry_cfg: &RetryConfig,
    args: &RunArgs,
) -> Result<RetryOptions<CommandError>> {
    let mut opts = retry_cfg
        .options()?
        .retry_on(command::exit_codes(args.retry_on.clone()));
    if let Some(n) = args.max_retries {
        opts = opts.max_retries(n);
    }
    if let Some(d) = args.delay {
        opts = opts.delay(secs(d)?);
    }
    if let Some(b) = args.backoff {
        opts = opts.backoff_multiplier(multiplier(b)?);
    }
    if let Some(d) = args.max_duration {
        opts = opts.max_duration(secs(d)?);
    }
    if let Some(t) = args.alert_threshold {
        opts = opts.alert_threshold(t);
    }
    if let Some(d) = args.max_delay {
        opts = opts.max_delay(secs(d)?);
    }
    Ok(opts)
}

/// Returns the exit code of the last attempt (0 on success).
pub fn run_retry(cfg: &LazykitConfig, args: RunArgs) -> Result<i32> {
    let retry_cfg = cfg.retry_or_default();
    retry_cfg.apply(retry::global())?;

    let mut opts = run_options(&retry_cfg, &args)?;
    let mut parts = args.command.into_iter();
    let Some(program) = parts.next() else {
        bail!("no program given");
    };
    let spec = CommandSpec::new(program, parts.collect());

    opts = if args.quiet {
        opts.reporter(TracingReporter::new(spec.program.clone()))
    } else {
        opts.reporter(|m: &str| eprintln!("lazykit: {}", m))
    };
    let wrapper = opts.build();
    tracing::info!(program = %spec.program, policy = ?wrapper.policy(), "run");

    match wrapper.call(|| command::run_command(&spec)) {
        Ok(()) => Ok(0),
        Err(e) => {
            eprintln!("lazykit: {}: {}", spec.program, e);
            Ok(e.exit_code())
        }
    }
}
