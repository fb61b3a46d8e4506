use anyhow::Context;
use clap::Parser;
use stampede::prelude::*;
use std::num::NonZeroU32;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fixed-VU HTTP load-generation harness.
#[derive(Parser, Debug)]
#[command(name = "stampede", version, about)]
struct Args {
    /// Target URL (absolute http/https).
    url: String,

    /// Number of concurrent virtual users.
    #[arg(short = 'u', long, default_value_t = 10)]
    vus: u32,

    /// Total run duration, e.g. "30s" or "5m".
    #[arg(short, long, default_value = "30s", value_parser = humantime::parse_duration)]
    duration: Duration,

    /// HTTP method for the single-step scenario.
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Request header as `name: value`; repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    body: Option<String>,

    /// Per-request timeout.
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Graceful-drain window after the deadline.
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    drain_timeout: Duration,

    /// Per-VU iteration cap (default: unlimited).
    #[arg(long)]
    iterations: Option<u64>,

    /// Pause between iterations of each VU (default: none).
    #[arg(long, value_parser = humantime::parse_duration)]
    delay: Option<Duration>,

    /// Global iteration-rate cap in iterations per second (default: none).
    #[arg(long)]
    max_tps: Option<NonZeroU32>,

    /// Emit the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header `{raw}` is not of the form `name: value`"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn build_config(args: &Args) -> anyhow::Result<RunConfig> {
    let method: Method = args.method.parse()?;
    let mut spec = RequestSpec::new(method, args.url.clone());
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        spec = spec.header(name, value);
    }
    if let Some(body) = &args.body {
        spec = spec.body(body.clone());
    }

    let mut config = RunConfig::new(vec![spec])
        .virtual_users(args.vus)
        .duration(args.duration)
        .request_timeout(args.timeout)
        .drain_timeout(args.drain_timeout);
    config.max_iterations = args.iterations;
    config.iteration_delay = args.delay;
    config.max_tps = args.max_tps;
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = build_config(&args)?;
    let runner = Runner::new(config);

    let abort = runner.abort_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, aborting run");
            abort.cancel();
        }
    });

    let report = runner.run().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        println!("{}", report.summary);
    }

    Ok(if report.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
