use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;

use desk_tutor::{
    analysis_cycle,
    capture::StillImageSource,
    config::{TutorConfig, check_environment},
    error::classify,
    gateway::QwenGateway,
    render::LogPresenter,
    scheduler::{Runner, RunnerOptions, StopReason},
};

/// Watches a workbook page and projects hints and answer checks onto it.
#[derive(Parser, Debug)]
#[command(name = "desk-tutor")]
#[command(about = "Desk-projection tutoring aid driven by a vision-language model")]
#[command(long_about = "Watches a workbook page, tracks the student's handwriting through a \
vision-language model, and decides when to project hints or answer checks back onto the page.
Configuration comes from the environment (DASHSCOPE_API_KEY, TUTOR_*); flags override it.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a tutoring session over desk photographs
    Run(RunArgs),
    /// Report whether the environment is set up for a session
    CheckEnv,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory of desk photographs replayed in file-name order
    #[arg(long, value_name = "DIR")]
    images: PathBuf,

    /// Start over after the last photograph
    #[arg(long = "loop")]
    looping: bool,

    /// Frames each photograph is held for
    #[arg(long, default_value_t = 50)]
    hold: u32,

    /// Stop after this many rendered frames
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Display rate in frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Seconds on one problem before a hint is offered
    #[arg(long)]
    dwell_threshold: Option<f64>,

    /// Seconds between the end of one analysis and the start of the next
    #[arg(long)]
    analysis_interval: Option<f64>,

    /// Vision-language model name
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Skip the startup connectivity check
    #[arg(long)]
    skip_probe: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    desk_tutor::logging::init("info");

    match cli.command {
        Command::Run(args) => run(args),
        Command::CheckEnv => check_env(),
    }
}

fn load_config(args: &RunArgs) -> Result<TutorConfig> {
    let mut config = TutorConfig::from_env()?;
    if let Some(fps) = args.fps {
        config.render_fps = fps;
    }
    if let Some(secs) = args.dwell_threshold {
        config.dwell_threshold_secs = secs;
    }
    if let Some(secs) = args.analysis_interval {
        if !secs.is_finite() || secs < 0.0 {
            anyhow::bail!("--analysis-interval must be a non-negative number of seconds");
        }
        config.analysis_interval = Duration::from_secs_f64(secs);
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    log::info!("starting with {:?}", config);

    // The blocking HTTP client must be built and dropped outside the runtime.
    let gateway = Arc::new(QwenGateway::new(config.gateway_config())?);
    if !args.skip_probe {
        if let Err(e) = gateway.probe() {
            if classify::is_fatal(&e) {
                log::error!("model endpoint rejected the credential: {}", e);
                return Err(e.into());
            }
            log::warn!("model endpoint probe failed, continuing: {}", e);
        }
    }

    let scheduler = config.scheduler_config();
    let cycle = analysis_cycle(&config, gateway.clone());
    let source = StillImageSource::new(&args.images)
        .with_frames_per_image(args.hold)
        .looping(args.looping);
    let options = RunnerOptions {
        max_ticks: args.max_ticks,
        ..RunnerOptions::from_config(&scheduler)
    };
    let runner = Runner::new(source, LogPresenter::new(), cycle, &scheduler, options);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let outcome = runtime.block_on(async move {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("interrupt received, stopping");
                    let _ = stop_tx.send(true);
                }
                Err(e) => {
                    log::warn!("cannot listen for interrupt: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        });
        runner.run(stop_rx).await
    });

    // An in-flight analysis gets a short grace period to commit.
    runtime.shutdown_timeout(Duration::from_secs(2));
    drop(gateway);

    let (summary, presenter) = outcome?;
    match &summary.stop {
        StopReason::CaptureEnded(e) => log::info!("capture finished: {}", e),
        StopReason::Shutdown | StopReason::TickLimit => {}
    }
    println!(
        "{} frames shown, {} skipped, {} analyses started, {} completed, {} overlay fallbacks, {} projection updates",
        summary.ticks,
        summary.skipped_reads,
        summary.analyses_started,
        summary.analyses_completed,
        summary.bare_frames,
        presenter.changes()
    );
    Ok(())
}

fn check_env() -> Result<()> {
    let report = check_environment(|name| std::env::var(name).ok());
    for line in report.lines() {
        println!("{}", line);
    }
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
