use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use workbatch::{
    parse_poll_interval, BatchError, BatchRunner, LocalPool, QueueConfig, ScheduleAlg,
    WaitOptions, WorkerMode,
};

#[derive(Parser, Debug)]
#[command(name = "workbatch")]
#[command(version)]
#[command(about = "Submit batches of jobfiles to a dispatch pool and retry failures")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Submit jobfiles and wait for the batch to finish
    Run(RunArgs),

    /// Wrap a command into an executable jobfile
    Wrap(WrapArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Jobfiles to submit (each must be independently executable)
    #[arg(required = true)]
    jobfiles: Vec<PathBuf>,

    /// Port the dispatch master listens on
    #[arg(long, default_value = "9123")]
    port: u16,

    /// Pool identity advertised to the catalog
    #[arg(long, default_value = "workbatch")]
    name: String,

    /// Do not register the pool with the discovery service
    #[arg(long)]
    no_catalog: bool,

    /// Reserve attached workers exclusively for this pool
    #[arg(long)]
    exclusive: bool,

    /// Task placement algorithm
    #[arg(long, value_enum, default_value = "fcfs")]
    wq_alg: AlgArg,

    /// Worker sharing mode
    #[arg(long, value_enum, default_value = "shared")]
    worker_mode: ModeArg,

    /// Number of in-process workers
    #[arg(long, default_value = "4")]
    workers: usize,

    /// How long each poll blocks waiting for a completion
    /// (integer + one of s, m, h, d, w)
    #[arg(long, default_value = "1m")]
    poll_interval: String,

    /// Retry budget shared across the batch (default: unbounded)
    #[arg(long)]
    max_tries: Option<u32>,

    /// Verbosity directive applied before the pool is constructed
    /// ("all", or any tracing filter expression)
    #[arg(long, default_value = "all")]
    debug: String,

    /// Report format
    #[arg(long, short = 'o', value_enum, default_value = "table")]
    output: OutputFormat,
}

#[derive(Parser, Debug)]
struct WrapArgs {
    /// Command to embed between the preamble and the DONE/FAILURE trailer
    command: String,

    /// Write the jobfile here (executable); prints to stdout when omitted
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum AlgArg {
    Fcfs,
    Locality,
}

impl From<AlgArg> for ScheduleAlg {
    fn from(value: AlgArg) -> Self {
        match value {
            AlgArg::Fcfs => ScheduleAlg::Fcfs,
            AlgArg::Locality => ScheduleAlg::Locality,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum ModeArg {
    Shared,
    Exclusive,
}

impl From<ModeArg> for WorkerMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Shared => WorkerMode::Shared,
            ModeArg::Exclusive => WorkerMode::Exclusive,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Map the debug setting to a subscriber filter. "all" is the historical
/// alias for full crate debug output; anything else is taken as a tracing
/// filter expression.
fn init_tracing(debug: &str) {
    let filter = match debug {
        "all" => EnvFilter::new("info,workbatch=debug"),
        other => EnvFilter::try_new(other).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_batch(args: RunArgs) -> Result<ExitCode, BatchError> {
    init_tracing(&args.debug);

    let poll_interval = parse_poll_interval(&args.poll_interval)?;

    let config = QueueConfig {
        port: args.port,
        name: args.name,
        catalog: !args.no_catalog,
        exclusive: args.exclusive,
        algorithm: args.wq_alg.into(),
        worker_mode: args.worker_mode.into(),
        workers: args.workers,
        debug: args.debug,
    };

    let pool = LocalPool::new(config).await?;
    let mut runner = BatchRunner::new(pool);

    runner.submit_jobs(&args.jobfiles);

    let opts = WaitOptions {
        poll_interval,
        max_tries: args.max_tries,
    };
    let report = runner.wait(&opts).await;

    match args.output {
        OutputFormat::Table => {
            println!("success: {}", report.success);
            println!("retries: {}", report.retries);
            if report.failed.is_empty() {
                println!("failed:  (none)");
            } else {
                println!("failed:  {}", report.failed.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn wrap(args: WrapArgs) -> Result<ExitCode, BatchError> {
    match args.output_file {
        Some(path) => workbatch::script::write_jobfile(path, &args.command)?,
        None => print!("{}", workbatch::script::wrap_command(&args.command)),
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run(run_args) => run_batch(run_args).await,
        Commands::Wrap(wrap_args) => wrap(wrap_args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
