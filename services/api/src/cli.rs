use crate::render::{render_evaluation, render_policy};
use crate::server;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use vendowise::config::AppConfig;
use vendowise::error::AppError;
use vendowise::report::OutcomeView;
use vendowise::{telemetry, Dataset, DatasetKind, PolicyStore, RiskEvaluator, RiskSummary};

#[derive(Parser, Debug)]
#[command(
    name = "vendowise",
    about = "Classify supplier and inventory risk from delivery, purchase order and stock data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Import a CSV export and classify every row
    Evaluate(EvaluateArgs),
    /// Manage the persisted risk policy
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Write the default policy if none exists yet
    Init(PolicyPathArgs),
    /// Print the active policy
    Show(PolicyPathArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// CSV export to classify
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Layout of the export: supplier, purchase-orders or inventory
    #[arg(long, default_value = "supplier")]
    pub(crate) kind: DatasetKind,
    /// Policy document to use instead of the configured one
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
    /// Emit JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PolicyPathArgs {
    /// Policy file (defaults to VENDOWISE_POLICY_PATH, then vendowise_config.json)
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Policy { command } => run_policy(command),
    }
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;

    let store = PolicyStore::new(args.policy.unwrap_or(config.policy.path));
    let evaluator = RiskEvaluator::new(store.load()?)?;

    let dataset = Dataset::from_path(args.kind, &args.input)?;
    info!(
        input = %args.input.display(),
        kind = args.kind.key(),
        rows = dataset.len(),
        "imported dataset"
    );

    let outcomes = dataset.evaluate(&evaluator)?;
    let summary = RiskSummary::from_outcomes(&outcomes);

    if args.json {
        let payload = json!({
            "kind": dataset.kind(),
            "policy": evaluator.config(),
            "outcomes": OutcomeView::from_outcomes(&outcomes),
            "summary": summary,
        });
        let body = serde_json::to_string_pretty(&payload).map_err(std::io::Error::from)?;
        println!("{body}");
    } else {
        render_evaluation(dataset.kind(), evaluator.config(), &outcomes, &summary);
    }

    Ok(())
}

fn run_policy(command: PolicyCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;

    let resolve =
        |path: Option<PathBuf>| PolicyStore::new(path.unwrap_or_else(|| config.policy.path.clone()));

    match command {
        PolicyCommand::Init(args) => {
            let store = resolve(args.path);
            let existed = store.path().exists();
            let policy = store.load_or_init()?;
            if existed {
                println!("Policy already present at {}", store.path().display());
            } else {
                println!("Wrote default policy to {}", store.path().display());
            }
            render_policy(&policy);
        }
        PolicyCommand::Show(args) => {
            let store = resolve(args.path);
            let policy = store.load()?;
            println!("Policy file: {}", store.path().display());
            render_policy(&policy);
        }
    }

    Ok(())
}
