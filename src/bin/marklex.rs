use clap::{Parser, ValueEnum};
use marklex::{
    compile, table::ConfigTable, Error, LexerConfig, MarkerLexer, ScanOutcome, UnclosedPolicy,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// One `key<TAB>value` line per token
    #[default]
    Text,
    /// One JSON object per token
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pattern table (`.json` for JSON, anything else is read as CSV)
    #[arg(short, long)]
    patterns: PathBuf,

    /// Document to scan
    #[arg(short, long)]
    input: PathBuf,

    /// Lexer config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail when the input ends inside an open object or attribute
    #[arg(long)]
    strict: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => LexerConfig::from_file(path)?,
        None => LexerConfig::default(),
    };
    if cli.strict {
        config = config.with_unclosed(UnclosedPolicy::Strict);
    }
    debug!("config: {:?}", config);

    let table = ConfigTable::load(&cli.patterns)?;
    let patterns = compile(&table)?;
    info!(process = patterns.process_item(), "patterns compiled.");

    let document = std::fs::read_to_string(&cli.input)
        .map_err(|e| Error::internal(format!("Failed to read input file: {}", e)))?;

    let lexer = MarkerLexer::with_config(patterns, config);
    let mut stream = lexer.spawn(document);
    debug!(id = %stream.id(), "scan started");

    while let Some(token) = stream.recv().await {
        let token = token?;
        match cli.format {
            OutputFormat::Text => println!("{}", token),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(&token)
                    .map_err(|e| Error::internal(format!("Failed to encode token: {}", e)))?
            ),
        }
    }

    match stream.join().await? {
        ScanOutcome::Completed { emitted } => info!(emitted, "scan completed."),
        ScanOutcome::ConsumerDropped { emitted } => info!(emitted, "scan stopped early."),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
