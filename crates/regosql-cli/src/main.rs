//! regosql CLI
//!
//! Convert partially evaluated policy queries into a SQL WHERE fragment:
//!
//! ```text
//! regosql --config resolvers.json 'input.object.owner = "alice"' '"read" in input.object.acl.allUsers'
//! ```
//!
//! Each positional argument is one query body; queries are OR'ed together.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use regosql::{convert, to_sql, ResolverConfig, SqlBackend, SqlParserBackend, Verbatim};
use regosql_ast::parse_queries;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "regosql")]
#[command(
    author,
    version,
    about = "Convert partially evaluated policy queries into SQL WHERE predicates"
)]
struct Cli {
    /// Query bodies, one per argument (expressions separated by newlines or `;`).
    queries: Vec<String>,

    /// Resolver configuration (JSON) mapping policy references to columns.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replace expressions that reference unknown variables with `false`.
    #[arg(long)]
    unknown_vars_false: bool,

    /// How the rendered fragment is finalized.
    #[arg(long, value_enum, default_value_t = Backend::Verbatim)]
    backend: Backend,

    /// Print `{"sql": ...}` instead of the bare fragment.
    #[arg(long)]
    json: bool,

    /// Print the parsed queries as JSON and stop.
    #[arg(long)]
    emit_ast: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Emit the rendered text unchanged.
    Verbatim,
    /// Re-parse as a PostgreSQL expression and print the parsed form.
    Sqlparser,
}

impl Backend {
    fn backend(self) -> &'static dyn SqlBackend {
        match self {
            Backend::Verbatim => &Verbatim,
            Backend::Sqlparser => &SqlParserBackend,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let resolvers = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ResolverConfig::from_json_str(&text)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => ResolverConfig::default(),
    };
    let mut cfg = resolvers
        .convert_config()
        .context("failed to build resolvers")?;
    cfg.unknown_vars_false |= cli.unknown_vars_false;

    let queries = parse_queries(&cli.queries).context("failed to parse queries")?;
    tracing::info!(queries = queries.len(), "parsed queries");
    if cli.emit_ast {
        println!("{}", serde_json::to_string_pretty(&queries)?);
        return Ok(());
    }

    let node = convert(&cfg, &queries).context("failed to convert queries")?;
    let sql = to_sql(&node, cli.backend.backend()).context("failed to render SQL")?;
    if cli.json {
        println!("{}", serde_json::json!({ "sql": sql }));
    } else {
        println!("{sql}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
