use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use command_grammar::{DispatchOutcome, Engine, EngineConfig, load_tree};
use command_grammar_core::{ExecutionContext, Handler, SimpleSource};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grammar")]
#[command(about = "Check, dispatch and complete commands from a grammar file")]
struct Cli {
    /// Command tree file (YAML or JSON)
    #[arg(long, global = true, default_value = "commands.yaml")]
    tree: PathBuf,

    /// Engine configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Run as a source holding only these permissions (console otherwise)
    #[arg(long = "permission", global = true)]
    permissions: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register every command in the tree and report failures
    Check,
    /// Print the usage lines of a command
    Usages(UsagesArgs),
    /// Match tokens against a command and run the selected usage
    Dispatch(DispatchArgs),
    /// List completions for the last token
    Suggest(SuggestArgs),
}

#[derive(Debug, Args)]
struct UsagesArgs {
    /// Command name or alias
    command: String,
}

#[derive(Debug, Args)]
struct DispatchArgs {
    /// Command name or alias
    command: String,

    /// Tokens following the command name
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    /// Emit a JSON array instead of one candidate per line
    #[arg(long)]
    json: bool,

    /// Command name or alias
    command: String,

    /// Tokens following the command name; the last one is completed
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

/// One executed usage, as printed by the dispatch handler.
#[derive(Debug, Serialize)]
struct Executed<'a> {
    path: &'a [String],
    usage: String,
    arguments: &'a command_grammar_core::Arguments,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Command::Check => run_check(&cli),
        Command::Usages(args) => run_usages(&cli, args),
        Command::Dispatch(args) => run_dispatch(&cli, args),
        Command::Suggest(args) => run_suggest(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn printing_handler() -> Handler {
    Arc::new(|ctx: &ExecutionContext<'_>| -> anyhow::Result<()> {
        let executed = Executed {
            path: ctx.path,
            usage: ctx.usage.syntax(),
            arguments: ctx.arguments,
        };
        println!("{}", serde_json::to_string(&executed)?);
        Ok(())
    })
}

/// Builds an engine from the tree file, failing on any rejected command.
fn load_engine(cli: &Cli) -> anyhow::Result<Engine> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let tree = load_tree(&cli.tree)
        .with_context(|| format!("failed to load tree {}", cli.tree.display()))?;

    let mut engine = Engine::with_config(config);
    let handler = printing_handler();
    let failures = engine.register_tree(&tree, Some(&handler));
    if let Some(first) = failures.first() {
        for err in &failures {
            eprintln!("  {err}");
        }
        bail!("{} command(s) rejected, first: {first}", failures.len());
    }
    tracing::debug!(
        tree = %cli.tree.display(),
        commands = engine.commands().count(),
        "engine ready"
    );
    Ok(engine)
}

fn source(cli: &Cli) -> SimpleSource {
    if cli.permissions.is_empty() {
        return SimpleSource::console();
    }
    cli.permissions
        .iter()
        .fold(SimpleSource::new("cli"), |source, p| source.with_permission(p.clone()))
}

fn run_check(cli: &Cli) -> anyhow::Result<()> {
    let engine = load_engine(cli)?;
    let mut count = 0usize;
    for command in engine.commands() {
        count += 1;
        match &command.description {
            Some(description) => println!("{}\t{description}", command.name),
            None => println!("{}", command.name),
        }
    }
    eprintln!("{count} command(s) registered");
    Ok(())
}

fn run_usages(cli: &Cli, args: &UsagesArgs) -> anyhow::Result<()> {
    let engine = load_engine(cli)?;
    let lines = engine.usages(&args.command);
    if lines.is_empty() {
        bail!("unknown command '{}'", args.command);
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn run_dispatch(cli: &Cli, args: &DispatchArgs) -> anyhow::Result<()> {
    let engine = load_engine(cli)?;
    match engine.dispatch(&source(cli), &args.command, &args.tokens)? {
        DispatchOutcome::Complete(_) => Ok(()),
        DispatchOutcome::Incomplete(invocation) => {
            eprintln!(
                "incomplete: ran default usage of '{}'",
                invocation.path().join(" ")
            );
            Ok(())
        }
        DispatchOutcome::Failure(failure) => {
            eprintln!("usage:");
            for line in &failure.usages {
                eprintln!("  {line}");
            }
            match failure.last_matched {
                Some(name) => bail!("invalid arguments for '{}' after <{name}>", failure.command),
                None => bail!("invalid arguments for '{}'", failure.command),
            }
        }
    }
}

fn run_suggest(cli: &Cli, args: &SuggestArgs) -> anyhow::Result<()> {
    let engine = load_engine(cli)?;
    let suggestions = engine.suggest(&source(cli), &args.command, &args.tokens);
    if args.json {
        println!("{}", serde_json::to_string(&suggestions)?);
    } else {
        for candidate in suggestions {
            println!("{candidate}");
        }
    }
    Ok(())
}
