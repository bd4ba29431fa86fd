use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use dexproxy::cache::DexCache;
use dexproxy::config::ConfigLoader;
use dexproxy::domain::{GenerationNumber, ResourceKind, ResourceRef};
use dexproxy::engine::Engine;
use dexproxy::error::DexError;
use dexproxy::output::JsonOutput;
use dexproxy::upstream::{HttpUpstream, UpstreamClient};

#[derive(Parser)]
#[command(name = "dexproxy")]
#[command(about = "Caching aggregation layer over a public creature database")]
#[command(version, author)]
struct Cli {
    /// Path to a dexproxy.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Show one entity by name or numeric id")]
    Entity(IdentifierArgs),
    #[command(about = "Show an alternate form by name (e.g. charizard-mega-x)")]
    Form(IdentifierArgs),
    #[command(about = "List every entity introduced in a generation")]
    Generation(GenerationArgs),
    #[command(about = "Search entities by name or id substring")]
    Search(SearchArgs),
    #[command(about = "Show the evolution tree containing an entity")]
    Evolution(IdentifierArgs),
    #[command(about = "Fetch one upstream resource without caching")]
    Raw(RawArgs),
    #[command(about = "Read lookups from stdin against one warm cache")]
    Shell,
}

#[derive(Args)]
struct IdentifierArgs {
    identifier: String,
}

#[derive(Args)]
struct GenerationArgs {
    number: GenerationNumber,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[derive(Args)]
struct RawArgs {
    kind: ResourceKind,
    identifier: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Entity(String),
    Form(String),
    Generation(GenerationNumber),
    Search(String),
    Evolution(String),
    Stats,
    Quit,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DexError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DexError) -> u8 {
    match error {
        error if error.is_not_found() => 2,
        DexError::UpstreamUnavailable(_)
        | DexError::UpstreamHttp(_)
        | DexError::UpstreamStatus { .. }
        | DexError::Malformed(_) => 3,
        DexError::IndexUnavailable => 4,
        _ => 1,
    }
}

async fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let upstream = HttpUpstream::new(&config.upstream)?;
    let engine = Engine::new(upstream, Arc::new(DexCache::new()), config);

    match cli.command {
        Command::Entity(args) => {
            run_shell_command(&engine, ShellCommand::Entity(args.identifier)).await
        }
        Command::Form(args) => {
            run_shell_command(&engine, ShellCommand::Form(args.identifier)).await
        }
        Command::Generation(args) => {
            run_shell_command(&engine, ShellCommand::Generation(args.number)).await
        }
        Command::Search(args) => {
            run_shell_command(&engine, ShellCommand::Search(search_query(&args.query))).await
        }
        Command::Evolution(args) => {
            run_shell_command(&engine, ShellCommand::Evolution(args.identifier)).await
        }
        Command::Raw(args) => run_raw(&engine, args).await,
        Command::Shell => run_shell(&engine).await,
    }
}

async fn run_shell_command<U: UpstreamClient>(
    engine: &Engine<U>,
    command: ShellCommand,
) -> miette::Result<()> {
    match command {
        ShellCommand::Entity(identifier) => {
            let view = engine.get_entity(&identifier).await?;
            JsonOutput::print_entity(&view).into_diagnostic()
        }
        ShellCommand::Form(name) => {
            let view = engine.get_form(&name).await?;
            JsonOutput::print_entity(&view).into_diagnostic()
        }
        ShellCommand::Generation(number) => {
            let views = engine.get_generation(number).await?;
            JsonOutput::print_entities(&views).into_diagnostic()
        }
        ShellCommand::Search(query) => {
            let views = engine.search(&query).await?;
            JsonOutput::print_entities(&views).into_diagnostic()
        }
        ShellCommand::Evolution(identifier) => {
            let tree = engine.get_evolution_tree(&identifier).await?;
            JsonOutput::print_tree(&tree).into_diagnostic()
        }
        ShellCommand::Stats => JsonOutput::print_stats(&engine.cache().stats()).into_diagnostic(),
        ShellCommand::Quit => Ok(()),
    }
}

async fn run_raw<U: UpstreamClient>(engine: &Engine<U>, args: RawArgs) -> miette::Result<()> {
    let target = raw_target(&args.identifier);
    let value = engine.upstream().fetch(args.kind, &target).await?;
    JsonOutput::print_json(&value).into_diagnostic()
}

fn raw_target(identifier: &str) -> ResourceRef {
    let trimmed = identifier.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return ResourceRef::Link(trimmed.to_string());
    }
    match trimmed.parse::<u32>() {
        Ok(id) => ResourceRef::Id(id),
        Err(_) => ResourceRef::Name(trimmed.to_lowercase()),
    }
}

async fn run_shell<U: UpstreamClient>(engine: &Engine<U>) -> miette::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_shell_command(&line) {
            Ok(command) => command,
            Err(report) => {
                eprintln!("{report:?}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(report) = run_shell_command(engine, command).await {
            eprintln!("{report:?}");
        }
    }
    Ok(())
}

fn parse_shell_command(input: &str) -> miette::Result<ShellCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(miette::Report::msg("empty command"));
    }

    let mut parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.first().is_some_and(|v| *v == "dexproxy") {
        parts.remove(0);
    }
    let Some((&command, rest)) = parts.split_first() else {
        return Err(miette::Report::msg("empty command"));
    };
    let argument = |what: &str| {
        rest.first()
            .map(|v| v.to_string())
            .ok_or_else(|| miette::Report::msg(format!("{command} requires {what}")))
    };

    match command {
        "entity" | "get" => Ok(ShellCommand::Entity(argument("an identifier")?)),
        "form" => Ok(ShellCommand::Form(argument("a form name")?)),
        "generation" | "gen" => {
            let number = argument("a generation number")?.parse::<GenerationNumber>()?;
            Ok(ShellCommand::Generation(number))
        }
        "search" | "find" => {
            if rest.is_empty() {
                return Err(miette::Report::msg("search requires a query"));
            }
            Ok(ShellCommand::Search(search_query(rest)))
        }
        "evolution" | "evo" => Ok(ShellCommand::Evolution(argument("an identifier")?)),
        "stats" => Ok(ShellCommand::Stats),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        _ if rest.is_empty() => Ok(ShellCommand::Entity(command.to_string())),
        _ => Err(miette::Report::msg(format!("unknown command: {command}"))),
    }
}

/// Upstream names separate words with `-`, so multi-word queries do too.
fn search_query<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| word.as_ref())
        .collect::<Vec<_>>()
        .join("-")
}
