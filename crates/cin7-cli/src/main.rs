mod cmd;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    add::AddArgs, analyze::AnalyzeArgs, build::BuildArgs, create::CreateArgs, dev::DevArgs,
    generate::GenerateArgs, migrate::MigrateSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cin7",
    about = "Scaffold, build and analyze multi-layer cin7 front-end projects",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(long, short = 'C', global = true, env = "CIN7_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new cin7 project
    Create(CreateArgs),

    /// Add cin7 packages to the current project
    Add(AddArgs),

    /// Start the development server
    Dev(DevArgs),

    /// Build for production
    Build(BuildArgs),

    /// Run a Lighthouse audit and interpret the results
    Analyze(AnalyzeArgs),

    /// Migration tools for moving an existing app onto cin7 layers
    Migrate {
        #[command(subcommand)]
        subcommand: MigrateSubcommand,
    },

    /// Generate components, repositories, use cases and migration wrappers
    #[command(alias = "g")]
    Generate(GenerateArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Dev(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Create(args) => cmd::create::run(&root, args, cli.json),
        Commands::Add(args) => cmd::add::run(&root, args, cli.json),
        Commands::Dev(args) => cmd::dev::run(&root, args),
        Commands::Build(args) => cmd::build::run(&root, args, cli.json),
        Commands::Analyze(args) => cmd::analyze::run(&root, args, cli.json),
        Commands::Migrate { subcommand } => cmd::migrate::run(&root, subcommand, cli.json),
        Commands::Generate(args) => cmd::generate::run(&root, args, cli.json),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
