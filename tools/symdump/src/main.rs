mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    decls::DeclsArgs, lines::LinesArgs, symbols::SymbolsArgs, tags::TagsArgs, types::TypesArgs,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "symdump", about = "Dump PlayStation 1 MND/SYM debug symbols")]
struct Cli {
    /// Narrate progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw record listing
    Tags(TagsArgs),
    /// Print struct, union, enum and typedef definitions
    Types(TypesArgs),
    /// Print global variable and function declarations
    Decls(DeclsArgs),
    /// Print the address/name symbol list
    Symbols(SymbolsArgs),
    /// Print the address to source line table
    Lines(LinesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Tags(args) => args.run(cli.verbose),
        Commands::Types(args) => args.run(cli.verbose),
        Commands::Decls(args) => args.run(cli.verbose),
        Commands::Symbols(args) => args.run(cli.verbose),
        Commands::Lines(args) => args.run(cli.verbose),
    }
}
