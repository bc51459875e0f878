use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{
    compare::CompareArgs, generate::GenerateSubcommands, solve::SolveArgs, sweep::SweepArgs,
};

mod compare;
mod file_utils;
mod generate;
mod parsers;
mod solve;
mod summary;
mod sweep;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate the orders of a problem file to its couriers
    Solve {
        #[command(flatten)]
        args: SolveArgs,
    },
    /// Re-solve a problem file over a range of courier capacities
    Sweep {
        #[command(flatten)]
        args: SweepArgs,
    },
    /// Compare the base, time-restricted and reduced-capacity scenarios
    Compare {
        #[command(flatten)]
        args: CompareArgs,
    },
    #[command(visible_alias = "g")]
    Generate {
        #[command(subcommand)]
        commands: GenerateSubcommands,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Solve { args }) => solve::run(args)?,
        Some(Commands::Sweep { args }) => sweep::run(args)?,
        Some(Commands::Compare { args }) => compare::run(args)?,
        Some(Commands::Generate { commands }) => generate::run(commands)?,
        None => {}
    }

    Ok(())
}
