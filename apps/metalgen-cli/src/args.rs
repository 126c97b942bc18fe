use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "metalgen",
    author,
    version,
    about = "Generate design-rule-clean synthetic metal interconnect layouts",
    long_about = None
)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate, verify and write benchmark layouts.
    Generate(GenerateArgs),
    /// Verify a layout JSON file.
    Verify(VerifyArgs),
    /// Write the reference rule deck.
    Deck(DeckArgs),
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    /// Rule deck JSON. Uses the built-in reference deck when omitted.
    #[arg(short, long)]
    pub deck: Option<PathBuf>,

    /// Benchmark to generate; repeatable. Defaults to `reference`.
    #[arg(short, long = "benchmark", conflicts_with = "all")]
    pub benchmarks: Vec<String>,

    /// Generate every benchmark in the deck.
    #[arg(long)]
    pub all: bool,

    /// Override the benchmark seed.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Directory to which output files are written.
    #[arg(short, long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Skip GDS-II output.
    #[arg(long)]
    pub no_gds: bool,

    /// Skip layout JSON output.
    #[arg(long)]
    pub no_json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct VerifyArgs {
    /// Layout JSON written by `metalgen generate`.
    pub layout: PathBuf,

    /// Verify against a deck's rules instead of the rules stored in the layout.
    #[arg(short, long)]
    pub deck: Option<PathBuf>,

    /// Deck benchmark whose rules apply. Defaults to the layout name.
    #[arg(short, long, requires = "deck")]
    pub benchmark: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DeckArgs {
    /// Output path.
    #[arg(short, long, default_value = "metalgen_deck.json")]
    pub out: PathBuf,
}
