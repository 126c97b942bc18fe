use clap::Parser;

mod args;
mod commands;

use args::{Args, Command};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &args.command {
        Command::Generate(generate) => commands::generate(generate),
        Command::Verify(verify) => commands::verify(verify),
        Command::Deck(deck) => commands::deck(deck),
    }
}
