use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use metalgen_core::Layout;
use metalgen_drc::{generate_verified, Verdict, Verifier};
use metalgen_io::{read_layout_json, write_gds, write_layout_json, RuleDeck};

use crate::args::{DeckArgs, GenerateArgs, VerifyArgs};

fn load_deck(path: Option<&Path>) -> Result<RuleDeck> {
    match path {
        Some(path) => RuleDeck::load(path)
            .with_context(|| format!("failed to load rule deck {}", path.display())),
        None => Ok(RuleDeck::reference()?),
    }
}

fn log_stats(layout: &Layout) {
    let stats = layout.stats();
    for layer in &stats.layers {
        log::info!(
            "{}: {} {:?}: {} tracks ({} empty), {} segments, fill density {:.4}",
            layout.name,
            layer.name,
            layer.fill,
            layer.tracks,
            layer.empty_tracks,
            layer.segments,
            layer.fill_density
        );
    }
    if stats.candidates == 0 {
        log::warn!("{}: no admissible via candidates", layout.name);
    } else {
        log::info!(
            "{}: {} vias from {} candidates (realized density {:.4}, target {})",
            layout.name,
            stats.vias,
            stats.candidates,
            stats.realized_density,
            layout.rules().density
        );
    }
}

pub fn generate(args: &GenerateArgs) -> Result<()> {
    let deck = load_deck(args.deck.as_deref())?;
    let names: Vec<String> = if args.all {
        deck.benchmarks.iter().map(|b| b.name.clone()).collect()
    } else if args.benchmarks.is_empty() {
        vec!["reference".to_string()]
    } else {
        args.benchmarks.clone()
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    for name in &names {
        let benchmark = deck.benchmark(name)?;
        let (rules, seed) = deck.resolve(benchmark)?;
        let seed = args.seed.unwrap_or(seed);

        let layout = generate_verified(&rules, seed, name)
            .with_context(|| format!("benchmark {name} failed sign-off"))?;
        log_stats(&layout);

        if !args.no_gds {
            let path = args.out_dir.join(format!("{name}.gds"));
            write_gds(&layout, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("{name}: wrote {}", path.display());
        }
        if !args.no_json {
            let path = args.out_dir.join(format!("{name}.json"));
            write_layout_json(&layout, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("{name}: wrote {}", path.display());
        }
    }
    Ok(())
}

pub fn verify(args: &VerifyArgs) -> Result<()> {
    let layout = read_layout_json(&args.layout)
        .with_context(|| format!("failed to read layout {}", args.layout.display()))?;

    let rules = match &args.deck {
        Some(path) => {
            let deck = load_deck(Some(path))?;
            let name = args.benchmark.as_deref().unwrap_or(&layout.name);
            deck.resolve(deck.benchmark(name)?)?.0
        }
        None => layout.rules().clone(),
    };

    match Verifier::new(&rules).verify(&layout) {
        Verdict::Valid => {
            println!("{}: clean", layout.name);
            Ok(())
        }
        Verdict::Invalid(violations) => {
            for violation in &violations {
                println!("{violation}");
            }
            bail!("{}: {} design rule violations", layout.name, violations.len())
        }
    }
}

pub fn deck(args: &DeckArgs) -> Result<()> {
    RuleDeck::reference()?
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))
}
