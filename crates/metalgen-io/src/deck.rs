use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use metalgen_core::{DesignRules, RuleError, RuleSpec};

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed rule deck: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Benchmark '{0}' is not defined in the deck")]
    UnknownBenchmark(String),

    #[error("Benchmark '{benchmark}' overrides produce invalid rules: {source}")]
    InvalidOverride {
        benchmark: String,
        #[source]
        source: RuleError,
    },
}

/// One named generation run: a seed plus optional overrides of the deck rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub name: String,
    /// Falls back to the deck seed.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub total_x: Option<f64>,
    #[serde(default)]
    pub total_y: Option<f64>,
}

impl Benchmark {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seed: None,
            density: None,
            total_x: None,
            total_y: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    pub fn with_size(mut self, total_x: f64, total_y: f64) -> Self {
        self.total_x = Some(total_x);
        self.total_y = Some(total_y);
        self
    }
}

/// A rule deck: base design rules and the benchmarks generated from them.
///
/// The base rules are validated when the deck is deserialized; each
/// benchmark's overrides are validated again by [`RuleDeck::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDeck {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seed: u64,
    pub rules: DesignRules,
    #[serde(default)]
    pub benchmarks: Vec<Benchmark>,
}

impl RuleDeck {
    pub fn new(name: &str, rules: DesignRules) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            seed: 0,
            rules,
            benchmarks: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let json = fs::read_to_string(path)?;
        let deck = Self::from_json(&json)?;
        log::info!(
            "Loaded rule deck '{}' with {} benchmarks from {}",
            deck.name,
            deck.benchmarks.len(),
            path.display()
        );
        Ok(deck)
    }

    pub fn save(&self, path: &Path) -> Result<(), DeckError> {
        fs::write(path, self.to_json()?)?;
        log::info!("Wrote rule deck '{}' to {}", self.name, path.display());
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, DeckError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DeckError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn benchmark(&self, name: &str) -> Result<&Benchmark, DeckError> {
        self.benchmarks
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| DeckError::UnknownBenchmark(name.to_string()))
    }

    /// Apply a benchmark's overrides to the base rules and revalidate.
    pub fn resolve(&self, benchmark: &Benchmark) -> Result<(DesignRules, u64), DeckError> {
        let mut spec: RuleSpec = self.rules.spec().clone();
        if let Some(density) = benchmark.density {
            spec.density = density;
        }
        if let Some(total_x) = benchmark.total_x {
            spec.total_x = total_x;
        }
        if let Some(total_y) = benchmark.total_y {
            spec.total_y = total_y;
        }
        let rules = DesignRules::new(spec).map_err(|source| DeckError::InvalidOverride {
            benchmark: benchmark.name.clone(),
            source,
        })?;
        Ok((rules, benchmark.seed.unwrap_or(self.seed)))
    }

    /// The two-metal reference rules with a density sweep of fifteen
    /// benchmarks plus the reference run.
    pub fn reference() -> Result<Self, DeckError> {
        let rules = DesignRules::new(RuleSpec::reference()).map_err(|source| {
            DeckError::InvalidOverride {
                benchmark: "reference".to_string(),
                source,
            }
        })?;
        let mut deck = RuleDeck::new("reference", rules);
        deck.description =
            "M1 horizontal rails, M2 vertical random walk, V1 density sweep".to_string();
        deck.benchmarks = (1..=15)
            .map(|i: u64| {
                Benchmark::new(&format!("sweep_{i:02}"))
                    .with_seed(i)
                    .with_density((i * 5) as f64 / 100.0)
            })
            .chain(std::iter::once(
                Benchmark::new("reference").with_seed(0).with_density(0.5),
            ))
            .collect();
        Ok(deck)
    }
}
