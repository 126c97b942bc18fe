use std::ops::Deref;

use metalgen_core::{DesignRules, Generator, Layout, RuleError, RuleSpec};
use serde::Serialize;
use thiserror::Error;

use crate::verifier::Verifier;
use crate::violation::Violation;

#[derive(Error, Debug)]
pub enum SignoffError {
    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("Generated layout violates {} design rule(s); first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    DesignRuleViolation(Vec<Violation>),
}

/// A layout that passed verification. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedLayout(Layout);

impl Deref for VerifiedLayout {
    type Target = Layout;

    fn deref(&self) -> &Layout {
        &self.0
    }
}

/// Verify `layout` and wrap it if clean.
pub fn signoff(layout: Layout) -> Result<VerifiedLayout, SignoffError> {
    match Verifier::new(layout.rules()).verify(&layout) {
        crate::Verdict::Valid => Ok(VerifiedLayout(layout)),
        crate::Verdict::Invalid(violations) => {
            log::error!(
                "{}: sign-off failed with {} violations",
                layout.name,
                violations.len()
            );
            Err(SignoffError::DesignRuleViolation(violations))
        }
    }
}

/// Generate a layout and refuse to return it unless it verifies clean.
pub fn generate_verified(
    rules: &DesignRules,
    seed: u64,
    name: &str,
) -> Result<VerifiedLayout, SignoffError> {
    signoff(Generator::new(rules, seed).with_name(name).run())
}

/// Validate a raw rule record, then generate and sign off.
pub fn generate_from_spec(
    spec: RuleSpec,
    seed: u64,
    name: &str,
) -> Result<VerifiedLayout, SignoffError> {
    let rules = DesignRules::new(spec)?;
    generate_verified(&rules, seed, name)
}
