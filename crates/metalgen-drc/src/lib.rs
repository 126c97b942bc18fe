//! # Metalgen DRC
//!
//! Independent design-rule verification of generated layouts, and the
//! sign-off gate that only hands out layouts with a clean verdict.

pub mod violation;
pub mod verifier;
pub mod signoff;

pub use signoff::{generate_from_spec, generate_verified, signoff, SignoffError, VerifiedLayout};
pub use verifier::{verify, Verifier};
pub use violation::{EntityRef, Rule, Verdict, Violation};
