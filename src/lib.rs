//! Dishcraft: procedural dish narratives for fictional cuisines.
//!
//! Selects a rule-constrained set of ingredients and a technique, assembles
//! multi-sentence prose from reusable phrase fragments while avoiding
//! repetition, and runs a deterministic cleanup pass over the result.

pub mod core;
pub mod cuisine_templates;
pub mod schema;
