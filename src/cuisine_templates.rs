//! Bundled cuisines and the shared phrase bank.
//!
//! The RON sources are compiled into the crate so callers can generate dishes
//! without shipping data files. Each accessor parses on every call; hold on to
//! the result.

use crate::core::fragment::{FragmentBank, FragmentError};
use crate::schema::cuisine::{Cuisine, CuisineError};
use thiserror::Error;

const EMBER_COAST: &str = include_str!("../cuisine_data/ember_coast/cuisine.ron");
const FROSTVALE: &str = include_str!("../cuisine_data/frostvale/cuisine.ron");
const PHRASES: &str = include_str!("../cuisine_data/phrases.ron");
const FROSTVALE_PHRASES: &str = include_str!("../cuisine_data/frostvale/phrases.ron");

/// Volcanic shoreline cuisine: stew, grill, soup, sweet and feast.
pub fn ember_coast() -> Result<Cuisine, CuisineError> {
    Cuisine::parse_ron(EMBER_COAST)
}

/// Highland winter cuisine: stew, roast, soup, sweet and feast.
pub fn frostvale() -> Result<Cuisine, CuisineError> {
    Cuisine::parse_ron(FROSTVALE)
}

/// The shared phrase bank. Covers every category the assembler needs.
pub fn phrases() -> Result<FragmentBank, FragmentError> {
    FragmentBank::parse_ron(PHRASES)
}

/// The shared bank with Frostvale's regional categories merged over it.
pub fn frostvale_phrases() -> Result<FragmentBank, FragmentError> {
    let mut bank = phrases()?;
    bank.merge(FragmentBank::parse_ron(FROSTVALE_PHRASES)?);
    Ok(bank)
}

/// Every bundled cuisine paired with its phrase bank.
pub fn all() -> Result<Vec<(Cuisine, FragmentBank)>, TemplateError> {
    Ok(vec![
        (ember_coast()?, phrases()?),
        (frostvale()?, frostvale_phrases()?),
    ])
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Cuisine(#[from] CuisineError),
    #[error(transparent)]
    Fragment(#[from] FragmentError),
}
