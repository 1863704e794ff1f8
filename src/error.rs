//! Centralized error type for the deckwire umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates naturally across crate
//! boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("mapping: {0}")]
    Mapping(#[from] deckwire_mapping::Error),

    #[error("transport: {0}")]
    Transport(#[from] deckwire_io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
