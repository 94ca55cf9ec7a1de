//! deckforge: command line front end for the `deckforge-core` generation pipeline.
//!
//! Argument parsing, YAML configuration, secrets from the environment and result
//! printing live here; everything that generates a deck lives in `deckforge-core`.

pub mod cli;
pub mod load_config;
pub mod status;
