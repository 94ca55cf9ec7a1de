#![doc = "deckforge-core: core logic library for deckforge."]

//! This crate contains the whole generation pipeline behind deckforge: outline planning,
//! per-slide copy and image prompts, illustration acquisition and PPTX assembly.
//! Transport to the hosted model services lives in [`providers`]; everything else only
//! talks to the traits in [`contract`], so tests can swap in mocks.
//!
//! # Usage
//! Build a [`pipeline::PresentationPipeline`] from a [`config::GeneratorConfig`] and the
//! service clients, then call [`pipeline::PresentationPipeline::run_pipeline`].

pub mod assemble;
pub mod config;
pub mod contract;
pub mod deck;
pub mod error;
pub mod images;
pub mod outline;
pub mod pipeline;
pub mod providers;
pub mod slide;
pub mod store;
pub mod writer;
