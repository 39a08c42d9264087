//! Core of fluxmap: flux balance analysis of a metabolic model and generation of an
//! Escher map of the reactions carrying flux.
pub mod analysis;
pub mod configuration;
pub mod escher;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod pipeline;
pub mod viewer;
mod utils;
