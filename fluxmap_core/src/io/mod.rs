//! Module for reading and writing Models
pub mod json;
pub mod sbml;
