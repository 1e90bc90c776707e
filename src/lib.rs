//! `catenary-fit` library crate.
//!
//! The binary (`catenary`) is a thin wrapper around this library so that:
//!
//! - the solver and uncertainty code are testable without spawning processes
//! - every command shares one pipeline (`app::pipeline`)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod solve;
pub mod tui;
