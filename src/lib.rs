//! stockscope: fetch daily stock history, derive indicators, report and chart.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the interactive session in
//! [`driver`] and the command line in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod driver;
pub mod ports;
