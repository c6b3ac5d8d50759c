#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ScenarioError;

mod spec;
pub use spec::{ExpectedOutcome, ScenarioSpec, DEFAULT_TOLERANCE};

mod verdict;
pub use verdict::{Phase, ScenarioReport, Verdict};

mod runner;
pub use runner::{Scenario, SERVICE_NAME};

pub mod library;

#[cfg(test)]
mod tests;
