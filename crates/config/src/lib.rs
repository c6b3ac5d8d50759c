#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ConfigError;

mod harness;
pub use harness::{HarnessConfig, PathsConfig};

mod launch;
pub use launch::{LaunchCommand, LaunchConfig};

mod timing;
pub use timing::TimingConfig;

mod cluster;
pub use cluster::ClusterConfig;
