#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::SupervisorError;

mod process;
pub use process::{CapturedOutput, ManagedProcess, ProcessState};

mod supervisor;
pub use supervisor::{ProcessSupervisor, SpawnOptions};
