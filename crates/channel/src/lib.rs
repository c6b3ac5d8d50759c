#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ChannelError;

mod script;
pub use script::{InteractionScript, InteractionStep};

mod direct;
pub use direct::DirectStream;

mod simulated;
pub use simulated::{FocusTarget, InputAutomation, SimulatedInput};

mod channel;
pub use channel::InteractionChannel;
