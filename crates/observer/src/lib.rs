#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ObserverError;

mod block;
pub use block::{AccountState, ObservedBlock, Transaction};

mod store;
pub use store::BlockStore;

mod poll;
pub use poll::{never_cancel, poll_until, PollOptions};

mod verify;
pub use verify::{
    verify_append_only, verify_balances, verify_conservation, verify_distribution,
    verify_min_blocks, verify_no_new_blocks, BlockHistory, Mismatch, VerificationResult,
};
