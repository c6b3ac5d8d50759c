//! Scenario-level tests.
//!
//! These drive the full phase machine against stub external processes
//! (shell one-liners under a temp directory standing in for the ledger's
//! members, service, and client), so they exercise launch, injection,
//! driving, polling, verification, and teardown without a real consensus
//! deployment.

mod lifecycle;
