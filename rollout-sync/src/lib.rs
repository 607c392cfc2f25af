//! # rollout-sync
//!
//! Cluster-facing operations behind the `rollout` commands.
//!
//! Everything shells out to `kubectl` through [`exec::CommandRunner`]:
//! [`argocd`] for Application values, sync and health, [`promote`] for the
//! blue/green cutover and [`smoke`] for status checks across applications.

pub mod argocd;
pub mod diff;
pub mod error;
pub mod exec;
pub mod kubectl;
pub mod poll;
pub mod promote;
pub mod smoke;

pub use error::SyncError;
pub use exec::{CommandRunner, ExecError, SystemRunner};
pub use kubectl::Kubectl;
pub use poll::{PollPolicy, Sleeper, ThreadSleeper};
