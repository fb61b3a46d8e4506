#![doc = include_str!("../README.md")]

pub mod aggregator;
pub mod clock;
pub mod executor;
pub mod pool;
pub mod runner;
pub mod vu;

#[cfg(test)]
pub(crate) mod testutil;

pub use runner::{RunReport, Runner};
pub use stampede_core::*;

pub mod prelude {
    pub use crate::executor::{Executor, HttpTransport, Transport};
    pub use crate::runner::{RunReport, Runner};
    pub use stampede_core::{
        Method, Outcome, OutcomeStatus, RequestSpec, RunConfig, RunError, RunState, RunSummary,
        TransportKind,
    };
}
