//! Process runner abstraction for the buildpack and git boundaries
//!
//! Every external program the stager launches goes through [`ProcessRunner`], so
//! staging logic can be exercised against [`MockProcessRunner`] without spawning
//! real subprocesses.

mod mock;
mod runner;

pub use mock::MockProcessRunner;
pub use runner::{Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
