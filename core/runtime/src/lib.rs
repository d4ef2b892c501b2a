#![warn(clippy::pedantic)]
//! Runtime support for translated sequences.
//!
//! - [`context::TaskContext`] - per-task last error and iteration counter
//! - [`primitives`] - the primitive library and `generate_error`
//! - [`executor::Executor`] - an in-process reference evaluator
//!
//! ```ignore
//! use rtseq_runtime::Executor;
//!
//! let mut executor = Executor::new(&sequence);
//! executor.set_channel("Aliases/DesiredRPM", 1500.0);
//! let result = executor.run(&[])?;
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod ops;
pub mod primitives;

pub use context::TaskContext;
pub use error::{RuntimeError, SequenceError};
pub use executor::{Executor, ExecutorConfig};
pub use primitives::SequenceClock;
