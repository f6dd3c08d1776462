//! Running the probe binary.
//!
//! - [`command`]: which program runs and with what arguments
//! - [`stream`]: merging its output pipes into one line stream
//! - [`supervisor`]: owning, and eventually stopping, the child process

pub mod command;
pub mod stream;
pub mod supervisor;

pub use command::{split_args, ProbeCommand};
pub use stream::{LinePoll, LineStream};
pub use supervisor::ProbeSupervisor;
