pub mod error;
pub mod materialize;
pub mod runner;
pub mod ssh;

pub use error::MaterializeError;
pub use materialize::{Materializer, COMMITTER_FILE, COMMIT_MESSAGE_FILE};
pub use runner::{CommandRunner, CommandSpec, SystemRunner};
pub use ssh::SshSetup;
