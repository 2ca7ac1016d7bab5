//! SSH front-end for the Kappa server.
//!
//! Turns a raw TCP connection into an authorized, executed SKL statement:
//! public-key authentication against the user store, an interactive
//! line-oriented REPL on `session` channels, and a programmatic
//! statement-per-line mode behind the `kappa-client` subsystem.

pub mod codes;
pub mod error;
pub mod executor;
pub mod handler;
pub mod messages;
pub mod server;
pub mod session;
pub mod terminal;
pub mod writer;

pub use codes::StatusCode;
pub use error::SshError;
pub use executor::Executor;
pub use server::{SshServer, SshServerOptions};
pub use session::Session;
pub use terminal::{Terminal, TerminalEvent};
pub use writer::{ColorCodes, ResponseWriter, DEFAULT_COLORS};
