//! ledctl — keyboard indicator LED control through the Linux console or X11.

pub mod backend;
pub mod command;
pub mod engine;
pub mod error;
pub mod source;
pub mod state;

pub use error::LedctlError;
