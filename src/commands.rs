//! One file per sub-command, each adding a `cmd_*` method to [`crate::App`].

pub mod finish;
pub mod pullrequest;
pub mod rotate;
pub mod start;

pub use rotate::Rotation;
