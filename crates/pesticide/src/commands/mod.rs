//! Administrative command implementations.

pub mod init;
pub mod user;
