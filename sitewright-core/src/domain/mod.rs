//! Core domain types
//!
//! These types describe one site build from the moment it is requested until
//! its outcome has been delivered. They are shared by the runner (which
//! produces them) and the server/client/CLI (which move them over HTTP).

pub mod build_log;
pub mod job;
pub mod outcome;
pub mod request;
