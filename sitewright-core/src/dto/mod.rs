//! Data Transfer Objects
//!
//! Flat wire representations used by the HTTP surface and the callback
//! delivery. Field names match what existing integrations already consume.

pub mod callback;
pub mod site;
