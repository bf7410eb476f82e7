//! Sitewright Core
//!
//! Core types shared by every Sitewright service.
//!
//! This crate contains:
//! - Domain types: build requests, job identifiers, lifecycle states, outcomes, build-log views
//! - DTOs: wire shapes for the submit acknowledgment, build-log queries, and callback payloads

pub mod domain;
pub mod dto;
