//! Torchio: compile orchestration for typeset documents.
//!
//! The crate is layered the same way the binary is wired: `domain` holds the
//! identifier and outcome types, `application` owns admission control,
//! outcome classification and the engine seam, and `infra` provides the HTTP
//! surface, telemetry, and the concrete engine adapter.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
