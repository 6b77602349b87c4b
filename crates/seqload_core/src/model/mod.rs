//! Domain model for one node-type batch load.
//!
//! # Responsibility
//! - Define input rows (`Record`), the submitted artifact (`SeqSetEntity`)
//!   and provenance rows (`IdTrackingRecord`).
//!
//! # Invariants
//! - Records are immutable once read.
//! - An entity is either new (no external id) or loaded (has one), never both.
//! - Tracking rows are append-only.

pub mod entity;
pub mod record;
pub mod tracking;
