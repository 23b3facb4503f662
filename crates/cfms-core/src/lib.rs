//! # cfms-core
//!
//! Core types and workflow rules for the course folder approval pipeline.
//!
//! This crate is pure: no I/O, no clock reads. Every rule takes the current
//! time and the stored state as arguments so the persistence layer can
//! re-evaluate it at the start of each request.
//!
//! - Status, role, decision and deadline enums
//! - Entity structs (folders, users, deadlines, audit assignments, access requests)
//! - The folder status machine and its side effects
//! - The edit permission resolver and viewer contexts
//! - The deadline gate for the second edit window
//! - The role/capability access matrix and landing routes
//! - Per-section feedback threads and the rejection banner
//! - Audit report aggregation
//! - Cross-cutting error types, ID prefixes, and the trail envelope

pub mod access;
pub mod audit;
pub mod deadline;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod feedback;
pub mod grants;
pub mod ids;
pub mod lifecycle;
pub mod permissions;
pub mod responses;
pub mod trail;
