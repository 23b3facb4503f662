//! JSONL decision trail.
//!
//! Per-folder JSONL files live in `.cfms/trail/`. The trail is append-only
//! and keeps every decision a re-review later overwrites on the folder row.

pub mod writer;
