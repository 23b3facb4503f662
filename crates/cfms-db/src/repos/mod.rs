//! Repository modules implementing persistence for every folder entity.
//!
//! Each module adds methods to `FolderService` via `impl FolderService` blocks.

pub mod access;
pub mod audit;
pub mod deadline;
pub mod feedback;
pub mod folder;
pub mod history;
pub mod transition;
pub mod user;
