//! ID prefixes for every stored entity.
//!
//! IDs are generated by the database layer as `{prefix}-{8 hex chars}`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_FOLDER: &str = "fld";
pub const PREFIX_DEADLINE: &str = "ddl";
pub const PREFIX_ACCESS_REQUEST: &str = "acr";
pub const PREFIX_HISTORY: &str = "hst";

/// Every prefix in use. Used to reject accidental collisions in tests.
pub const ALL_PREFIXES: [&str; 5] = [
    PREFIX_USER,
    PREFIX_FOLDER,
    PREFIX_DEADLINE,
    PREFIX_ACCESS_REQUEST,
    PREFIX_HISTORY,
];
