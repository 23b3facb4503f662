mod access;
mod audit;
mod deadline;
mod feedback;
mod folder;
mod review;
mod user;

pub use access::AccessCommands;
pub use audit::AuditCommands;
pub use deadline::DeadlineCommands;
pub use feedback::FeedbackCommands;
pub use folder::FolderCommands;
pub use review::ReviewCommands;
pub use user::UserCommands;
