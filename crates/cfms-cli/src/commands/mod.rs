pub mod access;
pub mod audit;
pub mod deadline;
pub mod dispatch;
pub mod feedback;
pub mod folder;
pub mod init;
pub mod review;
pub mod shared;
pub mod user;
