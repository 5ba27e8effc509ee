//! Workflows sitting between the HTTP handlers and [`crate::db::LibraryStore`].
//!
//! Every function takes the current instant as an argument so tests can pin time.

pub mod accounts;
pub mod admin;
pub mod borrowing;
pub mod catalog;
pub mod fines;
pub mod notifications;
pub mod returns;
pub mod student;

pub use notifications::AdminNotifications;
