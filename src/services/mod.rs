pub mod ai;
pub mod catalog;
pub mod conversation;
pub mod scheduling;
pub mod sessions;
