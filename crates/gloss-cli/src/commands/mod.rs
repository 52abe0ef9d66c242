pub mod audit;
pub mod dispatch;
pub mod entry;
pub mod import;
pub mod refs;
pub mod shared;
pub mod submission;
pub mod tag;
