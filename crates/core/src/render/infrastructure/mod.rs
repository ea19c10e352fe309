pub mod inline_scheduler;
pub mod worker_scheduler;
