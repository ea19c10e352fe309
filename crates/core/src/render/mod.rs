pub mod domain;
pub mod encoding_engine;
pub mod infrastructure;
pub mod render_job;
pub mod render_use_case;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;
