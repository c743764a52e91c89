pub mod completion_scheduler;
pub mod domain;
pub mod event_loop;
pub mod infrastructure;
pub mod playback_controller;
pub mod playback_engine;
pub mod render_chain;

#[cfg(test)]
pub(crate) mod test_support;
