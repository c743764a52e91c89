pub mod cpal_recorder;
