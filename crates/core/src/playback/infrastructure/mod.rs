pub mod cpal_output_device;
