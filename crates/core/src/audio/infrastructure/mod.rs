pub mod echo_processor;
pub mod ffmpeg_source_reader;
pub mod ffmpeg_wav_writer;
pub mod passthrough_processor;
pub mod processor_factory;
pub mod rate_pitch_processor;
pub mod reverb_processor;
