pub mod audio_source;
pub mod effect_node;
pub mod effect_processor;
pub mod graph_builder;
pub mod playback_options;
pub mod render_graph;
pub mod source_reader;
pub mod source_writer;
