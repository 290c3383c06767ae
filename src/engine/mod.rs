//! Engine module: CLI plumbing, progress and path helpers around the pipeline

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use tools::{
    bytes_to_mb, destination_path, is_compress_candidate, is_compressed_output, is_jpeg_path,
    source_for_output, target_dimensions,
};
