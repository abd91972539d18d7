pub mod output_paths;
pub mod table_reader;
pub mod table_writer;

pub use output_paths::*;
pub use table_reader::*;
pub use table_writer::*;
