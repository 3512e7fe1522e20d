pub mod reader;
pub mod writer;

pub use reader::{DelimitedReader, InputOptions, RecordReader};
pub use writer::{write_summary_json, FileReportSink, MemorySink};
