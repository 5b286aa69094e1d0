// Adapters - clip table reader and media engine implementations

pub mod csv_rows;
pub mod exec_libav;

pub use csv_rows::ClipRowSource;
pub use exec_libav::{LibavMediaPort, LibavSource};
