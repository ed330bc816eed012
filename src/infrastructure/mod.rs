//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod tabular;
pub mod traits;

pub use tabular::{parse_rows, CsvRowSource};
pub use traits::{FileSystem, RealFileSystem, RowSource};
