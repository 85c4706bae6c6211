pub mod check;
pub mod commands;
pub mod comments;
pub mod config;
pub mod diagnostics;
pub mod extractor;
pub mod fs;
pub mod logging;
pub mod scan;
pub mod store;
pub mod strings_file;
pub mod sync;
pub mod table;
pub mod text;
