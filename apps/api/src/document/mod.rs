pub mod handlers;
pub mod reader;
pub mod writer;
