pub mod blob;
pub mod command;
pub mod error;
pub mod frame_reader;
pub mod frame_writer;
pub mod input;
