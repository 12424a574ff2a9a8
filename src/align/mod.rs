//! Retiming of reviewed subtitles onto independently rendered narration clips.

mod allocator;
pub mod cli;
pub mod commands;
pub mod config;
mod cps;
mod error;
mod matcher;
mod model;
mod narration;
mod pipeline;
mod probe;
mod report;
mod similarity;
mod srt;
mod text;
mod timecode;
mod timeline;

pub use cli::AlignCommands;
pub use commands::handle_align_command;
