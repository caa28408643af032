//! Extraction, reinjection, and reflow engine for RPG Maker MV/MZ machine
//! translation. Locates translatable text in game data files, assigns
//! stable ids, shields control codes from the translation step, and writes
//! translations back into the same structural positions.

mod functions;
pub use functions::{
    backup_dir_once, backup_file_once, backup_path, contains_display_script,
    contains_source_text, read_to_string_without_bom, write_atomic,
};

pub mod batch;
pub mod constants;
pub mod database;
pub mod events;
pub mod memory;
pub mod plugins;
pub mod project;
pub mod protect;
pub mod read;
pub mod reflow;
pub mod types;
pub mod write;
