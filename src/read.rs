//! Extraction facade: walks a game folder and produces the ordered entry
//! list.

use crate::{
    constants::{
        COMMON_EVENTS_FILE, DATABASE_FILES, DEFAULT_CONTEXT_SIZE,
        PLUGINS_FILE, SYSTEM_FILE, TROOPS_FILE,
    },
    database::{self, ActorInfo},
    events::{self, EventScanner},
    functions::{backup_path, read_to_string_without_bom},
    plugins,
    types::{EngineType, Entry, Error, FileFlags},
};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

static MAP_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Map\d+\.json$").expect("valid map file regex"));

/// Returns the folder containing `data/` and `js/`. Distributed MV games
/// keep content under `www/`; MZ and editor projects keep it at the root.
#[must_use]
pub fn find_content_root(game_dir: &Path) -> Option<PathBuf> {
    for base in [game_dir.to_path_buf(), game_dir.join("www")] {
        if base.join("data").is_dir() || base.join("Data").is_dir() {
            return Some(base);
        }
    }

    None
}

/// Locates the `data/` directory inside the game folder.
#[must_use]
pub fn find_data_dir(game_dir: &Path) -> Option<PathBuf> {
    let root = find_content_root(game_dir)?;

    for name in ["data", "Data"] {
        let dir = root.join(name);

        if dir.is_dir() {
            return Some(dir);
        }
    }

    None
}

/// Locates `js/plugins.js` inside the game folder.
#[must_use]
pub fn find_plugins_file(game_dir: &Path) -> Option<PathBuf> {
    let root = find_content_root(game_dir)?;
    let path = root.join("js").join(PLUGINS_FILE);

    path.is_file().then_some(path)
}

/// Detects whether a game is RPG Maker MV or MZ from its runtime scripts.
#[must_use]
pub fn detect_engine(game_dir: &Path) -> Option<EngineType> {
    let js_dir = find_content_root(game_dir)?.join("js");

    if js_dir.join("rmmz_core.js").is_file() {
        Some(EngineType::Mz)
    } else if js_dir.join("rpg_core.js").is_file() {
        Some(EngineType::Mv)
    } else {
        None
    }
}

/// Reads the raw game title from System.json regardless of language.
#[must_use]
pub fn game_title(game_dir: &Path) -> String {
    let Some(data_dir) = find_data_dir(game_dir) else {
        return String::new();
    };

    parse_json_file(&data_dir.join(SYSTEM_FILE))
        .and_then(|system| {
            system.get("gameTitle").and_then(Value::as_str).map(String::from)
        })
        .unwrap_or_default()
}

/// Loads actor metadata for gender assignment and translator context.
pub fn load_actors(game_dir: &Path) -> Result<Vec<ActorInfo>, Error> {
    let data_dir = find_data_dir(game_dir)
        .ok_or_else(|| Error::NoDataDir(game_dir.to_path_buf()))?;

    Ok(parse_json_file(&data_dir.join("Actors.json"))
        .map(|data| database::scan_actors(&data))
        .unwrap_or_default())
}

// Malformed files are skipped so one corrupt file doesn't abort the rest of
// the extraction.
fn parse_json_file(path: &Path) -> Option<Value> {
    if !path.is_file() {
        return None;
    }

    let content = match read_to_string_without_bom(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("skipping unreadable file {}: {err}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("skipping malformed file {}: {err}", path.display());
            None
        }
    }
}

/// Walks an RPG Maker MV/MZ game folder and extracts every translatable
/// entry in a stable order: database files, System, CommonEvents, Troops,
/// Maps, plugins.
pub struct ProjectReader<'a> {
    game_dir: &'a Path,
    file_flags: FileFlags,
    require_source_text: bool,
    context_size: usize,
}

impl<'a> ProjectReader<'a> {
    #[must_use]
    pub fn new(game_dir: &'a Path) -> Self {
        Self {
            game_dir,
            file_flags: FileFlags::default(),
            require_source_text: true,
            context_size: DEFAULT_CONTEXT_SIZE,
        }
    }

    #[must_use]
    pub fn file_flags(mut self, flags: FileFlags) -> Self {
        self.file_flags = flags;
        self
    }

    /// When disabled, entries are extracted regardless of language. Used to
    /// read donor games whose text is already translated.
    #[must_use]
    pub fn require_source_text(mut self, enabled: bool) -> Self {
        self.require_source_text = enabled;
        self
    }

    #[must_use]
    pub fn context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    pub fn read(self) -> Result<Vec<Entry>, Error> {
        let data_dir = find_data_dir(self.game_dir)
            .ok_or_else(|| Error::NoDataDir(self.game_dir.to_path_buf()))?;

        let mut entries = Vec::new();
        let mut seen_speakers = HashSet::new();

        if self.file_flags.contains(FileFlags::Database) {
            let mut database_files: Vec<(&str, &[&str])> = DATABASE_FILES
                .entries()
                .map(|(filename, fields)| (*filename, *fields))
                .collect();
            database_files.sort_unstable_by_key(|(filename, _)| *filename);

            for (filename, fields) in database_files {
                if let Some(data) = parse_json_file(&data_dir.join(filename)) {
                    entries.extend(database::extract_records(
                        filename,
                        &data,
                        fields,
                        self.require_source_text,
                    ));
                }
            }
        }

        if self.file_flags.contains(FileFlags::System) {
            if let Some(data) = parse_json_file(&data_dir.join(SYSTEM_FILE)) {
                entries.extend(database::extract_system(
                    &data,
                    self.require_source_text,
                ));
            }
        }

        if self.file_flags.contains(FileFlags::CommonEvents) {
            if let Some(data) =
                parse_json_file(&data_dir.join(COMMON_EVENTS_FILE))
            {
                let mut scanner = EventScanner::new(
                    COMMON_EVENTS_FILE,
                    self.require_source_text,
                    self.context_size,
                    &mut seen_speakers,
                );
                entries.extend(events::scan_common_events(&mut scanner, &data));
            }
        }

        if self.file_flags.contains(FileFlags::Troops) {
            if let Some(data) = parse_json_file(&data_dir.join(TROOPS_FILE)) {
                let mut scanner = EventScanner::new(
                    TROOPS_FILE,
                    self.require_source_text,
                    self.context_size,
                    &mut seen_speakers,
                );
                entries.extend(events::scan_troops(&mut scanner, &data));
            }
        }

        if self.file_flags.contains(FileFlags::Map) {
            for filename in self.map_filenames(&data_dir)? {
                let Some(data) = parse_json_file(&data_dir.join(&filename))
                else {
                    continue;
                };

                let mut scanner = EventScanner::new(
                    &filename,
                    self.require_source_text,
                    self.context_size,
                    &mut seen_speakers,
                );
                entries.extend(events::scan_map(&mut scanner, &data));
            }
        }

        if self.file_flags.contains(FileFlags::Plugins) {
            entries.extend(self.read_plugins());
        }

        Ok(entries)
    }

    fn map_filenames(&self, data_dir: &Path) -> Result<Vec<String>, Error> {
        let mut filenames = Vec::new();

        let dir_entries = fs::read_dir(data_dir)
            .map_err(|err| Error::Io(data_dir.to_path_buf(), err))?;

        for dir_entry in dir_entries.flatten() {
            let filename = dir_entry.file_name();
            let Some(filename) = filename.to_str() else {
                continue;
            };

            if MAP_FILE_RE.is_match(filename) {
                filenames.push(filename.to_string());
            }
        }

        filenames.sort_unstable();
        Ok(filenames)
    }

    fn read_plugins(&self) -> Vec<Entry> {
        let Some(plugins_path) = find_plugins_file(self.game_dir) else {
            return Vec::new();
        };

        // Prefer the pristine backup so re-extraction after an export still
        // sees the original text.
        let backup = backup_path(&plugins_path);
        let source = if backup.is_file() { backup } else { plugins_path };

        match plugins::load_plugins_js(&source) {
            Ok(manifest) => plugins::extract_plugins(&manifest),
            Err(err) => {
                warn!("skipping plugin manifest {}: {err}", source.display());
                Vec::new()
            }
        }
    }
}
