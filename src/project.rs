//! Project state: the ordered entry collection, glossary, and gender-hint
//! table, with atomic persistence and the distributable patch package.

use crate::{
    constants::{PATCH_DATA_FILE, PATCH_METADATA_FILE, PATCH_README_FILE},
    functions::{io_error, write_atomic},
    types::{Entry, Error, Gender},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};
use zip::{write::SimpleFileOptions, ZipArchive, ZipWriter};

/// An ordered collection of entries plus the translation aids threaded to
/// the translator. Created by extraction or by loading a saved state;
/// persisted atomically so an interrupted save never corrupts the resume
/// file.
#[derive(Debug, Default, Clone)]
pub struct Project {
    pub game_path: PathBuf,
    pub entries: Vec<Entry>,
    /// Term → forced translation.
    pub glossary: IndexMap<String, String>,
    /// Actor id → pronoun gender.
    pub actor_genders: IndexMap<u32, Gender>,
}

#[derive(Serialize)]
struct SaveState<'a> {
    project_path: &'a Path,
    entries: &'a [Entry],
    glossary: &'a IndexMap<String, String>,
    actor_genders: &'a IndexMap<u32, Gender>,
}

#[derive(Deserialize)]
struct LoadState {
    #[serde(default)]
    project_path: PathBuf,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    glossary: IndexMap<String, String>,
    // JSON forces string keys on disk; coerced back to integers on load.
    #[serde(default)]
    actor_genders: IndexMap<String, Gender>,
}

impl LoadState {
    fn into_project(self) -> Project {
        Project {
            game_path: self.project_path,
            entries: self.entries,
            glossary: self.glossary,
            actor_genders: self
                .actor_genders
                .into_iter()
                .filter_map(|(key, gender)| {
                    Some((key.parse::<u32>().ok()?, gender))
                })
                .collect(),
        }
    }
}

impl Project {
    #[must_use]
    pub fn new(game_path: impl Into<PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn translated_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status.is_done())
            .count()
    }

    #[must_use]
    pub fn untranslated_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status.is_untranslated())
            .count()
    }

    #[must_use]
    pub fn entry_by_id(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entry_by_id_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Sorted unique source filenames.
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> =
            self.entries.iter().map(|entry| entry.file.as_str()).collect();
        files.sort_unstable();
        files.dedup();
        files
    }

    pub fn entries_for_file<'a>(
        &'a self,
        filename: &'a str,
    ) -> impl Iterator<Item = &'a Entry> {
        self.entries.iter().filter(move |entry| entry.file == filename)
    }

    /// (translated, total) for one source file.
    #[must_use]
    pub fn stats_for_file(&self, filename: &str) -> (usize, usize) {
        let mut done = 0;
        let mut total = 0;

        for entry in self.entries_for_file(filename) {
            total += 1;

            if entry.status.is_done() {
                done += 1;
            }
        }

        (done, total)
    }

    /// Persists the full project state. The write is atomic: content lands
    /// in a temp file which then replaces the target.
    pub fn save_state(&self, path: &Path) -> Result<(), Error> {
        let state = SaveState {
            project_path: &self.game_path,
            entries: &self.entries,
            glossary: &self.glossary,
            actor_genders: &self.actor_genders,
        };

        write_atomic(path, serde_json::to_string_pretty(&state)?.as_bytes())
    }

    pub fn load_state(path: &Path) -> Result<Self, Error> {
        let content =
            std::fs::read_to_string(path).map_err(io_error(path))?;
        let state: LoadState = serde_json::from_str(&content)?;

        Ok(state.into_project())
    }

    /// Exports the portable patch package: translated/reviewed entries,
    /// glossary, and gender table zipped together with a human-readable
    /// summary, distributable without the copyrighted game data.
    pub fn export_patch(
        &self,
        path: &Path,
        game_title: &str,
    ) -> Result<(), Error> {
        let entries: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.status.is_done() && !entry.translation.is_empty()
            })
            .collect();

        let patch = serde_json::json!({
            "entries": entries,
            "glossary": self.glossary,
            "actor_genders": self.actor_genders,
        });

        let metadata = serde_json::json!({
            "game_title": game_title,
            "entries": entries.len(),
            "glossary_terms": self.glossary.len(),
        });

        let title =
            if game_title.is_empty() { "RPG Maker Game" } else { game_title };
        let readme = format!(
            "Translation patch — {title}\n\
             {}\n\n\
             Entries: {} translated\n\n\
             HOW TO APPLY:\n\
             1. Open your own extraction of the same game in the translator.\n\
             2. Import this patch file to merge the translations.\n\
             3. Export the game data from the translator.\n",
            "=".repeat(50),
            entries.len(),
        );

        let file = File::create(path).map_err(io_error(path))?;
        let mut archive = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for (name, content) in [
            (PATCH_DATA_FILE, serde_json::to_string_pretty(&patch)?),
            (PATCH_METADATA_FILE, serde_json::to_string_pretty(&metadata)?),
            (PATCH_README_FILE, readme),
        ] {
            archive.start_file(name, options)?;
            archive
                .write_all(content.as_bytes())
                .map_err(io_error(path))?;
        }

        archive.finish()?;
        Ok(())
    }

    /// Loads a patch package as a project fragment suitable for merging
    /// through the translation-memory importer.
    pub fn import_patch(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(io_error(path))?;
        let mut archive = ZipArchive::new(file)?;

        let mut content = String::new();
        archive
            .by_name(PATCH_DATA_FILE)?
            .read_to_string(&mut content)
            .map_err(io_error(path))?;

        let state: LoadState = serde_json::from_str(&content)?;
        Ok(state.into_project())
    }
}
