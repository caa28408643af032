//! Injection facade: writes translated entries back into the original file
//! structures.
//!
//! The first export backs up `data/` to `data_original/` (and `plugins.js`
//! to `plugins_original.js`); later exports keep reading from the backup so
//! content matching still sees the original text, which makes re-export
//! idempotent after inline edits.

use crate::{
    constants::{DATABASE_FILES, PLUGINS_FILE},
    database, events,
    functions::{backup_dir_once, backup_file_once, io_error},
    plugins,
    read::{find_data_dir, find_plugins_file},
    types::{Entry, Error, Field},
};
use log::warn;
use serde_json::Value;
use std::{
    collections::HashMap,
    fs,
    path::Path,
};

/// Summary of one export: batch operations always complete over all
/// entries, so skips are reported instead of raised.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub files_written: usize,
    /// Translations written into a located position.
    pub applied: usize,
    /// Translations whose position no longer exists in the current data.
    pub skipped: usize,
}

// Database entries carry a numeric record id as the second id segment;
// event entries put the event prefix there instead.
fn is_record_entry(entry: &Entry) -> bool {
    entry
        .id
        .split('/')
        .nth(1)
        .is_some_and(|segment| {
            !segment.is_empty()
                && segment.bytes().all(|byte| byte.is_ascii_digit())
        })
}

enum Target {
    Record,
    System,
    DisplayName,
    Event,
}

fn target_for(entry: &Entry) -> Option<Target> {
    match entry.field {
        Field::GameTitle | Field::Term => Some(Target::System),
        Field::DisplayName => Some(Target::DisplayName),
        Field::Dialog
        | Field::ScrollText
        | Field::Choice
        | Field::PluginCommand => Some(Target::Event),
        Field::Name | Field::Nickname | Field::Profile => {
            if is_record_entry(entry) {
                Some(Target::Record)
            } else {
                Some(Target::Event)
            }
        }
        Field::Description | Field::Message => Some(Target::Record),
        // Speaker names apply globally through the event injector.
        Field::SpeakerName | Field::PluginParam => None,
    }
}

/// Writes translated entries back into a game folder.
pub struct ProjectWriter<'a> {
    game_dir: &'a Path,
}

impl<'a> ProjectWriter<'a> {
    #[must_use]
    pub fn new(game_dir: &'a Path) -> Self {
        Self { game_dir }
    }

    pub fn write(self, entries: &[Entry]) -> Result<WriteReport, Error> {
        let data_dir = find_data_dir(self.game_dir)
            .ok_or_else(|| Error::NoDataDir(self.game_dir.to_path_buf()))?;

        // Back up originals before the first write; an existing backup is
        // never overwritten. Sources are then read from the backup.
        let source_dir = backup_dir_once(&data_dir)?;

        let mut report = WriteReport::default();

        let mut speakers: HashMap<String, String> = HashMap::new();
        let mut by_file: HashMap<&str, Vec<&Entry>> = HashMap::new();
        let mut plugin_entries: Vec<&Entry> = Vec::new();

        for entry in entries {
            if !entry.status.is_done() || entry.translation.is_empty() {
                continue;
            }

            if entry.field.is_speaker_name() {
                speakers
                    .insert(entry.original.clone(), entry.translation.clone());
            }

            if entry.file == PLUGINS_FILE {
                plugin_entries.push(entry);
            } else {
                by_file.entry(entry.file.as_str()).or_default().push(entry);
            }
        }

        let mut filenames: Vec<&str> = by_file.keys().copied().collect();
        filenames.sort_unstable();

        for filename in filenames {
            let file_entries = &by_file[filename];
            let source_path = source_dir.join(filename);

            if !source_path.is_file() {
                warn!("source file {filename} is gone; skipping its entries");
                report.skipped += file_entries.len();
                continue;
            }

            let content = fs::read_to_string(&source_path)
                .map_err(io_error(&source_path))?;

            let mut data: Value = match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(err) => {
                    warn!("skipping malformed file {filename}: {err}");
                    report.skipped += file_entries.len();
                    continue;
                }
            };

            self.apply_file(&mut data, file_entries, &speakers, &mut report);

            let output_path = data_dir.join(filename);
            fs::write(&output_path, serde_json::to_string_pretty(&data)?)
                .map_err(io_error(&output_path))?;
            report.files_written += 1;
        }

        self.write_plugins(&plugin_entries, &mut report)?;

        Ok(report)
    }

    fn apply_file(
        &self,
        data: &mut Value,
        file_entries: &[&Entry],
        speakers: &HashMap<String, String>,
        report: &mut WriteReport,
    ) {
        let mut event_entries: Vec<&Entry> = Vec::new();

        for &entry in file_entries {
            let applied = match target_for(entry) {
                Some(Target::Record) => {
                    if DATABASE_FILES.contains_key(entry.file.as_str()) {
                        database::inject_record(data, entry)
                    } else {
                        warn!("record entry in unknown file: {}", entry.id);
                        false
                    }
                }
                Some(Target::System) => database::inject_system(data, entry),
                Some(Target::DisplayName) => {
                    events::inject_display_name(data, entry)
                }
                Some(Target::Event) => {
                    event_entries.push(entry);
                    continue;
                }
                None => continue,
            };

            if applied {
                report.applied += 1;
            } else {
                warn!("no write-back location for {}", entry.id);
                report.skipped += 1;
            }
        }

        let mut injector = events::EventInjector::new(event_entries, speakers);
        injector.apply(data);

        report.applied += injector.applied();
        report.skipped += injector.remaining();
    }

    fn write_plugins(
        &self,
        plugin_entries: &[&Entry],
        report: &mut WriteReport,
    ) -> Result<(), Error> {
        if plugin_entries.is_empty() {
            return Ok(());
        }

        let Some(plugins_path) = find_plugins_file(self.game_dir) else {
            warn!("plugins.js not found; skipping plugin entries");
            report.skipped += plugin_entries.len();
            return Ok(());
        };

        let source_path = backup_file_once(&plugins_path)?;

        let mut manifest = match plugins::load_plugins_js(&source_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("skipping plugin manifest: {err}");
                report.skipped += plugin_entries.len();
                return Ok(());
            }
        };

        for entry in plugin_entries {
            if plugins::inject_plugin_param(&mut manifest, entry) {
                report.applied += 1;
            } else {
                warn!("no write-back location for {}", entry.id);
                report.skipped += 1;
            }
        }

        fs::write(&plugins_path, plugins::render_plugins_js(&manifest)?)
            .map_err(io_error(&plugins_path))?;
        report.files_written += 1;

        Ok(())
    }
}
