//! Translation memory: carrying translations forward across project
//! versions and bootstrapping from an already-localized donor game.

use crate::{project::Project, types::{Entry, Status}};
use std::collections::HashMap;

/// Tally of one [`import_translations`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    /// Matched by exact id with identical original text.
    pub by_id: usize,
    /// Matched by exact original-text equality.
    pub by_text: usize,
    /// Already translated in the current project, left untouched.
    pub skipped: usize,
    /// No match found; still needs translation.
    pub new: usize,
}

/// Carries translations from an older project state (or an imported patch)
/// into every untranslated entry of the current one.
///
/// Matching is by exact id first, cross-checked against the original text
/// since ids can be reused for unrelated content when source data shifts,
/// then by exact original-text equality against any translated old entry
/// (first match wins). Translation and status are both copied, so reviewed
/// entries stay reviewed. Glossary terms and gender hints come along too,
/// without overriding existing ones.
pub fn import_translations(
    project: &mut Project,
    old: &Project,
) -> ImportStats {
    let mut stats = ImportStats::default();

    for (term, translation) in &old.glossary {
        if !project.glossary.contains_key(term) {
            project.glossary.insert(term.clone(), translation.clone());
        }
    }

    for (&actor_id, &gender) in &old.actor_genders {
        project.actor_genders.entry(actor_id).or_insert(gender);
    }

    let mut by_id: HashMap<&str, &Entry> = HashMap::new();
    let mut by_text: HashMap<&str, &Entry> = HashMap::new();

    for entry in &old.entries {
        if !entry.status.is_done() || entry.translation.is_empty() {
            continue;
        }

        by_id.insert(entry.id.as_str(), entry);
        // First match wins for text equality.
        by_text.entry(entry.original.as_str()).or_insert(entry);
    }

    for entry in &mut project.entries {
        if !entry.status.is_untranslated() {
            stats.skipped += 1;
            continue;
        }

        if let Some(old_entry) = by_id.get(entry.id.as_str()) {
            if old_entry.original == entry.original {
                entry.translation = old_entry.translation.clone();
                entry.status = old_entry.status;
                stats.by_id += 1;
                continue;
            }
        }

        if let Some(old_entry) = by_text.get(entry.original.as_str()) {
            entry.translation = old_entry.translation.clone();
            entry.status = old_entry.status;
            stats.by_text += 1;
            continue;
        }

        stats.new += 1;
    }

    stats
}

/// Tally of one [`import_from_game_folder`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DonorImportStats {
    /// Donor text differed and was taken as the translation.
    pub imported: usize,
    /// Donor text identical to the original; nothing to take.
    pub identical: usize,
    /// Already translated in the current project, left untouched.
    pub skipped: usize,
    /// Entry has no counterpart in the donor.
    pub new: usize,
}

/// Bootstraps translations from entries extracted out of an
/// already-localized copy of the same game, matching by id only.
///
/// When donor text differs from the current original it becomes the
/// translation. In `swap` mode the donor is the authoritative original
/// instead (the user opened the translated copy as their project), so the
/// current original is demoted to the translation.
pub fn import_from_game_folder(
    project: &mut Project,
    donor_entries: &[Entry],
    swap: bool,
) -> DonorImportStats {
    let mut stats = DonorImportStats::default();

    let donor_by_id: HashMap<&str, &str> = donor_entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.original.as_str()))
        .collect();

    for entry in &mut project.entries {
        if !entry.status.is_untranslated() {
            stats.skipped += 1;
            continue;
        }

        match donor_by_id.get(entry.id.as_str()) {
            None => stats.new += 1,
            Some(donor_text) if *donor_text == entry.original => {
                stats.identical += 1;
            }
            Some(donor_text) => {
                if swap {
                    entry.translation =
                        std::mem::replace(&mut entry.original, (*donor_text).to_string());
                } else {
                    entry.translation = (*donor_text).to_string();
                }

                entry.status = Status::Translated;
                stats.imported += 1;
            }
        }
    }

    stats
}
