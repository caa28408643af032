//! Flat-field extraction and reinjection for record-array database files
//! (Actors, Items, ...) and System.json.

use crate::{
    constants::{SYSTEM_FILE, SYSTEM_TYPE_ARRAYS},
    functions::contains_source_text,
    types::{Entry, Field, Gender},
};
use indexmap::IndexMap;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FEMALE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "(?i)彼女|お姉|少女|王女|巫女|メイド|おかあ|女|姫|嬢|娘|母|姉|妹|妻\
         |\\bactress\\b|\\bfemale\\b|\\bgirl\\b|\\bwoman\\b|\\bprincess\\b\
         |\\bqueen\\b|\\blady\\b|\\bwitch\\b|\\bpriestess\\b|\\bmaid\\b",
    )
    .expect("valid female hint regex")
});

static MALE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "(?i)おとうさん|少年|勇者|騎士|王子|息子|男|父|兄|弟|夫|彼\
         |\\bactor\\b|\\bmale\\b|\\bboy\\b|\\bman\\b|\\bprince\\b|\\bking\\b\
         |\\bknight\\b|\\bhero\\b|\\blord\\b",
    )
    .expect("valid male hint regex")
});

fn should_extract(text: &str, require_source: bool) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    !require_source || contains_source_text(text)
}

/// Emits one [`Entry`] per (record id, field) pair whose string value
/// contains source-script text. Entry id: `{filename}/{record_id}/{field}`.
#[must_use]
pub fn extract_records(
    filename: &str,
    data: &Value,
    fields: &[&str],
    require_source: bool,
) -> Vec<Entry> {
    let mut entries = Vec::new();

    let Some(records) = data.as_array() else {
        return entries;
    };

    for record in records {
        let Some(record) = record.as_object() else {
            continue;
        };

        let record_id =
            record.get("id").and_then(Value::as_u64).unwrap_or_default();

        for &field_name in fields {
            let Some(text) = record.get(field_name).and_then(Value::as_str)
            else {
                continue;
            };

            if should_extract(text, require_source) {
                entries.push(Entry::new(
                    format!("{filename}/{record_id}/{field_name}"),
                    filename,
                    Field::from_database_field(field_name),
                    text,
                ));
            }
        }
    }

    entries
}

/// Writes a translation back into the record identified by the entry id.
/// Missing records or fields are skipped silently; returns whether the
/// value was applied.
pub fn inject_record(data: &mut Value, entry: &Entry) -> bool {
    let mut segments = entry.id.splitn(3, '/');
    let _filename = segments.next();

    let Some(record_id) =
        segments.next().and_then(|raw| raw.parse::<u64>().ok())
    else {
        warn!("malformed database entry id: {}", entry.id);
        return false;
    };

    let Some(field_name) = segments.next() else {
        warn!("malformed database entry id: {}", entry.id);
        return false;
    };

    let Some(records) = data.as_array_mut() else {
        return false;
    };

    for record in records {
        let Some(record) = record.as_object_mut() else {
            continue;
        };

        if record.get("id").and_then(Value::as_u64) != Some(record_id) {
            continue;
        }

        if let Some(slot) = record.get_mut(field_name) {
            *slot = Value::String(entry.translation.clone());
            return true;
        }

        // Record found but the field is gone; nothing to write.
        return false;
    }

    false
}

fn extract_string_array(
    data: &Value,
    path: &[&str],
    field: Field,
    require_source: bool,
    entries: &mut Vec<Entry>,
) {
    let mut node = data;

    for segment in path {
        let Some(next) = node.get(segment) else {
            return;
        };
        node = next;
    }

    let Some(values) = node.as_array() else {
        return;
    };

    for (index, value) in values.iter().enumerate() {
        let Some(text) = value.as_str() else {
            continue;
        };

        if should_extract(text, require_source) {
            entries.push(Entry::new(
                format!("{SYSTEM_FILE}/{}/{index}", path.join("/")),
                SYSTEM_FILE,
                field,
                text,
            ));
        }
    }
}

/// Extracts the game title, term tables, and type arrays from System.json.
#[must_use]
pub fn extract_system(data: &Value, require_source: bool) -> Vec<Entry> {
    let mut entries = Vec::new();

    if let Some(title) = data.get("gameTitle").and_then(Value::as_str) {
        if should_extract(title, require_source) {
            entries.push(Entry::new(
                format!("{SYSTEM_FILE}/gameTitle"),
                SYSTEM_FILE,
                Field::GameTitle,
                title,
            ));
        }
    }

    // terms.messages is an array in MZ, an object in MV.
    match data.get("terms").and_then(|terms| terms.get("messages")) {
        Some(Value::Array(_)) => extract_string_array(
            data,
            &["terms", "messages"],
            Field::Term,
            require_source,
            &mut entries,
        ),
        Some(Value::Object(messages)) => {
            for (key, value) in messages {
                let Some(text) = value.as_str() else {
                    continue;
                };

                if should_extract(text, require_source) {
                    entries.push(Entry::new(
                        format!("{SYSTEM_FILE}/terms/messages/{key}"),
                        SYSTEM_FILE,
                        Field::Term,
                        text,
                    ));
                }
            }
        }
        _ => {}
    }

    for table in ["commands", "params", "basic"] {
        extract_string_array(
            data,
            &["terms", table],
            Field::Term,
            require_source,
            &mut entries,
        );
    }

    for array_name in SYSTEM_TYPE_ARRAYS {
        extract_string_array(
            data,
            &[array_name],
            Field::Term,
            require_source,
            &mut entries,
        );
    }

    entries
}

/// Writes a System.json translation back by its id path. Unknown paths and
/// out-of-range indices are skipped; returns whether the value was applied.
pub fn inject_system(data: &mut Value, entry: &Entry) -> bool {
    let segments: Vec<&str> = entry.id.split('/').skip(1).collect();

    match segments.as_slice() {
        ["gameTitle"] => {
            if let Some(slot) = data.get_mut("gameTitle") {
                *slot = Value::String(entry.translation.clone());
                return true;
            }
        }
        ["terms", "messages", key] => {
            let Some(messages) =
                data.get_mut("terms").and_then(|terms| terms.get_mut("messages"))
            else {
                return false;
            };

            match messages {
                Value::Array(values) => {
                    if let Some(slot) = key
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| values.get_mut(index))
                    {
                        *slot = Value::String(entry.translation.clone());
                        return true;
                    }
                }
                Value::Object(map) => {
                    if let Some(slot) = map.get_mut(*key) {
                        *slot = Value::String(entry.translation.clone());
                        return true;
                    }
                }
                _ => {}
            }
        }
        ["terms", table, index] => {
            if let Some(slot) = data
                .get_mut("terms")
                .and_then(|terms| terms.get_mut(*table))
                .and_then(Value::as_array_mut)
                .and_then(|values| {
                    values.get_mut(index.parse::<usize>().ok()?)
                })
            {
                *slot = Value::String(entry.translation.clone());
                return true;
            }
        }
        [array_name, index] => {
            if let Some(slot) = data
                .get_mut(*array_name)
                .and_then(Value::as_array_mut)
                .and_then(|values| {
                    values.get_mut(index.parse::<usize>().ok()?)
                })
            {
                *slot = Value::String(entry.translation.clone());
                return true;
            }
        }
        _ => warn!("malformed System entry id: {}", entry.id),
    }

    false
}

/// Raw actor metadata used for gender assignment and translator context.
#[derive(Debug, Clone)]
pub struct ActorInfo {
    pub id: u32,
    pub name: String,
    pub nickname: String,
    pub profile: String,
    pub auto_gender: Option<Gender>,
}

/// Guesses a pronoun gender from actor metadata by keyword scoring.
#[must_use]
pub fn detect_gender(
    profile: &str,
    note: &str,
    nickname: &str,
) -> Option<Gender> {
    let haystack = format!("{profile} {note} {nickname}");

    let female_score = FEMALE_HINTS.find_iter(&haystack).count();
    let male_score = MALE_HINTS.find_iter(&haystack).count();

    if female_score > male_score {
        Some(Gender::Female)
    } else if male_score > female_score {
        Some(Gender::Male)
    } else {
        None
    }
}

/// Collects actor metadata from a parsed Actors.json array.
#[must_use]
pub fn scan_actors(data: &Value) -> Vec<ActorInfo> {
    let mut actors = Vec::new();

    let Some(records) = data.as_array() else {
        return actors;
    };

    for record in records {
        let Some(record) = record.as_object() else {
            continue;
        };

        let name = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();

        if name.is_empty() {
            continue;
        }

        let field = |key: &str| -> String {
            record
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        let nickname = field("nickname");
        let profile = field("profile");
        let note = field("note");

        actors.push(ActorInfo {
            id: record.get("id").and_then(Value::as_u64).unwrap_or_default()
                as u32,
            name: name.to_string(),
            auto_gender: detect_gender(&profile, &note, &nickname),
            nickname,
            profile,
        });
    }

    actors
}

/// Builds the character reference block threaded to the translation
/// capability. Confirmed genders override the automatic guesses.
#[must_use]
pub fn build_actor_context(
    actors: &[ActorInfo],
    genders: &IndexMap<u32, Gender>,
) -> String {
    let mut lines = Vec::with_capacity(actors.len());

    for actor in actors {
        let mut parts = vec![format!("Actor {}: {}", actor.id, actor.name)];

        match genders.get(&actor.id).copied().or(actor.auto_gender) {
            Some(Gender::Female) => {
                parts.push("[female - use she/her]".into());
            }
            Some(Gender::Male) => parts.push("[male - use he/him]".into()),
            None => {}
        }

        if !actor.nickname.is_empty() {
            parts.push(format!("aka \"{}\"", actor.nickname));
        }

        if !actor.profile.is_empty() {
            parts.push(format!("- {}", actor.profile));
        }

        lines.push(parts.join(" "));
    }

    if lines.is_empty() {
        return String::new();
    }

    format!(
        "Characters in this game (ALWAYS use the listed pronouns):\n{}",
        lines.join("\n")
    )
}
