//! Event-command extraction and reinjection for Map, CommonEvents, and
//! Troops files.
//!
//! Event command lists are heterogeneous sequences of `{code, parameters}`
//! records. Extraction walks each list with a small state machine: a header
//! command (101) sets the current speaker, consecutive dialogue commands
//! (401/405) are grouped into one logical block, and a bounded window of
//! recent text is kept as translator context. Injection re-walks the current
//! data and locates each block by content match rather than stored offsets,
//! since earlier passes may already have mutated the structure.

use crate::{
    constants::MZ_PLUGIN_PARAM_OFFSET,
    functions::contains_source_text,
    types::{Code, Entry, Field},
};
use log::warn;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};

fn command_code(command: &Value) -> Code {
    Code::from(
        command.get("code").and_then(Value::as_u64).unwrap_or_default() as u16,
    )
}

fn text_parameter(command: &Value, index: usize) -> Option<&str> {
    command
        .get("parameters")
        .and_then(Value::as_array)
        .and_then(|parameters| parameters.get(index))
        .and_then(Value::as_str)
}

/// Walks event command lists and emits [`Entry`] records for translatable
/// text. One scanner is shared across the lists of a single file so speaker
/// deduplication spans the whole file.
pub struct EventScanner<'a> {
    filename: &'a str,
    require_source: bool,
    context_size: usize,
    /// Speaker names already emitted, shared across files so one name is
    /// translated once and applied everywhere.
    seen_speakers: &'a mut HashSet<String>,
}

impl<'a> EventScanner<'a> {
    pub fn new(
        filename: &'a str,
        require_source: bool,
        context_size: usize,
        seen_speakers: &'a mut HashSet<String>,
    ) -> Self {
        Self {
            filename,
            require_source,
            context_size,
            seen_speakers,
        }
    }

    fn should_extract(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        !self.require_source || contains_source_text(text)
    }

    /// Consumes the run of same-code commands starting at `start` and
    /// returns the joined block text plus the run length.
    fn collect_block(
        commands: &[Value],
        start: usize,
        code: Code,
    ) -> (String, usize) {
        let mut lines: SmallVec<[&str; 4]> = SmallVec::new();
        let mut position = start;

        while position < commands.len() {
            let command = &commands[position];

            if command_code(command) != code {
                break;
            }

            lines.push(text_parameter(command, 0).unwrap_or_default());
            position += 1;
        }

        (lines.join("\n"), position - start)
    }

    fn push_context(&self, window: &mut VecDeque<String>, text: &str) {
        if window.len() == self.context_size {
            window.pop_front();
        }

        window.push_back(text.to_string());
    }

    fn window_context(window: &VecDeque<String>) -> String {
        window
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    fn emit_speaker(&mut self, name: &str, entries: &mut Vec<Entry>) {
        if !self.should_extract(name) || self.seen_speakers.contains(name) {
            return;
        }

        self.seen_speakers.insert(name.to_string());
        entries.push(Entry::new(
            format!("{}/speaker/{name}", self.filename),
            self.filename,
            Field::SpeakerName,
            name,
        ));
    }

    /// Extracts entries from one event command list. `prefix` names the
    /// enclosing event and page, e.g. `Ev3(Door)/p0`.
    pub fn scan_list(&mut self, commands: &[Value], prefix: &str) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut window: VecDeque<String> =
            VecDeque::with_capacity(self.context_size);
        let mut current_speaker = String::new();

        // The sequence counter advances for every candidate command whether
        // or not an entry is emitted, so ids stay stable when a block gains
        // or loses source text between game versions.
        let mut sequence = 0usize;

        let mut position = 0usize;

        while position < commands.len() {
            let command = &commands[position];
            let code = command_code(command);

            match code {
                Code::TextHeader => {
                    let face = text_parameter(command, 0).unwrap_or_default();
                    let speaker =
                        text_parameter(command, 4).unwrap_or_default();

                    current_speaker = if speaker.is_empty() {
                        face.to_string()
                    } else {
                        self.emit_speaker(speaker, &mut entries);
                        speaker.to_string()
                    };
                }
                Code::Text | Code::ScrollText => {
                    let (block, length) =
                        Self::collect_block(commands, position, code);
                    sequence += 1;

                    if self.should_extract(&block) {
                        let (field, id_tag) = if code.is_text() {
                            (Field::Dialog, "dialog")
                        } else {
                            (Field::ScrollText, "scroll")
                        };

                        let mut context_parts = Vec::new();

                        if field.is_dialog() && !current_speaker.is_empty() {
                            context_parts
                                .push(format!("[Speaker: {current_speaker}]"));
                        }

                        if !window.is_empty() {
                            context_parts.push(Self::window_context(&window));
                        }

                        entries.push(
                            Entry::new(
                                format!(
                                    "{}/{prefix}/{id_tag}_{sequence}",
                                    self.filename
                                ),
                                self.filename,
                                field,
                                &block,
                            )
                            .with_context(context_parts.join("\n")),
                        );
                        self.push_context(&mut window, &block);
                    }

                    position += length;
                    continue;
                }
                Code::Choices => {
                    sequence += 1;

                    let choices = command
                        .get("parameters")
                        .and_then(Value::as_array)
                        .and_then(|parameters| parameters.first())
                        .and_then(Value::as_array);

                    if let Some(choices) = choices {
                        let context = Self::window_context(&window);

                        for (choice_index, choice) in choices.iter().enumerate()
                        {
                            let Some(text) = choice.as_str() else {
                                continue;
                            };

                            if self.should_extract(text) {
                                entries.push(
                                    Entry::new(
                                        format!(
                                            "{}/{prefix}/choice_{sequence}_{choice_index}",
                                            self.filename
                                        ),
                                        self.filename,
                                        Field::Choice,
                                        text,
                                    )
                                    .with_context(context.clone()),
                                );
                                self.push_context(&mut window, text);
                            }
                        }
                    }
                }
                Code::ChangeName | Code::ChangeNickname | Code::ChangeProfile => {
                    sequence += 1;

                    let field = match code {
                        Code::ChangeName => Field::Name,
                        Code::ChangeNickname => Field::Nickname,
                        _ => Field::Profile,
                    };

                    if let Some(text) = text_parameter(command, 1) {
                        if self.should_extract(text) {
                            entries.push(Entry::new(
                                format!(
                                    "{}/{prefix}/change_{field}_{sequence}",
                                    self.filename
                                ),
                                self.filename,
                                field,
                                text,
                            ));
                        }
                    }
                }
                Code::PluginMv => {
                    sequence += 1;

                    if let Some(text) = text_parameter(command, 0) {
                        if self.should_extract(text) {
                            entries.push(Entry::new(
                                format!(
                                    "{}/{prefix}/plugin_mv_{sequence}",
                                    self.filename
                                ),
                                self.filename,
                                Field::PluginCommand,
                                text,
                            ));
                        }
                    }
                }
                Code::PluginMz => {
                    sequence += 1;

                    let parameters = command
                        .get("parameters")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or_default();

                    for (offset, parameter) in parameters
                        .iter()
                        .enumerate()
                        .skip(MZ_PLUGIN_PARAM_OFFSET)
                    {
                        let Some(text) = parameter.as_str() else {
                            continue;
                        };

                        if self.should_extract(text) {
                            entries.push(Entry::new(
                                format!(
                                    "{}/{prefix}/plugin_mz_{sequence}_p{offset}",
                                    self.filename
                                ),
                                self.filename,
                                Field::PluginCommand,
                                text,
                            ));
                        }
                    }
                }
                _ => {}
            }

            position += 1;
        }

        entries
    }
}

/// Extracts a Map file: the display name plus every event page.
pub fn scan_map(scanner: &mut EventScanner, data: &Value) -> Vec<Entry> {
    let mut entries = Vec::new();

    if let Some(display_name) = data.get("displayName").and_then(Value::as_str)
    {
        if scanner.should_extract(display_name) {
            entries.push(Entry::new(
                format!("{}/displayName", scanner.filename),
                scanner.filename,
                Field::DisplayName,
                display_name,
            ));
        }
    }

    let Some(events) = data.get("events").and_then(Value::as_array) else {
        return entries;
    };

    for event in events {
        let Some(event) = event.as_object() else {
            continue;
        };

        let event_id =
            event.get("id").and_then(Value::as_u64).unwrap_or_default();
        let event_name =
            event.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(pages) = event.get("pages").and_then(Value::as_array) else {
            continue;
        };

        for (page_index, page) in pages.iter().enumerate() {
            let Some(commands) = page.get("list").and_then(Value::as_array)
            else {
                continue;
            };

            entries.extend(scanner.scan_list(
                commands,
                &format!("Ev{event_id}({event_name})/p{page_index}"),
            ));
        }
    }

    entries
}

/// Extracts CommonEvents.json: a flat array of events with top-level lists.
pub fn scan_common_events(
    scanner: &mut EventScanner,
    data: &Value,
) -> Vec<Entry> {
    let mut entries = Vec::new();

    let Some(events) = data.as_array() else {
        return entries;
    };

    for event in events {
        let Some(event) = event.as_object() else {
            continue;
        };

        let event_id =
            event.get("id").and_then(Value::as_u64).unwrap_or_default();
        let event_name =
            event.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(commands) = event.get("list").and_then(Value::as_array) else {
            continue;
        };

        entries.extend(
            scanner.scan_list(commands, &format!("CE{event_id}({event_name})")),
        );
    }

    entries
}

/// Extracts Troops.json battle event pages.
pub fn scan_troops(scanner: &mut EventScanner, data: &Value) -> Vec<Entry> {
    let mut entries = Vec::new();

    let Some(troops) = data.as_array() else {
        return entries;
    };

    for troop in troops {
        let Some(troop) = troop.as_object() else {
            continue;
        };

        let troop_id =
            troop.get("id").and_then(Value::as_u64).unwrap_or_default();
        let troop_name =
            troop.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(pages) = troop.get("pages").and_then(Value::as_array) else {
            continue;
        };

        for (page_index, page) in pages.iter().enumerate() {
            let Some(commands) = page.get("list").and_then(Value::as_array)
            else {
                continue;
            };

            entries.extend(scanner.scan_list(
                commands,
                &format!("Troop{troop_id}({troop_name})/p{page_index}"),
            ));
        }
    }

    entries
}

type BlockQueue = VecDeque<(Vec<String>, Vec<String>)>;

/// Applies event translations for one file in a single pass over its
/// command lists.
///
/// Blocks are located by content match: a contiguous run of same-code
/// commands whose per-command text equals the stored original lines. Each
/// applied block consumes its lookup slot, so duplicate identical entries
/// resolve to successive duplicate blocks in document order. Entries whose
/// original text no longer exists are skipped and reported in
/// [`EventInjector::remaining`].
pub struct EventInjector {
    dialog_lookup: HashMap<String, BlockQueue>,
    scroll_lookup: HashMap<String, BlockQueue>,
    choice_lookup: HashMap<String, VecDeque<String>>,
    // (code, param index, original) → queue of translations.
    param_lookup: HashMap<(u16, usize, String), VecDeque<String>>,
    speaker_lookup: HashMap<String, String>,
    applied: usize,
}

impl EventInjector {
    /// Builds the lookup tables from translated entries of one file.
    /// `speakers` is the global speaker-name lookup shared across files.
    #[must_use]
    pub fn new<'a>(
        entries: impl IntoIterator<Item = &'a Entry>,
        speakers: &HashMap<String, String>,
    ) -> Self {
        let mut injector = Self {
            dialog_lookup: HashMap::new(),
            scroll_lookup: HashMap::new(),
            choice_lookup: HashMap::new(),
            param_lookup: HashMap::new(),
            speaker_lookup: speakers.clone(),
            applied: 0,
        };

        for entry in entries {
            if !entry.status.is_done() || entry.translation.is_empty() {
                continue;
            }

            match entry.field {
                Field::Dialog | Field::ScrollText => {
                    let original_lines: Vec<String> =
                        entry.original.split('\n').map(String::from).collect();
                    let translation_lines =
                        fit_lines(&entry.translation, original_lines.len());

                    let Some(first) = original_lines.first().cloned() else {
                        continue;
                    };

                    let lookup = if entry.field.is_dialog() {
                        &mut injector.dialog_lookup
                    } else {
                        &mut injector.scroll_lookup
                    };

                    lookup
                        .entry(first)
                        .or_default()
                        .push_back((original_lines, translation_lines));
                }
                Field::Choice => {
                    injector
                        .choice_lookup
                        .entry(entry.original.clone())
                        .or_default()
                        .push_back(entry.translation.clone());
                }
                Field::Name | Field::Nickname | Field::Profile => {
                    let code = match entry.field {
                        Field::Name => Code::ChangeName,
                        Field::Nickname => Code::ChangeNickname,
                        _ => Code::ChangeProfile,
                    };

                    injector.queue_param(
                        code as u16,
                        1,
                        &entry.original,
                        &entry.translation,
                    );
                }
                Field::PluginCommand => {
                    if entry.id.contains("/plugin_mv_") {
                        injector.queue_param(
                            Code::PluginMv as u16,
                            0,
                            &entry.original,
                            &entry.translation,
                        );
                    } else if let Some(index) = parse_mz_param_index(&entry.id)
                    {
                        injector.queue_param(
                            Code::PluginMz as u16,
                            index,
                            &entry.original,
                            &entry.translation,
                        );
                    } else {
                        warn!("malformed plugin command id: {}", entry.id);
                    }
                }
                _ => {}
            }
        }

        injector
    }

    fn queue_param(
        &mut self,
        code: u16,
        index: usize,
        original: &str,
        translation: &str,
    ) {
        self.param_lookup
            .entry((code, index, original.to_string()))
            .or_default()
            .push_back(translation.to_string());
    }

    /// Number of translations written into the data so far.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.applied
    }

    /// Number of queued translations that found no matching location.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.dialog_lookup
            .values()
            .chain(self.scroll_lookup.values())
            .map(VecDeque::len)
            .sum::<usize>()
            + self
                .choice_lookup
                .values()
                .chain(self.param_lookup.values())
                .map(VecDeque::len)
                .sum::<usize>()
    }

    /// Walks every event command list in `data` and applies queued
    /// translations. Handles Map objects (`events[].pages[].list[]`),
    /// CommonEvents arrays (top-level `list`), and Troops arrays
    /// (`pages[].list[]`).
    pub fn apply(&mut self, data: &mut Value) {
        match data {
            Value::Object(map) => {
                if let Some(events) =
                    map.get_mut("events").and_then(Value::as_array_mut)
                {
                    for event in events {
                        let Some(pages) = event
                            .get_mut("pages")
                            .and_then(Value::as_array_mut)
                        else {
                            continue;
                        };

                        for page in pages {
                            if let Some(commands) = page
                                .get_mut("list")
                                .and_then(Value::as_array_mut)
                            {
                                self.apply_to_list(commands);
                            }
                        }
                    }
                }

                if let Some(commands) =
                    map.get_mut("list").and_then(Value::as_array_mut)
                {
                    self.apply_to_list(commands);
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Some(commands) =
                        item.get_mut("list").and_then(Value::as_array_mut)
                    {
                        self.apply_to_list(commands);
                    }

                    let Some(pages) =
                        item.get_mut("pages").and_then(Value::as_array_mut)
                    else {
                        continue;
                    };

                    for page in pages {
                        if let Some(commands) =
                            page.get_mut("list").and_then(Value::as_array_mut)
                        {
                            self.apply_to_list(commands);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_to_list(&mut self, commands: &mut Vec<Value>) {
        let mut position = 0usize;

        while position < commands.len() {
            let code = command_code(&commands[position]);

            match code {
                Code::TextHeader => {
                    self.apply_speaker(&mut commands[position]);
                }
                Code::Text => {
                    if let Some(advance) =
                        self.apply_block(commands, position, code)
                    {
                        position += advance;
                        continue;
                    }
                }
                Code::ScrollText => {
                    if let Some(advance) =
                        self.apply_block(commands, position, code)
                    {
                        position += advance;
                        continue;
                    }
                }
                Code::Choices => {
                    self.apply_choices(&mut commands[position]);
                }
                Code::ChangeName
                | Code::ChangeNickname
                | Code::ChangeProfile => {
                    self.apply_param(&mut commands[position], code as u16, 1);
                }
                Code::PluginMv => {
                    self.apply_param(&mut commands[position], code as u16, 0);
                }
                Code::PluginMz => {
                    let parameter_count = commands[position]
                        .get("parameters")
                        .and_then(Value::as_array)
                        .map(Vec::len)
                        .unwrap_or_default();

                    for index in MZ_PLUGIN_PARAM_OFFSET..parameter_count {
                        self.apply_param(
                            &mut commands[position],
                            code as u16,
                            index,
                        );
                    }
                }
                _ => {}
            }

            position += 1;
        }
    }

    fn apply_speaker(&mut self, command: &mut Value) {
        if self.speaker_lookup.is_empty() {
            return;
        }

        let Some(parameters) =
            command.get_mut("parameters").and_then(Value::as_array_mut)
        else {
            return;
        };

        let Some(slot) = parameters.get_mut(4) else {
            return;
        };

        if let Some(translation) =
            slot.as_str().and_then(|name| self.speaker_lookup.get(name))
        {
            *slot = Value::String(translation.clone());
        }
    }

    /// Tries to apply a block translation starting at `start`. On success
    /// returns the number of commands covered; the command count never
    /// changes.
    fn apply_block(
        &mut self,
        commands: &mut [Value],
        start: usize,
        code: Code,
    ) -> Option<usize> {
        let first_text = text_parameter(&commands[start], 0)?.to_string();

        let lookup = if code.is_text() {
            &mut self.dialog_lookup
        } else {
            &mut self.scroll_lookup
        };
        let candidates = lookup.get_mut(&first_text)?;

        let matched = candidates.iter().position(|(original_lines, _)| {
            if start + original_lines.len() > commands.len() {
                return false;
            }

            original_lines.iter().enumerate().all(|(offset, line)| {
                let command = &commands[start + offset];
                command_code(command) == code
                    && text_parameter(command, 0) == Some(line.as_str())
            })
        })?;

        let (original_lines, translation_lines) =
            candidates.remove(matched).unwrap_or_default();

        if candidates.is_empty() {
            lookup.remove(&first_text);
        }

        for (offset, line) in translation_lines.iter().enumerate() {
            if let Some(parameters) = commands[start + offset]
                .get_mut("parameters")
                .and_then(Value::as_array_mut)
            {
                if let Some(slot) = parameters.first_mut() {
                    *slot = Value::String(line.clone());
                }
            }
        }

        self.applied += 1;
        Some(original_lines.len())
    }

    fn apply_choices(&mut self, command: &mut Value) {
        if self.choice_lookup.is_empty() {
            return;
        }

        let Some(choices) = command
            .get_mut("parameters")
            .and_then(Value::as_array_mut)
            .and_then(|parameters| parameters.first_mut())
            .and_then(Value::as_array_mut)
        else {
            return;
        };

        for choice in choices {
            let Some(text) = choice.as_str() else {
                continue;
            };

            let Some(queue) = self.choice_lookup.get_mut(text) else {
                continue;
            };

            if let Some(translation) = queue.pop_front() {
                if queue.is_empty() {
                    self.choice_lookup.remove(text);
                }

                *choice = Value::String(translation);
                self.applied += 1;
            }
        }
    }

    fn apply_param(&mut self, command: &mut Value, code: u16, index: usize) {
        if self.param_lookup.is_empty() {
            return;
        }

        let Some(parameters) =
            command.get_mut("parameters").and_then(Value::as_array_mut)
        else {
            return;
        };

        let Some(slot) = parameters.get_mut(index) else {
            return;
        };

        let Some(original) = slot.as_str() else {
            return;
        };

        let key = (code, index, original.to_string());

        let Some(queue) = self.param_lookup.get_mut(&key) else {
            return;
        };

        if let Some(translation) = queue.pop_front() {
            if queue.is_empty() {
                self.param_lookup.remove(&key);
            }

            *slot = Value::String(translation);
            self.applied += 1;
        }
    }
}

/// Writes a Map display-name translation directly into the map object.
pub fn inject_display_name(data: &mut Value, entry: &Entry) -> bool {
    if let Some(slot) = data.get_mut("displayName") {
        *slot = Value::String(entry.translation.clone());
        return true;
    }

    false
}

/// Splits a translation on line breaks and pads or truncates it to exactly
/// `count` lines. Command counts must never change at injection time; the
/// reflow engine is responsible for fitting text beforehand.
fn fit_lines(translation: &str, count: usize) -> Vec<String> {
    let mut lines: Vec<String> =
        translation.split('\n').map(String::from).collect();

    if lines.len() > count {
        warn!(
            "translation has {} lines for a {count}-command block; extra lines dropped",
            lines.len()
        );
        lines.truncate(count);
    }

    while lines.len() < count {
        lines.push(String::new());
    }

    lines
}

/// Parses the trailing parameter index from an MZ plugin command id,
/// e.g. `Map001.json/Ev1(x)/p0/plugin_mz_4_p5` → 5.
fn parse_mz_param_index(id: &str) -> Option<usize> {
    id.rsplit_once("_p")?.1.parse().ok()
}
