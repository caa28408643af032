//! Post-translation word wrapping.
//!
//! Translated text rarely fits the line structure of the original. When the
//! game ships a word-wrap-capable message plugin, wrapping is delegated to
//! it with a marker tag and the text only has to fit the original number of
//! display commands. Without one, text is re-wrapped here against a
//! characters-per-line budget derived from the detected message window
//! metrics.

use crate::{
    constants::{
        AVERAGE_CHAR_WIDTH_RATIO, DEFAULT_CHARS_PER_LINE, DEFAULT_FONT_SIZE,
        DEFAULT_MAX_LINES, DEFAULT_MESSAGE_WIDTH, MESSAGE_PLUGINS,
        MESSAGE_WINDOW_PADDING, MIN_CHARS_PER_LINE, WORDWRAP_PLUGIN_HINTS,
        WORDWRAP_TAG,
    },
    protect::visual_len,
    types::Entry,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static WORDWRAP_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)<wordwrap>").expect("valid wordwrap tag regex")
});

fn plugin_parameter<'v>(
    parameters: Option<&'v Value>,
    key: &str,
) -> Option<&'v str> {
    if key.is_empty() {
        return None;
    }

    parameters?.get(key)?.as_str()
}

/// Message window settings detected from the game's plugins and System.json.
#[derive(Debug, Clone)]
pub struct WindowMetrics {
    pub message_width: u32,
    pub font_size: u32,
    /// Visual characters that fit on one display line.
    pub chars_per_line: usize,
    /// Display lines per message box before the engine paginates.
    pub max_lines: usize,
    /// A word-wrap-capable plugin is installed and enabled.
    pub has_wordwrap_plugin: bool,
    /// Tag that activates the plugin's own wrapping, e.g. `<WordWrap>`.
    pub wordwrap_tag: String,
    pub detected_plugins: Vec<String>,
}

impl Default for WindowMetrics {
    fn default() -> Self {
        Self {
            message_width: DEFAULT_MESSAGE_WIDTH,
            font_size: DEFAULT_FONT_SIZE,
            chars_per_line: DEFAULT_CHARS_PER_LINE,
            max_lines: DEFAULT_MAX_LINES,
            has_wordwrap_plugin: false,
            wordwrap_tag: String::new(),
            detected_plugins: Vec::new(),
        }
    }
}

impl WindowMetrics {
    /// Derives metrics from a parsed plugin manifest and System.json.
    /// Unknown or disabled plugins leave the defaults in place.
    #[must_use]
    pub fn detect(plugins: Option<&Value>, system: Option<&Value>) -> Self {
        let mut metrics = Self::default();

        if let Some(plugin_list) =
            plugins.and_then(Value::as_array)
        {
            for plugin in plugin_list {
                let Some(plugin) = plugin.as_object() else {
                    continue;
                };

                if plugin.get("status").and_then(Value::as_bool) != Some(true)
                {
                    continue;
                }

                let name = plugin
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let parameters = plugin.get("parameters");

                for (known_name, config) in MESSAGE_PLUGINS.entries() {
                    if name
                        .to_lowercase()
                        .contains(&known_name.to_lowercase())
                    {
                        metrics.detected_plugins.push(name.to_string());
                        metrics.apply_plugin(name, parameters, *config);
                    }
                }
            }
        }

        if let Some(font_size) = system
            .and_then(|system| system.get("advanced"))
            .and_then(|advanced| advanced.get("fontSize"))
            .and_then(Value::as_u64)
        {
            if font_size > 0 {
                metrics.font_size = font_size as u32;
            }
        }

        metrics.recalculate();
        metrics
    }

    fn apply_plugin(
        &mut self,
        name: &str,
        parameters: Option<&Value>,
        (width_param, rows_param, wordwrap_param): (&str, &str, &str),
    ) {
        if let Some(width) = plugin_parameter(parameters, width_param)
            .and_then(|raw| raw.parse::<u32>().ok())
        {
            self.message_width = width;
        }

        if let Some(rows) = plugin_parameter(parameters, rows_param)
            .and_then(|raw| raw.parse::<usize>().ok())
        {
            if rows > 0 {
                self.max_lines = rows;
            }
        }

        if !wordwrap_param.is_empty() {
            self.has_wordwrap_plugin = true;

            if let Some(value) = plugin_parameter(parameters, wordwrap_param) {
                if matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
                {
                    self.wordwrap_tag = WORDWRAP_TAG.to_string();
                }
            }
        }

        let name_lower = name.to_lowercase();

        if WORDWRAP_PLUGIN_HINTS
            .iter()
            .any(|hint| name_lower.contains(hint))
        {
            self.has_wordwrap_plugin = true;

            if self.wordwrap_tag.is_empty() {
                self.wordwrap_tag = WORDWRAP_TAG.to_string();
            }
        }
    }

    fn recalculate(&mut self) {
        let usable_width =
            self.message_width.saturating_sub(MESSAGE_WINDOW_PADDING);
        let char_width = self.font_size as f32 * AVERAGE_CHAR_WIDTH_RATIO;

        if char_width > 0.0 {
            self.chars_per_line = (usable_width as f32 / char_width)
                .floor()
                .max(MIN_CHARS_PER_LINE as f32)
                as usize;
        }
    }

    /// Word wrap can be delegated to an installed plugin via its tag.
    #[must_use]
    pub fn tag_delegation_available(&self) -> bool {
        self.has_wordwrap_plugin && !self.wordwrap_tag.is_empty()
    }
}

/// Result of reflowing one translation.
#[derive(Debug, Clone)]
pub struct ReflowOutcome {
    pub text: String,
    /// Wrapped line count exceeds the original line count.
    pub expanded: bool,
    /// Wrapped line count exceeds one message box even after wrapping.
    pub box_overflow: bool,
}

/// Aggregate statistics over one reflow batch.
#[derive(Debug, Default, Clone)]
pub struct ReflowStats {
    /// Entries whose translation text changed.
    pub rewrapped: usize,
    /// Entries whose line count grew past the original.
    pub expanded: usize,
    /// Total extra lines introduced across the batch.
    pub extra_lines: usize,
    /// Ids of entries still overflowing one message box.
    pub overflowing: Vec<String>,
}

/// Re-wraps translated text to fit the original display line structure.
pub struct Reflow<'a> {
    metrics: &'a WindowMetrics,
}

impl<'a> Reflow<'a> {
    #[must_use]
    pub const fn new(metrics: &'a WindowMetrics) -> Self {
        Self { metrics }
    }

    /// Reflows one translation against the original's line count.
    /// `use_tag` selects tag delegation when the engine supports it;
    /// database fields always take the manual path.
    #[must_use]
    pub fn process(
        &self,
        original: &str,
        translation: &str,
        use_tag: bool,
    ) -> ReflowOutcome {
        let original_line_count = original.split('\n').count();

        if translation.trim().is_empty() {
            return ReflowOutcome {
                text: translation.to_string(),
                expanded: false,
                box_overflow: false,
            };
        }

        if use_tag && self.metrics.tag_delegation_available() {
            return ReflowOutcome {
                text: self.tag_delegated(translation, original_line_count),
                expanded: false,
                box_overflow: false,
            };
        }

        self.manual(translation, original_line_count)
    }

    /// Tag-delegated mode: the in-game plugin handles visual wrapping, so
    /// the text only has to fit the original number of display commands.
    /// Overflow segments merge into the last slot; the plugin re-breaks
    /// them at the window width.
    fn tag_delegated(&self, text: &str, original_line_count: usize) -> String {
        let segments: Vec<&str> = text.split('\n').collect();

        let mut lines: Vec<String> = if segments.len() > original_line_count {
            let keep = original_line_count.saturating_sub(1);
            let mut kept: Vec<String> =
                segments[..keep].iter().map(ToString::to_string).collect();

            let merged = segments[keep..]
                .iter()
                .map(|segment| segment.trim())
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            kept.push(merged);
            kept
        } else {
            segments.iter().map(ToString::to_string).collect()
        };

        while lines.len() < original_line_count {
            lines.push(String::new());
        }

        let tag = &self.metrics.wordwrap_tag;

        if let Some(first) = lines.first_mut() {
            if !tag.is_empty() && !first.starts_with(tag.as_str()) {
                *first = format!("{tag}{first}");
            }
        }

        lines.join("\n")
    }

    /// Manual mode: flatten to one blob, re-wrap at word boundaries
    /// against the characters-per-line budget, pad to the original line
    /// count. Width is measured ignoring control codes.
    fn manual(&self, text: &str, original_line_count: usize) -> ReflowOutcome {
        let text = WORDWRAP_TAG_RE.replace_all(text, "");

        let flattened = text
            .split('\n')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if flattened.is_empty() {
            return ReflowOutcome {
                text: vec![""; original_line_count].join("\n"),
                expanded: false,
                box_overflow: false,
            };
        }

        let mut wrapped = self.wrap_to_lines(&flattened);

        let box_overflow = wrapped.len() > self.metrics.max_lines;
        let expanded = wrapped.len() > original_line_count;

        while wrapped.len() < original_line_count {
            wrapped.push(String::new());
        }

        ReflowOutcome {
            text: wrapped.join("\n"),
            expanded,
            box_overflow,
        }
    }

    fn wrap_to_lines(&self, text: &str) -> Vec<String> {
        let budget = self.metrics.chars_per_line;
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split(' ') {
            if word.is_empty() {
                continue;
            }

            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if visual_len(&candidate) <= budget {
                current = candidate;
            } else {
                if !current.is_empty() {
                    lines.push(current);
                }

                current = word.to_string();
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }

        if lines.is_empty() {
            lines.push(String::new());
        }

        lines
    }

    /// Reflows every translated reflow-eligible entry in place, tracking
    /// batch statistics.
    pub fn process_all(&self, entries: &mut [Entry]) -> ReflowStats {
        let mut stats = ReflowStats::default();

        for entry in entries {
            if !entry.status.is_done()
                || entry.translation.is_empty()
                || !entry.field.meta().reflow
            {
                continue;
            }

            let original_line_count = entry.original.split('\n').count();
            let outcome =
                self.process(&entry.original, &entry.translation, true);

            if outcome.text != entry.translation {
                entry.translation = outcome.text;
                stats.rewrapped += 1;
            }

            let new_line_count = entry.translation.split('\n').count();

            if new_line_count > original_line_count {
                stats.expanded += 1;
                stats.extra_lines += new_line_count - original_line_count;
            }

            if outcome.box_overflow {
                stats.overflowing.push(entry.id.clone());
            }
        }

        stats
    }
}
