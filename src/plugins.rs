//! Extraction and reinjection for `js/plugins.js` parameters.
//!
//! The plugin manifest is a JavaScript file assigning a JSON array literal
//! to `$plugins`. Parameter values conflate display text with internal
//! identifiers in the same shape, and many values are themselves
//! JSON-encoded arrays/objects as strings, nested arbitrarily deep. The
//! scanner decodes recursively and filters leaves through a display-text
//! heuristic; the injector navigates the same decode path and re-encodes
//! every level it decoded.

use crate::{
    constants::PLUGINS_FILE,
    functions::{contains_display_script, read_to_string_without_bom},
    types::{Entry, Error, Field},
};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

static PLUGINS_ARRAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)var\s+\$plugins\s*=\s*(\[.*\])\s*;?")
        .expect("valid plugins array regex")
});

// A value that is nothing but a bracketed tag: plugin markup, not text.
static TAG_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<[^>]+>$").expect("valid tag regex"));

// Asset-filename-style token: no whitespace, contains an underscore.
static ASSET_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S*_\S*$").expect("valid asset token regex"));

// Filesystem path: identifier followed by a path separator.
static FILE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][0-9A-Za-z_]*[/\\]").expect("valid file path regex")
});

/// Parses a plugin manifest by locating the array literal assigned to
/// `$plugins` and JSON-decoding it.
pub fn parse_plugins_js(content: &str, path: &Path) -> Result<Value, Error> {
    let Some(captures) = PLUGINS_ARRAY_RE.captures(content) else {
        return Err(Error::MalformedPlugins(path.to_path_buf()));
    };

    Ok(serde_json::from_str(&captures[1])?)
}

pub fn load_plugins_js(path: &Path) -> Result<Value, Error> {
    let content = read_to_string_without_bom(path)
        .map_err(|err| Error::Io(path.to_path_buf(), err))?;

    parse_plugins_js(&content, path)
}

/// Re-serializes a plugin array with the `$plugins` assignment wrapper.
pub fn render_plugins_js(plugins: &Value) -> Result<String, Error> {
    Ok(format!(
        "var $plugins =\n{};\n",
        serde_json::to_string_pretty(plugins)?
    ))
}

/// Decides whether a leaf parameter value is display text worth
/// translating. Identifiers would break the game if translated.
#[must_use]
pub fn is_display_text(value: &str) -> bool {
    let value = value.trim();

    if value.is_empty() || !contains_display_script(value) {
        return false;
    }

    !TAG_ONLY_RE.is_match(value)
        && !ASSET_TOKEN_RE.is_match(value)
        && !FILE_PATH_RE.is_match(value)
}

/// Recursively scans one parameter value, descending through JSON-encoded
/// strings. Produces path-suffixed ids: `[index]` for list positions, the
/// key name for object members.
pub fn scan_param(value: &str, id_prefix: &str, entries: &mut Vec<Entry>) {
    match serde_json::from_str::<Value>(value) {
        Ok(parsed @ (Value::Array(_) | Value::Object(_))) => {
            scan_node(&parsed, id_prefix, entries);
        }
        Ok(Value::String(nested)) => scan_param(&nested, id_prefix, entries),
        Ok(_) => {} // numbers, bools, null
        Err(_) => {
            if is_display_text(value) {
                entries.push(Entry::new(
                    id_prefix,
                    PLUGINS_FILE,
                    Field::PluginParam,
                    value,
                ));
            }
        }
    }
}

fn scan_node(node: &Value, id_prefix: &str, entries: &mut Vec<Entry>) {
    match node {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let child_id = format!("{id_prefix}/[{index}]");

                match item {
                    Value::String(text) => {
                        scan_param(text, &child_id, entries);
                    }
                    Value::Array(_) | Value::Object(_) => {
                        scan_node(item, &child_id, entries);
                    }
                    _ => {}
                }
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                let child_id = format!("{id_prefix}/{key}");

                match member {
                    Value::String(text) => {
                        scan_param(text, &child_id, entries);
                    }
                    Value::Array(_) | Value::Object(_) => {
                        scan_node(member, &child_id, entries);
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Extracts translatable parameter values from a parsed plugin manifest.
/// Disabled plugins and `---` separator rows are skipped entirely.
#[must_use]
pub fn extract_plugins(plugins: &Value) -> Vec<Entry> {
    let mut entries = Vec::new();

    let Some(plugins) = plugins.as_array() else {
        return entries;
    };

    for plugin in plugins {
        let Some(plugin) = plugin.as_object() else {
            continue;
        };

        let name =
            plugin.get("name").and_then(Value::as_str).unwrap_or_default();

        if name.is_empty() || name.starts_with("---") {
            continue;
        }

        if plugin.get("status").and_then(Value::as_bool) != Some(true) {
            continue;
        }

        let Some(parameters) =
            plugin.get("parameters").and_then(Value::as_object)
        else {
            continue;
        };

        for (key, value) in parameters {
            let Some(value) = value.as_str() else {
                continue;
            };

            if value.trim().is_empty() {
                continue;
            }

            scan_param(
                value,
                &format!("{PLUGINS_FILE}/{name}/{key}"),
                &mut entries,
            );
        }
    }

    entries
}

/// Writes one plugin translation back by its id path. Returns whether the
/// value was applied; a leaf that no longer equals the stored original is
/// left alone.
pub fn inject_plugin_param(plugins: &mut Value, entry: &Entry) -> bool {
    let mut segments = entry.id.split('/');

    if segments.next() != Some(PLUGINS_FILE) {
        warn!("malformed plugin entry id: {}", entry.id);
        return false;
    }

    let (Some(plugin_name), Some(param_key)) =
        (segments.next(), segments.next())
    else {
        warn!("malformed plugin entry id: {}", entry.id);
        return false;
    };

    let nested_path: Vec<&str> = segments.collect();

    let Some(plugins) = plugins.as_array_mut() else {
        return false;
    };

    let Some(parameters) = plugins
        .iter_mut()
        .find(|plugin| {
            plugin.get("name").and_then(Value::as_str) == Some(plugin_name)
        })
        .and_then(|plugin| plugin.get_mut("parameters"))
        .and_then(Value::as_object_mut)
    else {
        return false;
    };

    let Some(slot) = parameters.get_mut(param_key) else {
        return false;
    };

    replace_leaf(slot, &nested_path, &entry.original, &entry.translation)
}

/// Navigates a parameter value by path segments and replaces the leaf.
/// Every level that had to be JSON-decoded is re-encoded on the way out so
/// the stored string nesting is preserved exactly.
fn replace_leaf(
    slot: &mut Value,
    path: &[&str],
    original: &str,
    translation: &str,
) -> bool {
    let Value::String(raw) = slot else {
        return replace_in_node(slot, path, original, translation);
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(mut decoded @ (Value::Array(_) | Value::Object(_))) => {
            if !replace_in_node(&mut decoded, path, original, translation) {
                return false;
            }

            match serde_json::to_string(&decoded) {
                Ok(encoded) => {
                    *raw = encoded;
                    true
                }
                Err(_) => false,
            }
        }
        Ok(Value::String(nested)) => {
            // JSON-encoded string scalar; recurse and re-wrap.
            let mut inner = Value::String(nested);

            if !replace_leaf(&mut inner, path, original, translation) {
                return false;
            }

            match serde_json::to_string(&inner) {
                Ok(encoded) => {
                    *raw = encoded;
                    true
                }
                Err(_) => false,
            }
        }
        _ => {
            // Plain string leaf.
            if !path.is_empty() || raw.as_str() != original {
                return false;
            }

            *raw = translation.to_string();
            true
        }
    }
}

fn replace_in_node(
    node: &mut Value,
    path: &[&str],
    original: &str,
    translation: &str,
) -> bool {
    let Some((segment, rest)) = path.split_first() else {
        // Path exhausted at a non-leaf or undecodable position.
        if let Value::String(text) = node {
            if text == original {
                *text = translation.to_string();
                return true;
            }
        }

        return false;
    };

    let child = if let Some(index) = segment
        .strip_prefix('[')
        .and_then(|segment| segment.strip_suffix(']'))
        .and_then(|index| index.parse::<usize>().ok())
    {
        node.as_array_mut().and_then(|items| items.get_mut(index))
    } else {
        node.as_object_mut().and_then(|members| members.get_mut(*segment))
    };

    let Some(child) = child else {
        return false;
    };

    replace_leaf(child, rest, original, translation)
}
