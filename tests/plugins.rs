use mvmz_translator_lib::{
    plugins::{
        extract_plugins, inject_plugin_param, is_display_text,
        parse_plugins_js, render_plugins_js, scan_param,
    },
    types::{Entry, Field},
};
use serde_json::json;
use std::path::Path;

fn manifest() -> serde_json::Value {
    json!([
        {"name": "MessageSkip", "status": true, "description": "", "parameters": {
            "Skip Text": "スキップ中…",
            "Asset": "立ち絵_通常",
            "Nested": "[\"立ち絵_通常\", \"こんにちは\"]",
        }},
        {"name": "DisabledOne", "status": false, "parameters": {"text": "無効なプラグイン"}},
        {"name": "---セパレータ---", "status": true, "parameters": {}},
    ])
}

#[test]
fn parses_and_renders_the_assignment_wrapper() {
    let content = "var $plugins =\n[{\"name\":\"A\",\"status\":true,\"parameters\":{}}];\n";
    let plugins = parse_plugins_js(content, Path::new("plugins.js")).unwrap();

    assert_eq!(plugins[0]["name"], "A");

    let rendered = render_plugins_js(&plugins).unwrap();
    assert!(rendered.starts_with("var $plugins =\n["));
    assert!(rendered.trim_end().ends_with("];"));

    // The wrapper survives a parse → render → parse cycle.
    let reparsed = parse_plugins_js(&rendered, Path::new("plugins.js")).unwrap();
    assert_eq!(reparsed, plugins);
}

#[test]
fn rejects_files_without_the_array_literal() {
    assert!(parse_plugins_js("console.log('nope');", Path::new("p.js")).is_err());
}

#[test]
fn display_text_filter() {
    assert!(is_display_text("こんにちは"));
    assert!(is_display_text("こんにちは 世界"));
    // Bracket-tag-only values are plugin markup.
    assert!(!is_display_text("<選択肢ヘルプ>"));
    // Underscore token without spaces looks like an asset filename.
    assert!(!is_display_text("立ち絵_通常"));
    // Identifier-rooted paths are file references.
    assert!(!is_display_text("img/pictures/立ち絵"));
    // Latin-only text is not source-script.
    assert!(!is_display_text("plain text"));
    assert!(!is_display_text("  "));
}

#[test]
fn json_encoded_array_yields_one_entry_at_index_path() {
    let mut entries = Vec::new();
    scan_param(
        "[\"立ち絵_通常\", \"こんにちは\"]",
        "plugins.js/Picture/List",
        &mut entries,
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "plugins.js/Picture/List/[1]");
    assert_eq!(entries[0].original, "こんにちは");
    assert_eq!(entries[0].field, Field::PluginParam);
}

#[test]
fn doubly_encoded_structures_are_scanned() {
    // A JSON object whose value is itself a JSON-encoded object string.
    let value = json!({"inner": "{\"label\": \"メニュー画面\"}"}).to_string();

    let mut entries = Vec::new();
    scan_param(&value, "plugins.js/Menu/Config", &mut entries);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "plugins.js/Menu/Config/inner/label");
    assert_eq!(entries[0].original, "メニュー画面");
}

#[test]
fn disabled_plugins_and_separators_are_skipped() {
    let entries = extract_plugins(&manifest());

    let ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "plugins.js/MessageSkip/Skip Text",
            "plugins.js/MessageSkip/Nested/[1]",
        ]
    );
}

#[test]
fn injects_plain_and_nested_parameters() {
    let mut plugins = manifest();
    let entries = extract_plugins(&plugins);

    let mut plain = entries[0].clone();
    plain.set_translation("Skipping...");
    let mut nested = entries[1].clone();
    nested.set_translation("Hello");

    assert!(inject_plugin_param(&mut plugins, &plain));
    assert!(inject_plugin_param(&mut plugins, &nested));

    let parameters = &plugins[0]["parameters"];
    assert_eq!(parameters["Skip Text"], "Skipping...");
    // The nested level is re-encoded as a JSON string, untouched slots kept.
    assert_eq!(parameters["Nested"], "[\"立ち絵_通常\",\"Hello\"]");
}

#[test]
fn injection_guards_against_drift() {
    let mut plugins = manifest();

    // The stored original no longer matches what the manifest holds.
    let mut drifted = Entry::new(
        "plugins.js/MessageSkip/Skip Text",
        "plugins.js",
        Field::PluginParam,
        "別のテキスト",
    );
    drifted.set_translation("Other");

    assert!(!inject_plugin_param(&mut plugins, &drifted));
    assert_eq!(plugins[0]["parameters"]["Skip Text"], "スキップ中…");

    // Unknown plugin or parameter: silent skip.
    let mut missing = Entry::new(
        "plugins.js/NoSuchPlugin/Key",
        "plugins.js",
        Field::PluginParam,
        "テキスト",
    );
    missing.set_translation("Text");
    assert!(!inject_plugin_param(&mut plugins, &missing));
}

#[test]
fn double_application_is_a_no_op() {
    let mut plugins = manifest();
    let entries = extract_plugins(&plugins);

    let mut entry = entries[1].clone();
    entry.set_translation("Hello");

    assert!(inject_plugin_param(&mut plugins, &entry));
    // Second pass: the leaf now holds the translation, not the original.
    assert!(!inject_plugin_param(&mut plugins, &entry));
    assert_eq!(
        plugins[0]["parameters"]["Nested"],
        "[\"立ち絵_通常\",\"Hello\"]"
    );
}
