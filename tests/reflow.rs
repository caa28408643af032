use mvmz_translator_lib::{
    protect::visual_len,
    reflow::{Reflow, WindowMetrics},
    types::{Entry, Field},
};
use serde_json::json;

fn manual_metrics(chars_per_line: usize, max_lines: usize) -> WindowMetrics {
    WindowMetrics {
        chars_per_line,
        max_lines,
        ..WindowMetrics::default()
    }
}

fn tag_metrics() -> WindowMetrics {
    WindowMetrics {
        has_wordwrap_plugin: true,
        wordwrap_tag: "<WordWrap>".to_string(),
        ..WindowMetrics::default()
    }
}

#[test]
fn detects_defaults_without_plugins() {
    let metrics = WindowMetrics::detect(None, None);

    assert_eq!(metrics.message_width, 816);
    assert_eq!(metrics.font_size, 28);
    assert_eq!(metrics.max_lines, 4);
    assert!(!metrics.has_wordwrap_plugin);
    // (816 - 48) / (28 * 0.55) = 49 chars.
    assert_eq!(metrics.chars_per_line, 49);
}

#[test]
fn detects_message_plugin_overrides() {
    let plugins = json!([
        {"name": "YEP_MessageCore", "status": true, "parameters": {
            "Default Width": "1000",
            "Message Rows": "6",
            "Word Wrapping": "true",
        }},
    ]);
    let system = json!({"advanced": {"fontSize": 20}});

    let metrics = WindowMetrics::detect(Some(&plugins), Some(&system));

    assert_eq!(metrics.message_width, 1000);
    assert_eq!(metrics.max_lines, 6);
    assert_eq!(metrics.font_size, 20);
    assert!(metrics.has_wordwrap_plugin);
    assert_eq!(metrics.wordwrap_tag, "<WordWrap>");
    assert_eq!(metrics.detected_plugins, ["YEP_MessageCore"]);
}

#[test]
fn disabled_plugins_do_not_change_metrics() {
    let plugins = json!([
        {"name": "YEP_MessageCore", "status": false, "parameters": {
            "Default Width": "1000",
        }},
    ]);

    let metrics = WindowMetrics::detect(Some(&plugins), None);

    assert_eq!(metrics.message_width, 816);
    assert!(!metrics.has_wordwrap_plugin);
}

#[test]
fn tag_mode_merges_overflow_into_last_segment() {
    let metrics = tag_metrics();
    let reflow = Reflow::new(&metrics);

    // Translation has 4 segments for a 2-command block.
    let outcome =
        reflow.process("一行目\n二行目", "One\nTwo\nThree\nFour", true);

    let lines: Vec<&str> = outcome.text.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "<WordWrap>One");
    assert_eq!(lines[1], "Two Three Four");
}

#[test]
fn tag_mode_pads_missing_segments() {
    let metrics = tag_metrics();
    let reflow = Reflow::new(&metrics);

    let outcome = reflow.process("一行目\n二行目\n三行目", "Short", true);

    let lines: Vec<&str> = outcome.text.split('\n').collect();
    assert_eq!(lines, ["<WordWrap>Short", "", ""]);
}

#[test]
fn tag_is_not_duplicated() {
    let metrics = tag_metrics();
    let reflow = Reflow::new(&metrics);

    let outcome = reflow.process("一行目", "<WordWrap>Kept", true);
    assert_eq!(outcome.text, "<WordWrap>Kept");
}

#[test]
fn manual_mode_wraps_to_budget_and_flags_growth() {
    let metrics = manual_metrics(40, 4);
    let reflow = Reflow::new(&metrics);

    // 120 visual characters against a 40-chars-per-line budget and an
    // original of 2 lines.
    let word = "abcdefghi"; // 9 chars
    let translation = vec![word; 12].join(" ");
    assert_eq!(translation.len(), 119);

    let outcome = reflow.process("一行目\n二行目", &translation, false);

    let lines: Vec<&str> = outcome.text.split('\n').collect();
    assert!(lines.len() >= 3);
    assert!(outcome.expanded);
    // Three or four wrapped lines still fit one 4-line message box.
    assert!(!outcome.box_overflow);

    for line in lines {
        assert!(visual_len(line) <= 40, "line too long: {line}");
    }
}

#[test]
fn manual_mode_ignores_control_codes_when_measuring() {
    let metrics = manual_metrics(10, 4);
    let reflow = Reflow::new(&metrics);

    // 8 visual chars + a long code still fit the 10-char budget.
    let outcome = reflow.process("一行目", r"\C[2]only one\C[0]", false);

    assert_eq!(outcome.text.split('\n').count(), 1);
}

#[test]
fn manual_mode_flags_box_overflow() {
    let metrics = manual_metrics(10, 2);
    let reflow = Reflow::new(&metrics);

    let outcome =
        reflow.process("一行目", "words that will never fit two lines", false);

    assert!(outcome.box_overflow);
}

#[test]
fn manual_mode_strips_leftover_wordwrap_tags() {
    let metrics = manual_metrics(40, 4);
    let reflow = Reflow::new(&metrics);

    let outcome = reflow.process("一行目", "<WordWrap>Hello there", false);
    assert_eq!(outcome.text, "Hello there");
}

#[test]
fn process_all_tracks_batch_stats() {
    let metrics = manual_metrics(10, 2);
    let reflow = Reflow::new(&metrics);

    let mut grows = Entry::new("grow", "Map001.json", Field::Dialog, "一行目");
    grows.set_translation("eight ch plus more text here");

    let mut fits = Entry::new("fit", "Map001.json", Field::Dialog, "一行目");
    fits.set_translation("short");

    let mut ignored =
        Entry::new("name", "Actors.json", Field::Name, "アリス");
    ignored.set_translation("A very long translated name kept intact");

    let untouched = Entry::new("raw", "Map001.json", Field::Dialog, "二行目");

    let mut entries = [grows, fits, ignored, untouched];
    let stats = reflow.process_all(&mut entries);

    assert_eq!(stats.rewrapped, 1);
    assert_eq!(stats.expanded, 1);
    assert!(stats.extra_lines >= 1);
    assert_eq!(stats.overflowing, ["grow"]);

    // Non-reflow fields and untranslated entries stay byte-identical.
    assert_eq!(
        entries[2].translation,
        "A very long translated name kept intact"
    );
    assert_eq!(entries[3].translation, "");
}
