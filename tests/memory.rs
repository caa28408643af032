use mvmz_translator_lib::{
    memory::{import_from_game_folder, import_translations},
    project::Project,
    types::{Entry, Field, Status},
};

fn entry(id: &str, original: &str) -> Entry {
    Entry::new(id, "Map001.json", Field::Dialog, original)
}

fn done(id: &str, original: &str, translation: &str, status: Status) -> Entry {
    let mut entry = entry(id, original);
    entry.set_translation(translation);

    if status == Status::Reviewed {
        entry.review();
    }

    entry
}

#[test]
fn imports_by_id_with_status_copy() {
    let mut old = Project::default();
    old.entries.push(done(
        "Map001.json/Ev3(Bob)/p0/dialog_1",
        "こんにちは",
        "Hello",
        Status::Reviewed,
    ));

    let mut current = Project::default();
    current
        .entries
        .push(entry("Map001.json/Ev3(Bob)/p0/dialog_1", "こんにちは"));

    let stats = import_translations(&mut current, &old);

    assert_eq!(stats.by_id, 1);
    assert_eq!(stats.by_text, 0);
    assert_eq!(stats.new, 0);

    let imported = &current.entries[0];
    assert_eq!(imported.translation, "Hello");
    assert_eq!(imported.status, Status::Reviewed);
}

#[test]
fn id_match_requires_identical_original() {
    let mut old = Project::default();
    old.entries.push(done("shared_id", "昔の台詞", "Old line", Status::Translated));

    let mut current = Project::default();
    current.entries.push(entry("shared_id", "新しい台詞"));

    let stats = import_translations(&mut current, &old);

    // Id was reused for different content: no blind copy.
    assert_eq!(stats.by_id, 0);
    assert_eq!(stats.new, 1);
    assert_eq!(current.entries[0].status, Status::Untranslated);
}

#[test]
fn falls_back_to_text_match_first_wins() {
    let mut old = Project::default();
    old.entries.push(done("old_a", "ありがとう", "Thanks", Status::Translated));
    old.entries.push(done("old_b", "ありがとう", "Thank you", Status::Translated));

    let mut current = Project::default();
    current.entries.push(entry("new_id", "ありがとう"));

    let stats = import_translations(&mut current, &old);

    assert_eq!(stats.by_text, 1);
    assert_eq!(current.entries[0].translation, "Thanks");
}

#[test]
fn translated_entries_are_left_alone() {
    let mut old = Project::default();
    old.entries.push(done("id", "はい", "Old yes", Status::Translated));

    let mut current = Project::default();
    current.entries.push(done("id", "はい", "Yes", Status::Translated));

    let stats = import_translations(&mut current, &old);

    assert_eq!(stats.skipped, 1);
    assert_eq!(current.entries[0].translation, "Yes");
}

#[test]
fn donor_import_matches_by_id_only() {
    let donor = vec![
        entry("dialog_1", "Hello translated"),
        entry("dialog_2", "同一テキスト"),
    ];

    let mut current = Project::default();
    current.entries.push(entry("dialog_1", "こんにちは"));
    current.entries.push(entry("dialog_2", "同一テキスト"));
    current.entries.push(entry("dialog_3", "донорに無い"));

    let stats = import_from_game_folder(&mut current, &donor, false);

    assert_eq!(stats.imported, 1);
    assert_eq!(stats.identical, 1);
    assert_eq!(stats.new, 1);

    assert_eq!(current.entries[0].translation, "Hello translated");
    assert_eq!(current.entries[0].status, Status::Translated);
    assert_eq!(current.entries[1].status, Status::Untranslated);
}

#[test]
fn donor_swap_mode_demotes_current_original() {
    let donor = vec![entry("dialog_1", "こんにちは")];

    // The opened project is the translated copy; the donor holds the
    // authoritative Japanese original.
    let mut current = Project::default();
    current.entries.push(entry("dialog_1", "Hello"));

    let stats = import_from_game_folder(&mut current, &donor, true);

    assert_eq!(stats.imported, 1);
    assert_eq!(current.entries[0].original, "こんにちは");
    assert_eq!(current.entries[0].translation, "Hello");
}
