//! End-to-end: extract a synthetic game folder, translate, write back,
//! re-read the emitted files.

use mvmz_translator_lib::{
    read::{detect_engine, find_data_dir, game_title, ProjectReader},
    types::{EngineType, Entry, Field},
    write::ProjectWriter,
};
use serde_json::{json, Value};
use std::{fs, path::Path};
use tempfile::tempdir;

fn write_game(dir: &Path) {
    let data = dir.join("data");
    let js = dir.join("js");
    fs::create_dir_all(&data).unwrap();
    fs::create_dir_all(&js).unwrap();

    fs::write(js.join("rmmz_core.js"), "// runtime\n").unwrap();

    fs::write(
        data.join("System.json"),
        json!({"gameTitle": "ゲーム", "terms": {"basic": ["レベル"]}}).to_string(),
    )
    .unwrap();

    fs::write(
        data.join("Actors.json"),
        json!([null, {"id": 1, "name": "アリス", "nickname": "", "profile": ""}])
            .to_string(),
    )
    .unwrap();

    fs::write(
        data.join("Map001.json"),
        json!({
            "displayName": "はじまりの町",
            "events": [null, {"id": 1, "name": "Door", "pages": [{"list": [
                {"code": 101, "indent": 0, "parameters": ["Actor1", 0, 0, 2, "アリス"]},
                {"code": 401, "indent": 0, "parameters": ["こんにちは。"]},
                {"code": 401, "indent": 0, "parameters": ["よい天気ですね。"]},
                {"code": 0, "indent": 0, "parameters": []},
            ]}]}],
        })
        .to_string(),
    )
    .unwrap();

    fs::write(
        data.join("CommonEvents.json"),
        json!([null, {"id": 1, "name": "起動", "trigger": 0, "list": [
            {"code": 401, "indent": 0, "parameters": ["共通の台詞"]},
            {"code": 0, "indent": 0, "parameters": []},
        ]}])
        .to_string(),
    )
    .unwrap();

    // One malformed file: extraction must skip it, not abort.
    fs::write(data.join("Map002.json"), "{not json").unwrap();

    fs::write(
        js.join("plugins.js"),
        format!(
            "var $plugins =\n{};\n",
            json!([{"name": "Greeter", "status": true, "description": "",
                    "parameters": {"Greeting": "やあ！"}}])
        ),
    )
    .unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn translate_all(entries: &mut [Entry]) {
    for entry in entries.iter_mut() {
        let translation = match entry.original.as_str() {
            "ゲーム" => "Game",
            "レベル" => "Level",
            "アリス" => "Alice",
            "こんにちは。\nよい天気ですね。" => "Hello.\nNice weather today.",
            "共通の台詞" => "A common line",
            "はじまりの町" => "Starter Town",
            "やあ！" => "Hi!",
            other => panic!("unexpected entry text: {other}"),
        };
        entry.set_translation(translation);
    }
}

#[test]
fn full_extract_translate_write_cycle() {
    let dir = tempdir().unwrap();
    write_game(dir.path());

    assert_eq!(detect_engine(dir.path()), Some(EngineType::Mz));
    assert_eq!(game_title(dir.path()), "ゲーム");

    let mut entries = ProjectReader::new(dir.path()).read().unwrap();

    let ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
    assert!(ids.contains(&"System.json/gameTitle"));
    assert!(ids.contains(&"Actors.json/1/name"));
    assert!(ids.contains(&"Map001.json/displayName"));
    assert!(ids.contains(&"Map001.json/Ev1(Door)/p0/dialog_1"));
    assert!(ids.contains(&"Map001.json/speaker/アリス"));
    assert!(ids.contains(&"CommonEvents.json/CE1(起動)/dialog_1"));
    assert!(ids.contains(&"plugins.js/Greeter/Greeting"));

    translate_all(&mut entries);

    let report = ProjectWriter::new(dir.path()).write(&entries).unwrap();
    assert_eq!(report.skipped, 0);
    assert!(report.files_written >= 4);

    let data = dir.path().join("data");

    let system = read_json(&data.join("System.json"));
    assert_eq!(system["gameTitle"], "Game");
    assert_eq!(system["terms"]["basic"][0], "Level");

    let actors = read_json(&data.join("Actors.json"));
    assert_eq!(actors[1]["name"], "Alice");

    let map = read_json(&data.join("Map001.json"));
    assert_eq!(map["displayName"], "Starter Town");
    let commands = map["events"][1]["pages"][0]["list"].as_array().unwrap();
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[0]["parameters"][4], "Alice");
    assert_eq!(commands[1]["parameters"][0], "Hello.");
    assert_eq!(commands[2]["parameters"][0], "Nice weather today.");

    let common = read_json(&data.join("CommonEvents.json"));
    assert_eq!(common[1]["list"][0]["parameters"][0], "A common line");

    let plugins_js = fs::read_to_string(dir.path().join("js/plugins.js")).unwrap();
    assert!(plugins_js.starts_with("var $plugins ="));
    assert!(plugins_js.contains("Hi!"));
    assert!(!plugins_js.contains("やあ！"));
}

#[test]
fn first_export_backs_up_originals() {
    let dir = tempdir().unwrap();
    write_game(dir.path());

    let mut entries = ProjectReader::new(dir.path()).read().unwrap();
    translate_all(&mut entries);
    ProjectWriter::new(dir.path()).write(&entries).unwrap();

    let backup = dir.path().join("data_original");
    assert!(backup.is_dir());

    let original_system = read_json(&backup.join("System.json"));
    assert_eq!(original_system["gameTitle"], "ゲーム");

    assert!(dir.path().join("js/plugins_original.js").is_file());

    // The backup is never overwritten: a second export reads from it and
    // leaves it intact.
    ProjectWriter::new(dir.path()).write(&entries).unwrap();
    let still_original = read_json(&backup.join("System.json"));
    assert_eq!(still_original["gameTitle"], "ゲーム");
}

#[test]
fn re_export_after_translation_is_idempotent() {
    let dir = tempdir().unwrap();
    write_game(dir.path());

    let mut entries = ProjectReader::new(dir.path()).read().unwrap();
    translate_all(&mut entries);

    let first = ProjectWriter::new(dir.path()).write(&entries).unwrap();
    // Sources are re-read from the backup, so content matching still sees
    // the original Japanese on the second pass.
    let second = ProjectWriter::new(dir.path()).write(&entries).unwrap();

    assert_eq!(first.applied, second.applied);
    assert_eq!(second.skipped, 0);

    let map = read_json(&dir.path().join("data/Map001.json"));
    assert_eq!(map["events"][1]["pages"][0]["list"][1]["parameters"][0], "Hello.");
}

#[test]
fn re_extraction_from_backup_stays_deterministic() {
    let dir = tempdir().unwrap();
    write_game(dir.path());

    let first = ProjectReader::new(dir.path()).read().unwrap();
    let second = ProjectReader::new(dir.path()).read().unwrap();

    assert_eq!(first.len(), second.len());

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.original, b.original);
    }
}

#[test]
fn missing_data_dir_is_fatal() {
    let dir = tempdir().unwrap();

    assert!(find_data_dir(dir.path()).is_none());
    assert!(ProjectReader::new(dir.path()).read().is_err());
    assert!(ProjectWriter::new(dir.path()).write(&[]).is_err());
}

#[test]
fn www_layout_is_recognized() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("www");
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(
        root.join("data/System.json"),
        json!({"gameTitle": "ゲーム"}).to_string(),
    )
    .unwrap();

    assert!(find_data_dir(dir.path()).is_some());
    assert_eq!(game_title(dir.path()), "ゲーム");
}

#[test]
fn stale_entries_are_counted_not_fatal() {
    let dir = tempdir().unwrap();
    write_game(dir.path());

    let mut stale = Entry::new(
        "Map001.json/Ev9(Gone)/p0/dialog_9",
        "Map001.json",
        Field::Dialog,
        "存在しない台詞",
    );
    stale.set_translation("Never lands");

    let report = ProjectWriter::new(dir.path()).write(&[stale]).unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 1);
}
