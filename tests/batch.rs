use mvmz_translator_lib::{
    batch::{BatchRunner, Translate, TranslateOptions, TranslateRequest},
    types::{Entry, Field, Status, TranslateError},
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

struct FakeTranslator {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeTranslator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Translate for FakeTranslator {
    fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.text.to_string());

        if request.text.contains("失敗") {
            return Err(TranslateError::Transport("connection refused".into()));
        }

        Ok(format!("EN:{}", request.text))
    }
}

fn pending(id: &str, original: &str) -> Entry {
    Entry::new(id, "Map001.json", Field::Dialog, original)
}

#[test]
fn translates_pending_entries_and_reports() {
    let mut entries = vec![
        pending("a", "こんにちは"),
        pending("b", "さようなら"),
        pending("c", "失敗する行"),
        pending("d", "   "),
    ];

    let mut reviewed = pending("e", "既読");
    reviewed.set_translation("Done");
    entries.push(reviewed);

    let translator = FakeTranslator::new();
    let cancel = AtomicBool::new(false);

    let report = BatchRunner::new(2).run(
        &mut entries,
        &translator,
        &TranslateOptions::default(),
        &cancel,
        |_| {},
    );

    assert_eq!(report.translated, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 2);
    assert!(!report.cancelled);

    assert_eq!(entries[0].translation, "EN:こんにちは");
    assert_eq!(entries[0].status, Status::Translated);
    assert_eq!(entries[1].translation, "EN:さようなら");

    // The failed entry stays untranslated and can be retried.
    assert_eq!(entries[2].status, Status::Untranslated);
    assert_eq!(entries[2].translation, "");

    // Whitespace-only originals are marked skipped during the run.
    assert_eq!(entries[3].status, Status::Skipped);

    assert_eq!(translator.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn every_pending_entry_is_requested_exactly_once() {
    let mut entries: Vec<Entry> = (0..17)
        .map(|index| pending(&format!("e{index}"), &format!("台詞{index}")))
        .collect();

    let translator = FakeTranslator::new();
    let cancel = AtomicBool::new(false);

    let report = BatchRunner::new(4).run(
        &mut entries,
        &translator,
        &TranslateOptions::default(),
        &cancel,
        |_| {},
    );

    assert_eq!(report.translated, 17);

    let mut seen = translator.seen.into_inner().unwrap();
    seen.sort();
    let mut expected: Vec<String> =
        (0..17).map(|index| format!("台詞{index}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn checkpoint_fires_every_interval() {
    let mut entries: Vec<Entry> = (0..10)
        .map(|index| pending(&format!("e{index}"), &format!("台詞{index}")))
        .collect();

    let translator = FakeTranslator::new();
    let cancel = AtomicBool::new(false);
    let mut checkpoints = 0usize;

    BatchRunner::new(2).checkpoint_interval(4).run(
        &mut entries,
        &translator,
        &TranslateOptions::default(),
        &cancel,
        |snapshot| {
            checkpoints += 1;
            // The snapshot reflects completed work so far.
            assert!(snapshot
                .iter()
                .filter(|entry| entry.status.is_done())
                .count() >= 4);
        },
    );

    assert_eq!(checkpoints, 2);
}

#[test]
fn cancellation_is_cooperative() {
    let mut entries: Vec<Entry> = (0..50)
        .map(|index| pending(&format!("e{index}"), &format!("台詞{index}")))
        .collect();

    let translator = FakeTranslator::new();
    // Already cancelled before the run: workers stop between entries.
    let cancel = AtomicBool::new(true);

    let report = BatchRunner::new(2).run(
        &mut entries,
        &translator,
        &TranslateOptions::default(),
        &cancel,
        |_| {},
    );

    assert!(report.cancelled);
    assert_eq!(report.translated, 0);
    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_batch_returns_immediately() {
    let mut entries: Vec<Entry> = Vec::new();

    let translator = FakeTranslator::new();
    let cancel = AtomicBool::new(false);

    let report = BatchRunner::new(3).run(
        &mut entries,
        &translator,
        &TranslateOptions::default(),
        &cancel,
        |_| {},
    );

    assert_eq!(report, Default::default());
}
