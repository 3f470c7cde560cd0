use pb_core::codec;
use pb_core::store::category::{find_existing, known_categories};
use pb_core::{
    AmbiguityPolicy, DirLocator, MatchError, NewItem, Priority, Store, StoreError,
};
use chrono::{FixedOffset, TimeZone};
use std::fs;

const STORE: &str = "pb-layout-store";

fn categories() -> Vec<String> {
    known_categories(&["bugs", "features"], "done")
}

fn sample_item(subject: &str) -> NewItem {
    NewItem {
        subject: subject.to_string(),
        body: "details\n".to_string(),
        author_name: "Ada".to_string(),
        author_email: "ada@example.com".to_string(),
        priority: Priority::High,
        revision: None,
        created_at: FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 10, 0, 0)
            .unwrap(),
    }
}

#[test]
fn locate_walks_up_to_ancestor_store() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a");
    let c = a.join("b").join("c");
    fs::create_dir_all(&c).unwrap();
    fs::create_dir(a.join(STORE)).unwrap();

    let mut locator = DirLocator::new(&c);
    assert_eq!(locator.locate(STORE, true).unwrap(), a.join(STORE));
    assert!(!c.join(STORE).exists());
}

#[test]
fn locate_creates_store_in_start_when_absent() {
    let temp = tempfile::tempdir().unwrap();
    let y = temp.path().join("x").join("y");
    fs::create_dir_all(&y).unwrap();

    let mut locator = DirLocator::new(&y);
    assert!(matches!(
        locator.locate(STORE, false),
        Err(StoreError::NotFound(_))
    ));
    let created = locator.locate(STORE, true).unwrap();
    assert_eq!(created, y.join(STORE));
    assert!(created.is_dir());
}

#[test]
fn locate_ignores_plain_files_with_the_store_name() {
    let temp = tempfile::tempdir().unwrap();
    let start = temp.path().join("work");
    fs::create_dir(&start).unwrap();
    fs::write(temp.path().join(STORE), "not a directory").unwrap();

    let mut locator = DirLocator::new(&start);
    assert!(locator.find(STORE).is_none());
}

#[test]
fn category_token_is_expanded_and_created_lowercase() {
    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());

    let path = store
        .category_dir("Bug", &categories(), AmbiguityPolicy::Fail)
        .unwrap();
    assert_eq!(path, temp.path().join("bugs"));
    assert!(path.is_dir());
}

#[test]
fn existing_case_variant_directory_is_reused() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir(temp.path().join("Features")).unwrap();
    let store = Store::at(temp.path());

    let path = store
        .category_dir("feat", &categories(), AmbiguityPolicy::Fail)
        .unwrap();
    assert_eq!(path, temp.path().join("Features"));
}

#[test]
fn ambiguous_category_fails_or_takes_first_sorted() {
    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());

    let err = store
        .category_dir("e", &categories(), AmbiguityPolicy::Fail)
        .unwrap_err();
    match err {
        StoreError::Match(MatchError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates, vec!["done", "features"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let path = store
        .category_dir("e", &categories(), AmbiguityPolicy::FirstSorted)
        .unwrap();
    assert_eq!(path, temp.path().join("done"));
}

#[test]
fn unknown_or_empty_category_is_not_found() {
    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());

    for token in ["zzz", "  "] {
        let err = store
            .category_dir(token, &categories(), AmbiguityPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, StoreError::Match(MatchError::NotFound { .. })));
    }
}

#[test]
fn file_named_like_category_is_a_collision() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("bugs"), "oops").unwrap();

    let err = find_existing(temp.path(), "bugs").unwrap_err();
    assert!(matches!(err, StoreError::NameCollision(path) if path == temp.path().join("bugs")));
}

#[cfg(target_os = "linux")]
#[test]
fn two_case_variants_are_a_duplicate_category() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir(temp.path().join("Bugs")).unwrap();
    fs::create_dir(temp.path().join("BUGS")).unwrap();

    let err = find_existing(temp.path(), "bugs").unwrap_err();
    match err {
        StoreError::DuplicateCategory { category, entries } => {
            assert_eq!(category, "bugs");
            assert_eq!(entries, vec!["BUGS", "Bugs"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    fs::create_dir(temp.path().join("bugs")).unwrap();
    assert_eq!(
        find_existing(temp.path(), "bugs").unwrap(),
        temp.path().join("bugs")
    );
}

#[test]
fn appended_item_is_listed_and_can_be_moved() {
    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());
    let bugs = store
        .category_dir("bugs", &categories(), AmbiguityPolicy::Fail)
        .unwrap();

    let encoded = codec::encode(&sample_item("Crash on start"));
    let location = store.append(&bugs, &encoded).unwrap();
    assert_eq!(location.message_id, encoded.message_id);
    assert_eq!(fs::read(&location.container).unwrap(), encoded.record);

    let containers = store.containers(None).unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].category, "bugs");
    assert_eq!(containers[0].stem(), encoded.filename);

    let done = store
        .category_dir("done", &categories(), AmbiguityPolicy::Fail)
        .unwrap();
    let moved = store.move_container(&location.container, &done).unwrap();
    assert!(moved.is_file());
    assert!(!location.container.exists());
    assert!(store.containers(Some("DONE")).unwrap().is_empty());
}

#[test]
fn move_refuses_to_overwrite() {
    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());
    let bugs = store
        .category_dir("bugs", &categories(), AmbiguityPolicy::Fail)
        .unwrap();
    let done = store
        .category_dir("done", &categories(), AmbiguityPolicy::Fail)
        .unwrap();

    let encoded = codec::encode(&sample_item("Twice"));
    let location = store.append(&bugs, &encoded).unwrap();
    store.append(&done, &encoded).unwrap();

    let err = store.move_container(&location.container, &done).unwrap_err();
    assert!(matches!(err, StoreError::NameCollision(_)));
    assert!(location.container.exists());
}

#[test]
fn concurrent_appends_keep_every_record_intact() {
    const WRITERS: usize = 6;
    const APPENDS: usize = 20;

    let temp = tempfile::tempdir().unwrap();
    let store = Store::at(temp.path());
    let bugs = store
        .category_dir("bugs", &categories(), AmbiguityPolicy::Fail)
        .unwrap();

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let (store, bugs) = (&store, &bugs);
            scope.spawn(move || {
                for n in 0..APPENDS {
                    let item = sample_item(&format!("Writer {writer} entry {n}"));
                    let encoded = pb_core::EncodedItem {
                        filename: "Shared".to_string(),
                        ..codec::encode(&item)
                    };
                    store.append(bugs, &encoded).unwrap();
                }
            });
        }
    });

    let bytes = fs::read(bugs.join("Shared.mbox")).unwrap();
    let items = codec::decode_container(&bytes).unwrap();
    assert_eq!(items.len(), WRITERS * APPENDS);
    for writer in 0..WRITERS {
        let written = items
            .iter()
            .filter(|item| item.subject.starts_with(&format!("Writer {writer} ")))
            .count();
        assert_eq!(written, APPENDS);
    }
    assert!(items.iter().all(|item| item.body == "details\n"));
}
