use murmurapp::model::{Comment, ContentReport, ReportTarget, Track, User, UserSnapshot};
use murmurapp::store::audio_store::LoadOutcome;
use murmurapp::store::backend::StorageBackend;
use murmurapp::store::fs_backend::FsBackend;
use murmurapp::store::{AudioStore, STORE_KEY};
use std::fs;
use tempfile::TempDir;

fn populate(store: &mut AudioStore<FsBackend>) {
    let ana = UserSnapshot::new("u1", "ana");
    store
        .add_track(Track::new("t1", ana.clone(), "Rain", "data:a", 12.0).with_tags(["Rain", "sleep"]))
        .unwrap();
    store
        .add_track(Track::new("t2", ana, "Waves", "data:b", 40.0).with_tags(["sleep"]))
        .unwrap();
    store.add_user(User::new("u2", "bo")).unwrap();
    store
        .add_comment(Comment::new("c1", "t1", UserSnapshot::new("u2", "bo"), "lovely"))
        .unwrap();
    store.toggle_like("t1", "u2").unwrap();
    store.toggle_like("t2", "u2").unwrap();
    store.toggle_like("t2", "u3").unwrap();
    store.toggle_bookmark("t1", "u3").unwrap();
    store.toggle_comment_like("c1", "u1").unwrap();
    store.increment_play("t1").unwrap();
    store.increment_play("t1").unwrap();
    store.follow("u2", "u1").unwrap();
    store
        .file_report(ContentReport::new("r1", ReportTarget::Comment, "c1", "u1", "spam"))
        .unwrap();
}

#[test]
fn test_save_then_load_in_fresh_instance() {
    let dir = TempDir::new().unwrap();
    let mut store = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    populate(&mut store);
    store.save().unwrap();
    let original = store.state().clone();
    drop(store);

    let mut reopened = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    assert_eq!(reopened.state(), &original);
    assert!(matches!(reopened.load(), LoadOutcome::Loaded(r) if r.is_clean()));

    assert_eq!(reopened.get_track_by_id("t2").unwrap().likes, 2);
    assert_eq!(reopened.play_count("t1"), 2);
    assert!(reopened.is_bookmarked("t1", "u3"));
    assert!(reopened.is_following("u2", "u1"));
    assert_eq!(reopened.top_tags(1)[0].tag, "sleep");
    assert_eq!(reopened.comments_for_track("t1", Some("u1")).unwrap()[0].likes, 1);
}

#[test]
fn test_every_mutation_is_already_durable() {
    let dir = TempDir::new().unwrap();
    let mut store = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    populate(&mut store);
    let expected = store.state().clone();
    drop(store);

    // No explicit save() call: write-through already persisted everything.
    let reopened = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    assert_eq!(reopened.state(), &expected);
}

#[test]
fn test_blob_lists_index_pairs() {
    let dir = TempDir::new().unwrap();
    let mut store = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    populate(&mut store);

    let raw = store.backend().read_blob(STORE_KEY).unwrap().unwrap();
    let blob: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        blob["likes"],
        serde_json::json!([
            {"key": "t1", "values": ["u2"]},
            {"key": "t2", "values": ["u2", "u3"]}
        ])
    );
    assert_eq!(blob["plays"], serde_json::json!([{"key": "t1", "count": 2}]));
}

#[test]
fn test_corrupt_file_fails_soft() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("murmur.store.v2.json"), "not json at all").unwrap();

    let mut store = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    assert!(store.get_all_tracks(None).is_empty());
    assert_eq!(store.load(), LoadOutcome::Reset);

    store
        .add_track(Track::new("t1", UserSnapshot::new("u1", "ana"), "Rain", "u", 1.0))
        .unwrap();
    let reopened = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    assert_eq!(reopened.get_all_tracks(None).len(), 1);
}

#[test]
fn test_last_writer_wins() {
    let dir = TempDir::new().unwrap();
    let mut first = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    let mut second = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));

    first
        .add_track(Track::new("a", UserSnapshot::new("u1", "ana"), "A", "u", 1.0))
        .unwrap();
    second
        .add_track(Track::new("b", UserSnapshot::new("u1", "ana"), "B", "u", 1.0))
        .unwrap();

    let reopened = AudioStore::open(FsBackend::new(dir.path().to_path_buf()));
    assert!(reopened.get_track_by_id("a").is_err());
    assert!(reopened.get_track_by_id("b").is_ok());
}
