use chrono::{Duration, TimeZone, Utc};
use matchstore::codec::{decode_document, encode_document, DecodeReport};
use matchstore::common::Value;
use matchstore::doc;
use matchstore::store::local::LocalStore;
use matchstore::store::StoreAdministration;
use matchstore::StoreConfig;
use matchstore_int_test::test_util::{
    cleanup, create_test_context, file_names, run_test, seeded_dir,
};
use std::fs;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_nested_timestamps_round_trip() {
    let started = Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap() + Duration::milliseconds(250);
    let document = doc! {
        title: "Spring Cup",
        createdAt: (Utc::now()),
        rounds: [
            { number: 1, startedAt: (started) },
            { number: 2, startedAt: null },
        ],
        settings: { deadline: { closesAt: (started + Duration::days(2)) } },
    };

    let mut report = DecodeReport::new();
    let decoded = decode_document(&encode_document(&document), &mut report).unwrap();
    assert!(report.is_clean());
    assert_eq!(decoded, document);
}

#[test]
fn test_timestamps_survive_restart_as_timestamps() {
    run_test(
        create_test_context,
        |ctx| {
            let kickoff = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
            ctx.store()
                .collection("series")
                .doc("s1")
                .set(doc! { name: "Finals", startsAt: (kickoff) })?;

            let raw = fs::read_to_string(ctx.collection_file("series"))?;
            assert!(raw.contains("\"__type\": \"Date\""));
            assert!(raw.contains("2024-06-01T12:00:00.000Z"));

            let restarted = ctx.reopen()?;
            let snapshot = restarted.store().collection("series").doc("s1").get()?;
            let data = snapshot.into_data().unwrap();
            assert_eq!(data.get("startsAt"), Some(&Value::from(kickoff)));
            assert!(data.get("startsAt").unwrap().is_timestamp());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_corrupt_collection_is_quarantined() {
    let dir = seeded_dir(&[
        ("users", "{ \"u1\": { \"username\": \"alice\" "),
        ("teams", r#"{ "t1": { "name": "Red" } }"#),
    ])
    .unwrap();

    let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats["users"], 0);
    assert_eq!(stats["teams"], 1);

    let backups = file_names(&dir.path().join("backups")).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("users-error-"));
    let copied = fs::read_to_string(dir.path().join("backups").join(&backups[0])).unwrap();
    assert_eq!(copied, "{ \"u1\": { \"username\": \"alice\" ");
}

#[test]
fn test_unparseable_timestamp_degrades_and_is_reported() {
    let dir = seeded_dir(&[(
        "sessions",
        r#"{ "s1": { "sid": "abc", "expiresAt": { "__type": "Date", "value": "not a date" } } }"#,
    )])
    .unwrap();

    let before = Utc::now();
    let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    let issues = store.validate_database();
    assert_eq!(
        issues,
        vec!["Invalid date in sessions/s1.expiresAt (unparseable value replaced with load time)"]
    );

    let document = matchstore::DocumentStore::new(store)
        .collection("sessions")
        .doc("s1")
        .get()
        .unwrap()
        .into_data()
        .unwrap();
    let substituted = document.get("expiresAt").unwrap().as_timestamp().unwrap();
    assert!(*substituted >= before - Duration::seconds(1));
    assert_eq!(document.get("sid"), Some(&Value::from("abc")));
}

#[test]
fn test_deleted_document_no_longer_reports_substituted_timestamp() {
    let dir = seeded_dir(&[(
        "sessions",
        r#"{
            "s1": { "sid": "abc", "expiresAt": { "__type": "Date", "value": "not a date" } },
            "s2": { "sid": "def", "expiresAt": { "__type": "Date", "value": "??" } }
        }"#,
    )])
    .unwrap();
    let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    let sessions = matchstore::DocumentStore::new(store.clone()).collection("sessions");

    sessions.doc("s1").delete().unwrap();
    assert!(!sessions.doc("s1").get().unwrap().exists());
    assert_eq!(
        store.validate_database(),
        vec!["Invalid date in sessions/s2.expiresAt (unparseable value replaced with load time)"]
    );

    sessions
        .doc("s2")
        .update(doc! { expiresAt: (Utc::now()) })
        .unwrap();
    assert!(store.validate_database().is_empty());
}

#[test]
fn test_corrupt_collection_without_usable_backup_directory() {
    let dir = seeded_dir(&[("users", "not json at all")]).unwrap();
    fs::write(dir.path().join("backups"), "").unwrap();

    let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    assert_eq!(store.stats().unwrap()["users"], 0);
    assert!(dir.path().join("backups").is_file());
}

#[test]
fn test_unknown_collection_files_are_loaded_lazily() {
    let dir = seeded_dir(&[("brackets", r#"{ "b1": { "round": 1 } }"#)]).unwrap();
    let store = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    let handle = matchstore::DocumentStore::new(store.clone());

    handle
        .collection("brackets")
        .doc("b2")
        .set(doc! { round: 2 })
        .unwrap();

    let restarted = LocalStore::open(&StoreConfig::with_data_dir(dir.path())).unwrap();
    assert_eq!(restarted.stats().unwrap()["brackets"], 2);
}

#[test]
fn test_no_temporary_files_after_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let teams = ctx.store().collection("teams");
            for i in 0..20 {
                teams.doc(&format!("t{}", i)).set(doc! { name: (format!("Team {}", i)) })?;
            }
            let names = file_names(ctx.path())?;
            assert!(names.iter().all(|name| !name.ends_with(".tmp")));
            assert!(names.contains(&"teams.json".to_string()));
            Ok(())
        },
        cleanup,
    )
}
