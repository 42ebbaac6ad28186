use chrono::{TimeZone, Utc};
use matchstore::common::Value;
use matchstore::doc;
use matchstore::errors::ErrorKind;
use matchstore::store::local::ExportEnvelope;
use matchstore::store::StoreAdministration;
use matchstore::RuntimeMode;
use matchstore_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, file_names, run_test,
};
use std::fs;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn production() -> matchstore::StoreResult<matchstore_int_test::test_util::TestContext> {
    create_test_context_with(|config| {
        config.set_runtime_mode(RuntimeMode::Production);
        Ok(())
    })
}

#[test]
fn test_clear_is_forbidden_in_production() {
    run_test(
        production,
        |ctx| {
            let store = ctx.store();
            store.collection("users").doc("u1").set(doc! { discordId: "1", username: "a" })?;
            store.collection("teams").doc("t1").set(doc! { name: "Red" })?;
            let users_before = fs::read(ctx.collection_file("users"))?;
            let teams_before = fs::read(ctx.collection_file("teams"))?;

            let err = store.admin()?.clear_all_data().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DestructiveOperationForbidden);

            assert_eq!(fs::read(ctx.collection_file("users"))?, users_before);
            assert_eq!(fs::read(ctx.collection_file("teams"))?, teams_before);
            assert!(file_names(&ctx.backup_dir())?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_restore_and_import_are_forbidden_in_production() {
    run_test(
        production,
        |ctx| {
            let local = ctx.local();
            let backup = local.create_full_backup()?;
            assert_eq!(
                local.restore_from_backup(&backup).unwrap_err().kind(),
                &ErrorKind::DestructiveOperationForbidden
            );

            let outside = tempfile::tempdir()?;
            let export = outside.path().join("export.json");
            local.export_data(Some(&export))?;
            assert_eq!(
                local.import_data(&export).unwrap_err().kind(),
                &ErrorKind::DestructiveOperationForbidden
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clear_takes_backup_then_empties() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.collection("teams").doc("t1").set(doc! { name: "Red" })?;
            store.collection("brackets").doc("b1").set(doc! { round: 1 })?;

            store.admin()?.clear_all_data()?;

            let stats = store.admin()?.stats()?;
            assert!(stats.values().all(|count| *count == 0), "{:?}", stats);
            assert!(stats.contains_key("brackets"));

            let backups = ctx.local().list_backups()?;
            assert_eq!(backups.len(), 1);
            let content = fs::read_to_string(&backups[0].path)?;
            assert!(content.contains("Red"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_backup_restore_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let created = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
            store.collection("tournaments").doc("t1").set(doc! {
                title: "Leap Cup",
                status: "open",
                createdAt: (created),
            })?;

            let backup = store.admin()?.create_full_backup()?;
            store.collection("tournaments").doc("t1").delete()?;
            store.collection("tournaments").doc("t2").set(doc! { title: "Other", status: "open" })?;

            store.admin()?.restore_from_backup(&backup)?;

            let t1 = store.collection("tournaments").doc("t1").get()?.into_data().unwrap();
            assert_eq!(t1.get("createdAt"), Some(&Value::from(created)));
            assert!(!store.collection("tournaments").doc("t2").get()?.exists());

            let restarted = ctx.reopen()?.store();
            assert!(restarted.collection("tournaments").doc("t1").get()?.exists());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_validate_database_reports_shape_issues() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.collection("users").doc("ok").set(doc! { discordId: "1", username: "a" })?;
            store.collection("users").doc("bad").set(doc! { username: "b" })?;
            store.collection("tournaments").doc("t1").set(doc! {
                title: "Cup",
                status: "open",
                startDate: "next week",
            })?;

            let mut issues = store.admin()?.validate_database();
            issues.sort();
            assert_eq!(
                issues,
                vec![
                    "Invalid date in tournaments/t1.startDate",
                    "Invalid user document bad: missing required fields",
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_export_import_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let joined = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
            store.collection("entries").doc("e1").set(doc! {
                tournamentId: "t1",
                discordId: "42",
                joinedAt: (joined),
            })?;
            store.collection("teams").doc("red").set(doc! { name: "Red" })?;

            let outside = tempfile::tempdir()?;
            let export = outside.path().join("league-export.json");
            ctx.local().export_data(Some(&export))?;
            let envelope: ExportEnvelope = serde_json::from_str(&fs::read_to_string(&export)?)?;
            assert_eq!(envelope.version, "1.0.0");
            assert_eq!(envelope.database, "local");
            assert!(envelope.collections.contains_key("entries"));

            store.collection("entries").doc("e1").delete()?;
            store.collection("teams").doc("blue").set(doc! { name: "Blue" })?;

            let imported = ctx.local().import_data(&export)?;
            assert!(imported.contains(&"entries".to_string()));

            let e1 = store.collection("entries").doc("e1").get()?.into_data().unwrap();
            assert_eq!(e1.get("joinedAt"), Some(&Value::from(joined)));
            assert!(!store.collection("teams").doc("blue").get()?.exists());

            let backups = file_names(&ctx.backup_dir())?;
            assert!(backups.iter().any(|name| name.starts_with("pre-import-backup-")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_import_rejects_files_without_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let outside = tempfile::tempdir()?;
            let bogus = outside.path().join("bogus.json");
            fs::write(&bogus, r#"{ "version": "1.0.0" }"#)?;
            let err = ctx.local().import_data(&bogus).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EncodingError);
            assert!(file_names(&ctx.backup_dir())?.is_empty());

            let missing = ctx.local().import_data(&outside.path().join("missing.json")).unwrap_err();
            assert_eq!(missing.kind(), &ErrorKind::FileNotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cleanup_keeps_most_recent_backups() {
    run_test(
        create_test_context,
        |ctx| {
            let local = ctx.local();
            for _ in 0..5 {
                local.create_full_backup()?;
            }
            assert_eq!(local.list_backups()?.len(), 5);

            let removed = local.cleanup_backups(2)?;
            assert_eq!(removed.len(), 3);
            let remaining = local.list_backups()?;
            assert_eq!(remaining.len(), 2);
            assert!(removed.iter().all(|path| !path.exists()));

            assert!(local.cleanup_backups(10)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
