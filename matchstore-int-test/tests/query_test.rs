use chrono::{Duration, TimeZone, Utc};
use matchstore::common::{Document, SortOrder, Value};
use matchstore::doc;
use matchstore::query::{field, FieldFilter, Operator};
use matchstore::store::DocumentStore;
use matchstore_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn players() -> Vec<(&'static str, Document)> {
    vec![
        ("p1", doc! { name: "Ann", rank: 3, roles: ["tank", "support"], region: "eu" }),
        ("p2", doc! { name: "Bob", rank: 7, roles: ["dps"], region: "na" }),
        ("p3", doc! { name: "Cid", rank: 5, roles: ["support"] }),
        ("p4", doc! { name: "Dee", rank: 1.5, roles: [], region: "eu" }),
        ("p5", doc! { name: "Eve", region: "apac" }),
    ]
}

fn seed(store: &DocumentStore) -> matchstore::StoreResult<()> {
    let mut batch = store.batch();
    for (id, data) in players() {
        batch.set(&store.collection("players").doc(id), data);
    }
    batch.commit()
}

#[test]
fn test_each_operator_returns_exact_subset() {
    run_test(
        create_test_context,
        |ctx: TestContext| {
            let store = ctx.store();
            seed(&store)?;

            let cases: Vec<(FieldFilter, Vec<&str>)> = vec![
                (field("region").eq("eu"), vec!["p1", "p4"]),
                (field("region").ne("eu"), vec!["p2", "p5"]),
                (field("rank").gt(3), vec!["p2", "p3"]),
                (field("rank").gte(3), vec!["p1", "p2", "p3"]),
                (field("rank").lt(3), vec!["p4"]),
                (field("rank").lte(3), vec!["p1", "p4"]),
                (field("roles").array_contains("support"), vec!["p1", "p3"]),
                (field("region").is_in(vec!["na", "apac"]), vec!["p2", "p5"]),
                (
                    field("roles").array_contains_any(vec!["dps", "tank"]),
                    vec!["p1", "p2"],
                ),
            ];

            for (filter, expected) in cases {
                let description = format!("{} {}", filter.field(), filter.operator());
                let mut ids: Vec<String> = store
                    .collection("players")
                    .with(filter)
                    .get()?
                    .ids()
                    .into_iter()
                    .map(String::from)
                    .collect();
                ids.sort();
                assert_eq!(ids, expected, "{}", description);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_filters_combine_with_and() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;
            let snapshot = store
                .collection("players")
                .filter("region", Operator::Equal, "eu")
                .filter("rank", Operator::GreaterThan, 2)
                .get()?;
            assert_eq!(snapshot.ids(), vec!["p1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_query_plus_sort_scenario() {
    run_test(
        create_test_context,
        |ctx| {
            let scores = ctx.store().collection("scores");
            scores.add(doc! { score: 1 })?;
            scores.add(doc! { score: 5 })?;
            scores.add(doc! { score: 3 })?;

            let snapshot = scores
                .filter("score", Operator::GreaterThan, 1)
                .order_by("score", SortOrder::Descending)
                .get()?;
            let values: Vec<Value> = snapshot
                .docs()
                .iter()
                .filter_map(|d| d.data().and_then(|data| data.get("score")).cloned())
                .collect();
            assert_eq!(values, vec![Value::from(5), Value::from(3)]);
            assert_eq!(snapshot.size(), 2);
            assert!(!snapshot.empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_descending_reverses_ascending() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let matches = store.collection("matchResults");
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            for (id, points, offset) in [("m1", 4, 3), ("m2", 9, 1), ("m3", 2, 2), ("m4", 7, 0)] {
                matches.doc(id).set(doc! {
                    points: points,
                    playedAt: (base + Duration::hours(offset)),
                })?;
            }

            for sort_field in ["points", "playedAt"] {
                let ascending = matches.order_by(sort_field, SortOrder::Ascending).get()?;
                let descending = matches.order_by(sort_field, SortOrder::Descending).get()?;
                let mut reversed = descending.ids();
                reversed.reverse();
                assert_eq!(ascending.ids(), reversed, "{}", sort_field);
            }

            let by_time = matches.order_by("playedAt", SortOrder::Ascending).get()?;
            assert_eq!(by_time.ids(), vec!["m4", "m2", "m3", "m1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_temporal_range_filter_after_restart() {
    run_test(
        create_test_context,
        |ctx| {
            let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
            let tournaments = ctx.store().collection("tournaments");
            tournaments.doc("old").set(doc! {
                title: "Winter",
                status: "closed",
                startDate: (cutoff - Duration::days(30)),
            })?;
            tournaments.doc("new").set(doc! {
                title: "Summer",
                status: "open",
                startDate: (cutoff + Duration::days(30)),
            })?;

            let restarted = ctx.reopen()?;
            let upcoming = restarted
                .store()
                .collection("tournaments")
                .with(field("startDate").gt(cutoff))
                .get()?;
            assert_eq!(upcoming.ids(), vec!["new"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_partially_built_query_is_reusable() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;
            let europeans = store.collection("players").with(field("region").eq("eu"));
            let strong = europeans.with(field("rank").gte(3));
            let weak = europeans.with(field("rank").lt(3));

            assert_eq!(europeans.get()?.size(), 2);
            assert_eq!(strong.get()?.ids(), vec!["p1"]);
            assert_eq!(weak.get()?.ids(), vec!["p4"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_full_scan_and_empty_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            seed(&store)?;
            assert_eq!(store.collection("players").get()?.size(), 5);

            let nothing = store.collection("settings").get()?;
            assert!(nothing.empty());
            assert_eq!(nothing.size(), 0);
            Ok(())
        },
        cleanup,
    )
}
