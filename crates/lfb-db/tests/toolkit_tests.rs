//! Integration tests for the record query toolkit.
//!
//! These exercise the strategies together against the in-memory store:
//! soft delete, date ranges, projection, and the CRUD helpers.

use chrono::NaiveDate;
use lfb_db::query::filters::not_deleted;
use lfb_db::{
    DateRange, InMemoryStore, Lookup, Model, ModelMeta, Projection, Q, Record, RecordStore, Value,
};
use proptest::prelude::*;

struct Article;

impl Model for Article {
    fn meta() -> &'static ModelMeta {
        static META: ModelMeta = ModelMeta {
            app_label: "news",
            model_name: "article",
            table: "news_article",
            display_fields: &["title", "operator", "id"],
            rename_field: Some("title"),
            soft_deletable: true,
            timestamped: true,
        };
        &META
    }
}

fn at(y: i32, m: u32, d: u32, h: u32) -> Value {
    Value::DateTime(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
}

async fn seed(store: &InMemoryStore) {
    let objects = Article::objects(store);
    let rows = [
        ("launch", at(2020, 1, 1, 9), false),
        ("recap", at(2020, 1, 5, 23), false),
        ("draft", at(2020, 1, 6, 10), true),
        ("retro", at(2020, 1, 11, 8), false),
        ("late", at(2020, 1, 12, 1), false),
    ];
    for (title, created, deleted) in rows {
        objects
            .create(
                Record::new()
                    .with("title", title)
                    .with("created", created)
                    .with("is_deleted", deleted),
            )
            .await
            .unwrap();
    }
}

async fn titles(qs: lfb_db::QuerySet<'_, Article>) -> Vec<String> {
    qs.values_flat("title")
        .await
        .unwrap()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_filter_range_start_only_example() {
    let q = DateRange::new("created").start("2020-01-01").to_q().unwrap();
    assert_eq!(
        q.conditions(),
        vec![
            ("is_deleted".to_string(), Lookup::Exact(Value::Bool(false))),
            ("created__gte".to_string(), Lookup::Gte(Value::from("2020-01-01"))),
        ]
    );
}

#[tokio::test]
async fn test_range_closed_extends_end_by_a_day_and_a_half() {
    let store = InMemoryStore::new();
    seed(&store).await;
    // [2020-01-01, 2020-01-11T12:00] with soft-deleted rows dropped
    let qs = Article::objects(&store)
        .all()
        .range(&DateRange::new("created").start("2020-01-01T15:00:00").end("2020-01-10"))
        .unwrap();
    assert_eq!(titles(qs).await, vec!["launch", "recap", "retro"]);
}

#[tokio::test]
async fn test_range_end_only_is_strict() {
    let store = InMemoryStore::new();
    seed(&store).await;
    // created < 2020-01-06T00:00
    let qs = Article::objects(&store)
        .all()
        .range(&DateRange::new("created").end("2020-01-05"))
        .unwrap();
    assert_eq!(titles(qs).await, vec!["launch", "recap"]);
}

#[tokio::test]
async fn test_range_include_deleted() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let qs = Article::objects(&store)
        .all()
        .range(
            &DateRange::new("created")
                .start("2020-01-06")
                .include_deleted(true),
        )
        .unwrap();
    assert_eq!(titles(qs).await, vec!["draft", "retro", "late"]);
}

#[tokio::test]
async fn test_existed_fuzzy_order_and_projection() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let rows = Article::objects(&store)
        .existed()
        .fuzzy_filter("title", "re", " ")
        .order_by_field("created", -1)
        .values(&Projection::default().exclude(["modified"]))
        .await
        .unwrap();
    let got: Vec<_> = rows.iter().map(|r| r.get("title").cloned()).collect();
    assert_eq!(got, vec![Some(Value::from("retro")), Some(Value::from("recap"))]);
    assert!(rows.iter().all(|r| r.contains("created") && !r.contains("modified")));
}

#[tokio::test]
async fn test_create_if_absent_is_idempotent() {
    let store = InMemoryStore::new();
    let objects = Article::objects(&store);
    let query = Q::exact("title", "launch") & not_deleted();

    let first = objects
        .create_with_field_check(query.clone(), Record::new().with("title", "launch"))
        .await
        .unwrap();
    assert!(first.is_some());
    for _ in 0..3 {
        let again = objects
            .create_with_field_check(query.clone(), Record::new().with("title", "launch"))
            .await
            .unwrap();
        assert!(again.is_none());
    }
    assert_eq!(objects.all().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_soft_delete_frees_name_for_reuse() {
    let store = InMemoryStore::new();
    let objects = Article::objects(&store);
    let query = || Q::exact("title", "weekly") & not_deleted();

    let created = objects
        .create_with_field_check(query(), Record::new().with("title", "weekly"))
        .await
        .unwrap()
        .unwrap();
    let id = created.id().unwrap();

    let deleted = objects
        .update_by_id(id, Record::new().with("is_deleted", true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        deleted.get("title"),
        Some(&Value::String(format!("weekly_deleted_{id}")))
    );
    assert!(matches!(deleted.get("modified"), Some(Value::DateTime(_))));

    let recreated = objects
        .create_with_field_check(query(), Record::new().with("title", "weekly"))
        .await
        .unwrap();
    assert!(recreated.is_some());
    assert_eq!(objects.existed().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_by_id_nonexistent_mutates_nothing() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let before = store.filter("news_article", &Q::all()).await.unwrap();
    let out = Article::objects(&store)
        .update_by_id(404, Record::new().with("is_deleted", true))
        .await
        .unwrap();
    assert!(out.is_none());
    assert_eq!(store.filter("news_article", &Q::all()).await.unwrap(), before);
}

#[tokio::test]
async fn test_update_with_field_check_conflict() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let objects = Article::objects(&store);
    let out = objects
        .existed()
        .update_with_field_check(Q::exact("title", "recap"), 1, Record::new().with("title", "recap"))
        .await
        .unwrap();
    assert!(out.is_empty());
    let launch = objects.get_by_id(1, &Projection::only(["title"])).await.unwrap();
    assert_eq!(launch.get("title"), Some(&Value::from("launch")));
}

proptest! {
    #[test]
    fn prop_range_keeps_soft_delete_restriction(
        start in proptest::option::of(0u32..28),
        end in proptest::option::of(0u32..28),
        days in 0.0f64..5.0,
    ) {
        let date = |d: u32| format!("2021-02-{:02}", d + 1);
        let q = DateRange::new("created")
            .maybe_start(start.map(date))
            .maybe_end(end.map(date))
            .days(days)
            .to_q()
            .unwrap();
        let conditions = q.conditions();
        prop_assert_eq!(
            &conditions[0],
            &("is_deleted".to_string(), Lookup::Exact(Value::Bool(false)))
        );
        let expected = usize::from(start.is_some() || end.is_some()) + 1;
        prop_assert_eq!(conditions.len(), expected);
    }

    #[test]
    fn prop_include_deleted_drops_restriction(start in 0u32..28) {
        let q = DateRange::new("created")
            .start(format!("2021-03-{:02}", start + 1))
            .include_deleted(true)
            .to_q()
            .unwrap();
        prop_assert!(q.conditions().iter().all(|(k, _)| k != "is_deleted"));
    }
}
