use criterion::{Criterion, criterion_group, criterion_main};
use joinery::prelude::*;
use rusqlite::Connection;
use std::hint::black_box;

fn schema() -> Schema {
    Schema::builder()
        .resource(
            ResourceDef::new("posts")
                .cache_field("updated_at")
                .attributes(["title"])
                .relationship(Relationship::to_one("author", "people"))
                .relationship(Relationship::to_many("comments", "comments", "post_id"))
                .relationship(Relationship::many_to_many(
                    "tags",
                    "tags",
                    JoinTable::new("posts_tags", "post_id", "tag_id"),
                )),
        )
        .resource(ResourceDef::new("people").attributes(["name"]))
        .resource(
            ResourceDef::new("comments")
                .attributes(["body"])
                .relationship(Relationship::to_one("author", "people"))
                .relationship(Relationship::to_one("post", "posts")),
        )
        .resource(ResourceDef::new("tags").attributes(["name"]))
        .build()
        .unwrap()
}

const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER, updated_at TEXT);
    CREATE TABLE comments (id INTEGER PRIMARY KEY, post_id INTEGER, author_id INTEGER, body TEXT);
    CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE posts_tags (post_id INTEGER, tag_id INTEGER);
"#;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(CREATE_TABLES_SQL).unwrap();
    for i in 0..100 {
        conn.execute(
            "INSERT INTO people (id, name) VALUES (?1, ?2)",
            rusqlite::params![i, format!("Person {i}")],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (id, title, author_id, updated_at) VALUES (?1, ?2, ?3, '2024-01-01')",
            rusqlite::params![i, format!("Post {i}"), i % 10],
        )
        .unwrap();
        for c in 0..5 {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, body) VALUES (?1, ?2, 'body')",
                rusqlite::params![i, (i + c) % 100],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO posts_tags (post_id, tag_id) VALUES (?1, ?2)",
            rusqlite::params![i, i % 7],
        )
        .unwrap();
    }
    conn
}

fn plan(c: &mut Criterion) {
    let schema = schema();
    let config = PlannerConfig::default();
    let filters = [
        Filter::new("comments.author.name", ["Person 1"]),
        Filter::new("comments.post.tags", [1]),
        Filter::new("author", [1]).required(),
    ];
    let sorts = [SortCriterion::desc("author.name")];

    let mut group = c.benchmark_group("plan");
    group.bench_function("build", |b| {
        b.iter(|| {
            black_box(build_plan(&schema, "posts", None, &["tags"], &filters, &sorts).unwrap());
        })
    });
    group.bench_function("build_and_materialize", |b| {
        let executor = SqlExecutor::new(&schema);
        b.iter(|| {
            let plan = build_plan(&schema, "posts", None, &["tags"], &filters, &sorts).unwrap();
            let base = SelectQuery::new(config.dialect, plan.root_table());
            let (plan, query) = plan.materialize(&executor, base, &config).unwrap();
            black_box((plan, query.build()));
        })
    });
    group.finish();
}

fn resolve(c: &mut Criterion) {
    let schema = schema();
    let conn = setup_db();
    let config = PlannerConfig::default();

    let mut group = c.benchmark_group("resolve");
    group.bench_function("linkage", |b| {
        let request = FragmentRequest::new("posts")
            .linkage("author")
            .linkage("tags")
            .cache(true);
        b.iter(|| black_box(resolve_fragments(&schema, &conn, &request, &config).unwrap()))
    });
    group.bench_function("to_many_source", |b| {
        let request = FragmentRequest::new("posts")
            .source_relationship("comments")
            .source_keys(0..50i64)
            .linkage("author");
        b.iter(|| black_box(resolve_fragments(&schema, &conn, &request, &config).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, plan, resolve);
criterion_main!(benches);
