#![allow(dead_code)]

use joinery::prelude::*;
use rusqlite::Connection;

pub const BLOG_SCHEMA: &str = r#"
    [[resource]]
    name = "posts"
    cache_field = "updated_at"
    attributes = ["title"]

    [[resource.relationship]]
    name = "author"
    cardinality = "one"
    to = "people"

    [[resource.relationship]]
    name = "comments"
    cardinality = "many"
    to = "comments"
    foreign_key = "post_id"

    [[resource.relationship]]
    name = "recent_comments"
    cardinality = "many"
    to = "comments"
    foreign_key = "post_id"
    join = "custom"

    [[resource.relationship]]
    name = "tags"
    cardinality = "many"
    to = "tags"
    through = { table = "posts_tags", source_key = "post_id", target_key = "tag_id" }

    [[resource]]
    name = "people"
    attributes = ["name"]

    [[resource]]
    name = "comments"
    attributes = ["body"]

    [[resource.relationship]]
    name = "post"
    cardinality = "one"
    to = "posts"

    [[resource.relationship]]
    name = "author"
    cardinality = "one"
    to = "people"

    [[resource.relationship]]
    name = "tags"
    cardinality = "many"
    to = "tags"
    through = { table = "comments_tags", source_key = "comment_id", target_key = "tag_id" }

    [[resource]]
    name = "tags"
    attributes = ["name"]

    [[resource]]
    name = "pictures"
    attributes = ["caption"]

    [[resource.relationship]]
    name = "imageable"
    cardinality = "one"
    polymorphic = true
    to = ["documents", "products"]

    [[resource]]
    name = "documents"
    attributes = ["name"]

    [[resource.relationship]]
    name = "author"
    cardinality = "one"
    to = "people"

    [[resource]]
    name = "products"
    cache_field = "updated_at"
    attributes = ["name"]

    [[resource.relationship]]
    name = "author"
    cardinality = "one"
    to = "people"
"#;

pub fn blog_schema() -> Schema {
    Schema::from_toml_str(BLOG_SCHEMA).expect("blog schema is valid")
}

pub fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    conn.execute_batch(
        r#"
        CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE posts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author_id INTEGER REFERENCES people(id),
            updated_at TEXT
        );
        CREATE TABLE comments (
            id INTEGER PRIMARY KEY,
            post_id INTEGER NOT NULL REFERENCES posts(id),
            author_id INTEGER REFERENCES people(id),
            body TEXT NOT NULL
        );
        CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE posts_tags (post_id INTEGER NOT NULL, tag_id INTEGER NOT NULL);
        CREATE TABLE comments_tags (comment_id INTEGER NOT NULL, tag_id INTEGER NOT NULL);
        CREATE TABLE documents (id INTEGER PRIMARY KEY, name TEXT NOT NULL, author_id INTEGER);
        CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            author_id INTEGER,
            updated_at TEXT
        );
        CREATE TABLE pictures (
            id INTEGER PRIMARY KEY,
            caption TEXT,
            imageable_id INTEGER,
            imageable_type TEXT
        );

        INSERT INTO people VALUES (1, 'Ann'), (2, 'Bo'), (3, 'Cy');
        INSERT INTO posts VALUES
            (1, 'Hello', 1, '2024-01-01'),
            (2, 'Second', 2, '2024-02-01'),
            (3, 'Draft', NULL, NULL);
        INSERT INTO comments VALUES
            (1, 1, 2, 'nice'),
            (2, 1, 3, 'meh'),
            (3, 2, 1, 'thanks');
        INSERT INTO tags VALUES (10, 'rust'), (11, 'sql'), (12, 'unused');
        INSERT INTO posts_tags VALUES (1, 10), (1, 11), (2, 10);
        INSERT INTO comments_tags VALUES (1, 11);
        INSERT INTO documents VALUES (1, 'Manual', 1);
        INSERT INTO products VALUES (1, 'Widget', 2, '2024-03-01');
        INSERT INTO pictures VALUES
            (1, 'cover', 1, 'documents'),
            (2, 'box shot', 1, 'products'),
            (3, 'figure', 1, 'documents');
        "#,
    )
    .expect("Failed to seed blog tables");
    conn
}

pub fn identity(resource_type: &str, key: i64) -> ResourceIdentity {
    ResourceIdentity::new(resource_type, key)
}
