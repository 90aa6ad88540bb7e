use std::collections::BTreeMap;
use std::io::Write;

use common::{blog_schema, setup_db};
use joinery::core::plan::Joined;
use joinery::core::sql::ColumnRef;
use joinery::prelude::*;

mod common;

fn materialize(filters: &[Filter]) -> (JoinPlan<Joined>, SelectQuery) {
    let schema = blog_schema();
    let config = PlannerConfig::default();
    let plan = build_plan(&schema, "posts", None, &[], filters, &[]).unwrap();
    let base = SelectQuery::new(config.dialect, plan.root_table());
    plan.materialize(&SqlExecutor::with_config(&schema, &config), base, &config)
        .unwrap()
}

fn aliases(plan: &JoinPlan<Joined>) -> BTreeMap<String, String> {
    plan.entries()
        .iter()
        .map(|entry| (entry.path_key.to_string(), entry.alias.to_string()))
        .collect()
}

#[test]
fn lone_relationship_filter() {
    let (plan, query) = materialize(&[Filter::new("tags", [1])]);

    let joined: Vec<_> = plan
        .entries()
        .iter()
        .filter(|entry| !entry.path_key.is_empty())
        .collect();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].path_key, "tags");
    assert_eq!(joined[0].join_type, JoinType::Left);

    // link table plus target
    assert_eq!(query.joins().len(), 2);
}

#[test]
fn nested_filters_alias_each_author_join_separately() {
    let forward = [
        Filter::new("comments.author", [1]),
        Filter::new("comments.tags", [1]),
        Filter::new("author", [1]),
    ];
    let (plan, _) = materialize(&forward);
    let expected = aliases(&plan);

    assert_eq!(expected.len(), 5);
    assert_eq!(expected["author"], "people");
    assert_eq!(expected["comments"], "comments");
    assert_eq!(expected["comments.author"], "author_comments");
    assert_eq!(expected["comments.tags"], "tags");

    let mut reversed = forward.clone();
    reversed.reverse();
    let (plan, _) = materialize(&reversed);
    assert_eq!(aliases(&plan), expected);
}

#[test]
fn materialized_query_runs_against_sqlite() {
    let conn = setup_db();
    let (plan, mut query) = materialize(&[
        Filter::new("author.name", ["Ann"]).required(),
        Filter::new("comments.author.name", ["Bo"]),
    ]);
    let id = ColumnRef::new(plan.root_alias(), "id");
    query.select(id.clone());
    query.order_by(id, Direction::Asc);
    let query = query.distinct();

    // post 3 has no author; post 1 has two comment rows
    let rows = conn.execute_select(&query).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some(&Value::from(1)));
}

#[test]
fn sourced_plan_reserves_the_root_alias() {
    let schema = blog_schema();
    let config = PlannerConfig::default();
    let plan = build_plan(&schema, "posts", Some("comments"), &["post"], &[], &[]).unwrap();
    let base = SelectQuery::new(config.dialect, plan.root_table());
    let (plan, query) = plan
        .materialize(&SqlExecutor::new(&schema), base, &config)
        .unwrap();

    assert_eq!(plan.alias_for("").unwrap(), "comments");
    assert_eq!(plan.alias_for("post").unwrap(), "post_comments");
    assert_eq!(query.joins()[0].join_type, JoinType::Inner);
    assert!(plan.alias_for("author").is_err());
}

#[test]
fn config_file_drives_alias_limits() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "dialect = \"postgresql\"").unwrap();
    writeln!(file, "max_alias_length = 8").unwrap();
    let config = PlannerConfig::load_from(file.path()).unwrap();
    assert_eq!(config.alias_length_limit(), Some(8));

    let schema = blog_schema();
    let plan = build_plan(&schema, "comments", None, &["author", "post.author"], &[], &[]).unwrap();
    let base = SelectQuery::new(config.dialect, plan.root_table());
    let (plan, _) = plan
        .materialize(&SqlExecutor::with_config(&schema, &config), base, &config)
        .unwrap();

    assert_eq!(plan.alias_for("author").unwrap(), "people");
    assert_eq!(plan.alias_for("post.author").unwrap(), "author_p");
}
