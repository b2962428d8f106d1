//! Rendering tests against the public API.
//!
//! These exercise SQL composition only; nothing here talks to a database
//! (a `Database` value performs no I/O until a statement runs).

use pgrecord::{Database, DatabaseConfig, ModelMeta, Op, Value};

static USERS: ModelMeta = ModelMeta::new("users").fillable(&["name", "email"]);

static POSTS: ModelMeta = ModelMeta::new("posts")
    .fillable(&["title", "body"])
    .soft_deletes(true);

fn db() -> Database {
    Database::new(DatabaseConfig::new("localhost", "postgres", None, "app").unwrap())
}

#[test]
fn filtered_ordered_select() {
    let db = db();
    let qb = USERS
        .query(&db)
        .eq("email", "a@b.com")
        .order_by("id", "desc");
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE email = $1 ORDER BY id DESC"
    );
}

#[test]
fn two_and_three_argument_predicates_agree() {
    let db = db();
    let short = USERS.query(&db).eq("email", "a@b.com").to_sql().unwrap();
    let long = USERS
        .query(&db)
        .where_op("email", Op::Eq, "a@b.com")
        .to_sql()
        .unwrap();
    assert_eq!(short, long);
}

#[test]
fn soft_delete_descriptor_scopes_every_query() {
    let db = db();
    let qb = POSTS.query(&db).eq("title", "hello");
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM posts WHERE deleted_at IS NULL AND title = $1 ORDER BY id ASC"
    );
}

#[test]
fn where_null_renders_without_an_operator_token() {
    let db = db();
    let sql = USERS.query(&db).where_null("email").to_sql().unwrap();
    assert!(sql.contains("email IS NULL"));
    assert!(!sql.contains("= NULL"));
}

#[test]
fn where_in_binds_every_element() {
    let db = db();
    let (sql, params) = USERS
        .query(&db)
        .where_in("id", vec![1i64, 2, 3])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM users WHERE id IN ($1, $2, $3) ORDER BY id ASC"
    );
    assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn last_ordering_clause_wins() {
    let db = db();
    let qb = USERS
        .query(&db)
        .order_by("name", "desc")
        .order_by_asc("email");
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users ORDER BY email ASC"
    );
}

#[test]
fn invalid_direction_surfaces_as_invalid_argument() {
    let db = db();
    let err = USERS.query(&db).order_by("id", "sideways").to_sql().unwrap_err();
    assert!(err.is_invalid_argument());
}
