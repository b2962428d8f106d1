//! Lifecycle behavior that is decidable without a live database.

use pgrecord::{Database, DatabaseConfig, ModelMeta, Value};

static USERS: ModelMeta = ModelMeta::new("users").fillable(&["name", "email"]);

static POSTS: ModelMeta = ModelMeta::new("posts")
    .fillable(&["title"])
    .soft_deletes(true);

fn db() -> Database {
    Database::new(DatabaseConfig::new("localhost", "postgres", None, "app").unwrap())
}

#[test]
fn attribute_round_trip_through_json() {
    let user = USERS.new_instance(&[("id", 1i64.into()), ("name", "A".into())]);
    let parsed: serde_json::Value = serde_json::from_str(&user.to_json()).unwrap();
    assert_eq!(parsed["id"], 1);
    assert_eq!(parsed["name"], "A");
}

#[test]
fn identity_is_key_plus_table() {
    let a = USERS.new_instance(&[("id", 1i64.into()), ("name", "A".into())]);
    let b = USERS.new_instance(&[("id", 1i64.into()), ("name", "renamed".into())]);
    let c = POSTS.new_instance(&[("id", 1i64.into())]);
    assert!(a.is(&b));
    assert!(a.is_not(&c));
}

#[test]
fn key_ignores_explicit_null() {
    let user = USERS.new_instance(&[("id", Value::Null)]);
    assert!(user.key().is_none());

    let user = USERS.new_instance(&[("id", 9i64.into())]);
    assert_eq!(user.key(), Some(&Value::Int(9)));
}

#[tokio::test]
async fn restore_rejects_hard_delete_descriptors() {
    let db = db();
    let mut user = USERS.new_instance(&[("id", 1i64.into())]);
    let err = user.restore(&db).await.unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn row_operations_reject_unsaved_instances() {
    let db = db();
    let mut user = USERS.new_instance(&[("name", "A".into())]);
    assert!(user.touch(&db).await.unwrap_err().is_invalid_argument());
    assert!(user.delete(&db).await.unwrap_err().is_invalid_argument());
    assert!(user.refresh(&db).await.unwrap_err().is_invalid_argument());
}

#[tokio::test]
async fn destroy_with_no_ids_is_a_no_op() {
    let db = db();
    let affected = USERS.destroy(&db, Vec::<i64>::new()).await.unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn missing_env_host_is_a_configuration_error() {
    // Guard against ambient DB_HOST leaking into the assertion.
    if std::env::var("DB_HOST").is_ok() {
        return;
    }
    let err = DatabaseConfig::from_env().unwrap_err();
    assert!(matches!(err, pgrecord::RecordError::Configuration(_)));
}
