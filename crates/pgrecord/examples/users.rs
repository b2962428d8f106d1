//! Example demonstrating the record lifecycle end to end.
//!
//! Run with:
//!   cargo run --example users -p pgrecord
//!
//! Expects a reachable Postgres and a `users` table, configured via
//! DB_HOST / DB_USER / DB_PASS / DB_NAME (a `.env` file works too):
//!
//!   CREATE TABLE users (
//!       id bigserial PRIMARY KEY,
//!       name text,
//!       email text,
//!       created_at timestamp DEFAULT now(),
//!       updated_at timestamp,
//!       deleted_at timestamp
//!   );

use pgrecord::{Database, ModelMeta, RecordResult};

static USERS: ModelMeta = ModelMeta::new("users")
    .fillable(&["name", "email"])
    .soft_deletes(true);

#[tokio::main]
async fn main() -> RecordResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgrecord=debug".into()),
        )
        .init();

    let db = Database::from_env()?;

    // Insert; the generated key is backfilled onto the instance.
    let mut alice = USERS.new_instance(&[("name", "Alice".into()), ("email", "alice@example.com".into())]);
    alice.save(&db).await?;
    println!("saved: {}", alice.to_json());

    // Update in place.
    alice.update(&db, &[("name", "Alice Smith".into())]).await?;

    // Query back.
    let found = USERS
        .query(&db)
        .eq("email", "alice@example.com")
        .order_by_desc("id")
        .get()
        .await?;
    println!("matching rows: {}", found.count());
    for user in &found {
        println!("  {}", user.to_json());
    }

    // Soft-delete hides the row from queries; restore brings it back.
    alice.delete(&db).await?;
    println!("trashed: {}", alice.trashed(&db).await?);
    alice.restore(&db).await?;
    println!("trashed after restore: {}", alice.trashed(&db).await?);

    db.disconnect().await;
    Ok(())
}
