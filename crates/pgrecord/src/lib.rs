//! # pgrecord
//!
//! A lightweight active-record layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Descriptor-driven entities**: a `static` [`ModelMeta`] describes the
//!   table (name, primary key, fillable set, soft deletes); no derive macros,
//!   no inheritance
//! - **Lifecycle on the instance**: `save` picks INSERT or UPDATE from the
//!   primary-key attribute; `delete`/`restore` honor soft deletes;
//!   `refresh`/`touch`/`trashed` round out the record API
//! - **Fluent queries**: [`QueryBuilder`] composes AND-joined predicates and
//!   a single ordering clause, binds every value as a `$n` parameter and
//!   materializes rows back into [`Model`]s
//! - **One connection, lazily**: [`Database`] wraps a single tokio-postgres
//!   client established on first use; settings come from an explicit
//!   [`DatabaseConfig`] or the `DB_*` environment
//!
//! ## Usage
//!
//! ```ignore
//! use pgrecord::{Database, ModelMeta};
//!
//! static USERS: ModelMeta = ModelMeta::new("users")
//!     .fillable(&["name", "email", "password"])
//!     .soft_deletes(true);
//!
//! let db = Database::from_env()?;
//!
//! // Query
//! let admins = USERS
//!     .query(&db)
//!     .eq("role", "admin")
//!     .order_by_desc("id")
//!     .get()
//!     .await?;
//!
//! // Persist
//! let mut user = USERS.new_instance(&[("name", "Alice".into())]);
//! user.save(&db).await?;
//!
//! // Soft-delete and reinstate
//! user.delete(&db).await?;
//! user.restore(&db).await?;
//! ```

pub mod builder;
pub mod collection;
pub mod config;
pub mod database;
pub mod error;
pub mod meta;
pub mod model;
pub mod value;

pub mod prelude;

pub use builder::{Direction, Op, QueryBuilder};
pub use collection::Collection;
pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{RecordError, RecordResult};
pub use meta::{KeyType, ModelMeta};
pub use model::Model;
pub use value::{DATETIME_FORMAT, Value, format_datetime};
