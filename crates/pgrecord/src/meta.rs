//! Entity descriptors.
//!
//! A [`ModelMeta`] is the static description of one backing table: its name,
//! identity column, mass-assignable attribute set and deletion policy.
//! Concrete entities are descriptor *values*, not subclasses — declare one as
//! a `static` and hand it to [`Model`](crate::Model) and
//! [`QueryBuilder`](crate::QueryBuilder):
//!
//! ```ignore
//! use pgrecord::ModelMeta;
//!
//! static USERS: ModelMeta = ModelMeta::new("users")
//!     .fillable(&["name", "email", "password"])
//!     .soft_deletes(true);
//!
//! let user = USERS.find(&db, 1).await?;
//! ```

/// Declared type of the identity column. Informational only; the stored
/// attribute decides how the key binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    Int,
    Text,
}

/// Static description of an entity's backing table.
#[derive(Debug)]
pub struct ModelMeta {
    /// The table associated with the entity.
    pub table: &'static str,
    /// The primary key column.
    pub primary_key: &'static str,
    /// The declared type of the primary key.
    pub key_type: KeyType,
    /// The attributes that are mass assignable and persisted by `save`.
    pub fillable: &'static [&'static str],
    /// Whether the identity value is server-generated.
    pub incrementing: bool,
    /// Whether deletion is logical (a `deleted_at` marker) or physical.
    pub soft_deletes: bool,
}

impl ModelMeta {
    /// Create a descriptor with the conventional defaults: primary key `id`,
    /// integer key type, auto-incrementing, hard deletes, nothing fillable.
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            primary_key: "id",
            key_type: KeyType::Int,
            fillable: &[],
            incrementing: true,
            soft_deletes: false,
        }
    }

    /// Override the primary key column.
    pub const fn primary_key(mut self, column: &'static str) -> Self {
        self.primary_key = column;
        self
    }

    /// Override the declared key type.
    pub const fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// Set the mass-assignable attribute names.
    pub const fn fillable(mut self, columns: &'static [&'static str]) -> Self {
        self.fillable = columns;
        self
    }

    /// Set whether the identity value is server-generated.
    pub const fn incrementing(mut self, incrementing: bool) -> Self {
        self.incrementing = incrementing;
        self
    }

    /// Enable or disable soft deletes.
    pub const fn soft_deletes(mut self, soft_deletes: bool) -> Self {
        self.soft_deletes = soft_deletes;
        self
    }

    /// Whether an attribute name is in the fillable set.
    pub fn is_fillable(&self, name: &str) -> bool {
        self.fillable.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static POSTS: ModelMeta = ModelMeta::new("posts")
        .primary_key("post_id")
        .fillable(&["title", "body"])
        .soft_deletes(true);

    #[test]
    fn const_builder_composes_in_static_context() {
        assert_eq!(POSTS.table, "posts");
        assert_eq!(POSTS.primary_key, "post_id");
        assert!(POSTS.soft_deletes);
        assert!(POSTS.incrementing);
        assert_eq!(POSTS.key_type, KeyType::Int);
    }

    #[test]
    fn fillable_lookup() {
        assert!(POSTS.is_fillable("title"));
        assert!(!POSTS.is_fillable("post_id"));
    }
}
