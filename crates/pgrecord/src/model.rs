//! Entity instances and the persistence lifecycle.
//!
//! A [`Model`] is a bag of attributes tied to a static [`ModelMeta`]
//! descriptor. The attribute map is the only true state of an instance; a
//! non-null primary-key attribute marks the instance as persisted, and every
//! persistence operation reads that flag to pick INSERT vs. UPDATE.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tokio_postgres::Row;

use crate::collection::Collection;
use crate::database::Database;
use crate::error::{RecordError, RecordResult};
use crate::meta::ModelMeta;
use crate::value::{Value, format_datetime, param_refs};

pub(crate) const CREATED_AT: &str = "created_at";
pub(crate) const UPDATED_AT: &str = "updated_at";
pub(crate) const DELETED_AT: &str = "deleted_at";

/// One entity instance.
#[derive(Clone, Debug)]
pub struct Model {
    meta: &'static ModelMeta,
    attributes: BTreeMap<String, Value>,
}

impl Model {
    /// Create an empty instance for the given descriptor.
    pub fn new(meta: &'static ModelMeta) -> Self {
        Self {
            meta,
            attributes: BTreeMap::new(),
        }
    }

    /// The descriptor this instance belongs to.
    pub fn meta(&self) -> &'static ModelMeta {
        self.meta
    }

    /// The backing table name.
    pub fn table(&self) -> &'static str {
        self.meta.table
    }

    /// Read one attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Write one attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Merge a set of attributes into the instance.
    pub fn fill(&mut self, attrs: &[(&str, Value)]) {
        for (name, value) in attrs {
            self.attributes.insert((*name).to_string(), value.clone());
        }
    }

    /// The full attribute map.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// The primary-key value. `Null` counts as absent: an instance without a
    /// usable key has never been persisted.
    pub fn key(&self) -> Option<&Value> {
        self.attributes
            .get(self.meta.primary_key)
            .filter(|value| !value.is_null())
    }

    fn require_key(&self) -> RecordResult<Value> {
        self.key().cloned().ok_or_else(|| {
            RecordError::invalid_argument(format!(
                "unsaved {} instance has no primary key value",
                self.meta.table
            ))
        })
    }

    // ==================== Persistence ====================

    /// Persist the instance: UPDATE when the primary key is set, INSERT
    /// otherwise. Every fillable attribute is written (absent ones as NULL)
    /// and `updated_at` is set to `NOW()` server-side. An INSERT on an
    /// auto-incrementing descriptor backfills the generated key.
    pub async fn save(&mut self, db: &Database) -> RecordResult<()> {
        let (sql, params, returning_key) = self.save_statement();
        let refs = param_refs(&params);
        if returning_key {
            if let Some(row) = db.query_opt(&sql, &refs).await? {
                let key = Value::from_column(&row, 0)?;
                self.attributes
                    .insert(self.meta.primary_key.to_string(), key);
            }
        } else {
            db.execute(&sql, &refs).await?;
        }
        Ok(())
    }

    /// Merge the given attributes, then [`save`](Self::save).
    pub async fn update(&mut self, db: &Database, attrs: &[(&str, Value)]) -> RecordResult<()> {
        self.fill(attrs);
        self.save(db).await
    }

    /// Set `updated_at = NOW()` for the row, independent of any other
    /// attribute change.
    pub async fn touch(&self, db: &Database) -> RecordResult<()> {
        let key = self.require_key()?;
        let sql = format!(
            "UPDATE {} SET {UPDATED_AT} = NOW() WHERE {} = $1",
            self.meta.table, self.meta.primary_key
        );
        db.execute(&sql, &param_refs(&[key])).await?;
        Ok(())
    }

    /// Remove the row: logically for soft-delete descriptors (a
    /// `deleted_at` marker plus a separate `touch`), physically otherwise.
    pub async fn delete(&mut self, db: &Database) -> RecordResult<()> {
        if !self.meta.soft_deletes {
            return self.force_delete(db).await;
        }
        let key = self.require_key()?;
        let sql = format!(
            "UPDATE {} SET {DELETED_AT} = NOW() WHERE {} = $1",
            self.meta.table, self.meta.primary_key
        );
        db.execute(&sql, &param_refs(&[key])).await?;
        // Marker write and timestamp touch are independent statements.
        self.touch(db).await
    }

    /// Physically delete the row, then reset local state: fillable
    /// attributes become `Null`, anything else is removed.
    pub async fn force_delete(&mut self, db: &Database) -> RecordResult<()> {
        let key = self.require_key()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            self.meta.table, self.meta.primary_key
        );
        db.execute(&sql, &param_refs(&[key])).await?;
        self.clear_attributes();
        Ok(())
    }

    /// Reinstate a soft-deleted row. Fails with
    /// [`RecordError::InvalidArgument`] on a descriptor without soft deletes.
    pub async fn restore(&mut self, db: &Database) -> RecordResult<()> {
        if !self.meta.soft_deletes {
            return Err(RecordError::invalid_argument(
                "cannot restore a model that does not use soft deletes",
            ));
        }
        let key = self.require_key()?;
        let sql = format!(
            "UPDATE {} SET {DELETED_AT} = NULL WHERE {} = $1",
            self.meta.table, self.meta.primary_key
        );
        db.execute(&sql, &param_refs(&[key])).await?;
        self.touch(db).await
    }

    /// Re-fetch the row by primary key and replace the local attributes
    /// wholesale. A vanished (or soft-deleted) row is a
    /// [`RecordError::NotFound`].
    pub async fn refresh(&mut self, db: &Database) -> RecordResult<()> {
        let key = self.require_key()?;
        let fresh = self.meta.find(db, key).await?.ok_or_else(|| {
            RecordError::not_found(format!(
                "{} row disappeared while refreshing",
                self.meta.table
            ))
        })?;
        self.attributes = fresh.attributes;
        Ok(())
    }

    /// Whether the row is currently invisible to queries: soft-deleted, or
    /// gone entirely.
    pub async fn trashed(&self, db: &Database) -> RecordResult<bool> {
        let key = self.require_key()?;
        let models = self
            .meta
            .query(db)
            .eq(self.meta.primary_key, key)
            .get()
            .await?;
        Ok(models.count() == 0)
    }

    // ==================== Conversions & identity ====================

    /// The attribute map as a JSON object. Contained timestamps render
    /// through the canonical formatter.
    pub fn to_array(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json_value()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// The attribute map as a pretty-printed JSON string.
    pub fn to_json(&self) -> String {
        format!("{:#}", self.to_array())
    }

    /// Whether this instance denotes the same row as `other`: matching
    /// primary-key value and matching table. Unsaved instances are never
    /// identical to anything.
    pub fn is(&self, other: &Self) -> bool {
        match (self.key(), other.key()) {
            (Some(a), Some(b)) => a == b && self.meta.table == other.meta.table,
            _ => false,
        }
    }

    /// Inverse of [`is`](Self::is).
    pub fn is_not(&self, other: &Self) -> bool {
        !self.is(other)
    }

    // ==================== Internals ====================

    fn save_statement(&self) -> (String, Vec<Value>, bool) {
        let mut params: Vec<Value> = Vec::new();

        if let Some(key) = self.key() {
            let mut assignments: Vec<String> = Vec::new();
            for column in self.meta.fillable {
                params.push(self.attributes.get(*column).cloned().unwrap_or(Value::Null));
                assignments.push(format!("{column} = ${}", params.len()));
            }
            assignments.push(format!("{UPDATED_AT} = NOW()"));
            params.push(key.clone());
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ${}",
                self.meta.table,
                assignments.join(", "),
                self.meta.primary_key,
                params.len()
            );
            (sql, params, false)
        } else {
            let mut columns: Vec<&str> = self.meta.fillable.to_vec();
            let mut placeholders: Vec<String> = Vec::new();
            for column in self.meta.fillable {
                params.push(self.attributes.get(*column).cloned().unwrap_or(Value::Null));
                placeholders.push(format!("${}", params.len()));
            }
            columns.push(UPDATED_AT);
            placeholders.push("NOW()".to_string());

            let mut sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.meta.table,
                columns.join(", "),
                placeholders.join(", ")
            );
            let returning_key = self.meta.incrementing;
            if returning_key {
                sql.push_str(&format!(" RETURNING {}", self.meta.primary_key));
            }
            (sql, params, returning_key)
        }
    }

    fn clear_attributes(&mut self) {
        let meta = self.meta;
        self.attributes.retain(|name, _| meta.is_fillable(name));
        for value in self.attributes.values_mut() {
            *value = Value::Null;
        }
    }

    /// Materialize an instance from a result row.
    ///
    /// The primary-key column is always copied and must be present; fillable
    /// columns are copied by name; `created_at` / `updated_at` are
    /// reformatted into the canonical timestamp string. Everything else is
    /// silently dropped.
    pub(crate) fn from_row(meta: &'static ModelMeta, row: &Row) -> RecordResult<Self> {
        let mut attributes = BTreeMap::new();
        let mut saw_key = false;

        for (idx, column) in row.columns().iter().enumerate() {
            let name = column.name();
            let is_timestamp = name == CREATED_AT || name == UPDATED_AT;
            if name != meta.primary_key && !meta.is_fillable(name) && !is_timestamp {
                continue;
            }

            let mut value = Value::from_column(row, idx)?;
            if is_timestamp {
                if let Value::DateTime(datetime) = &value {
                    value = Value::Text(format_datetime(datetime));
                }
            }
            if name == meta.primary_key {
                saw_key = true;
            }
            attributes.insert(name.to_string(), value);
        }

        if !saw_key {
            return Err(RecordError::decode(
                meta.primary_key,
                "result row is missing the primary-key column",
            ));
        }
        Ok(Self { meta, attributes })
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.meta, other.meta) && self.attributes == other.attributes
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.attributes.iter())
    }
}

impl ModelMeta {
    /// Start a query against the descriptor's table.
    pub fn query<'a>(&'static self, db: &'a Database) -> crate::QueryBuilder<'a> {
        crate::QueryBuilder::new(self, db)
    }

    /// Create an instance from the given attributes, without persisting it.
    pub fn new_instance(&'static self, attrs: &[(&str, Value)]) -> Model {
        let mut model = Model::new(self);
        model.fill(attrs);
        model
    }

    /// Find one row by primary key.
    pub async fn find(
        &'static self,
        db: &Database,
        id: impl Into<Value>,
    ) -> RecordResult<Option<Model>> {
        self.query(db).eq(self.primary_key, id).first().await
    }

    /// Find one row by primary key, failing with
    /// [`RecordError::NotFound`] when there is none.
    pub async fn find_or_fail(
        &'static self,
        db: &Database,
        id: impl Into<Value>,
    ) -> RecordResult<Model> {
        let id = id.into();
        self.find(db, id).await?.ok_or_else(|| {
            RecordError::not_found(format!("no {} row for the given key", self.table))
        })
    }

    /// All rows of the backing table.
    pub async fn all(&'static self, db: &Database) -> RecordResult<Collection<Model>> {
        self.query(db).select(&["*"]).get().await
    }

    /// Find the first row matching the equality-ANDed `search` set and merge
    /// `attrs` into it; when nothing matches, persist a new instance built
    /// from `attrs`.
    pub async fn update_or_create(
        &'static self,
        db: &Database,
        search: &[(&str, Value)],
        attrs: &[(&str, Value)],
    ) -> RecordResult<Model> {
        let mut query = self.query(db);
        for (column, value) in search {
            query = query.eq(column, value.clone());
        }
        match query.first().await? {
            Some(mut model) => {
                model.update(db, attrs).await?;
                Ok(model)
            }
            None => {
                let mut model = self.new_instance(attrs);
                model.save(db).await?;
                Ok(model)
            }
        }
    }

    /// Remove the rows with the given primary keys: one bulk soft-delete
    /// marker (after touching each still-visible instance) for soft-delete
    /// descriptors, one bulk DELETE otherwise. Returns the affected-row
    /// count of the bulk statement.
    pub async fn destroy(
        &'static self,
        db: &Database,
        ids: Vec<impl Into<Value>>,
    ) -> RecordResult<u64> {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("${i}")).collect();

        if self.soft_deletes {
            let models = self
                .query(db)
                .where_in(self.primary_key, ids.clone())
                .get()
                .await?;
            for model in models.iter() {
                model.touch(db).await?;
            }
            let sql = format!(
                "UPDATE {} SET {DELETED_AT} = NOW() WHERE {} IN ({})",
                self.table,
                self.primary_key,
                placeholders.join(", ")
            );
            db.execute(&sql, &param_refs(&ids)).await
        } else {
            let sql = format!(
                "DELETE FROM {} WHERE {} IN ({})",
                self.table,
                self.primary_key,
                placeholders.join(", ")
            );
            db.execute(&sql, &param_refs(&ids)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static USERS: ModelMeta = ModelMeta::new("users").fillable(&["name", "email"]);
    static TOKENS: ModelMeta = ModelMeta::new("api_tokens")
        .primary_key("token")
        .key_type(crate::KeyType::Text)
        .incrementing(false)
        .fillable(&["label"]);

    #[test]
    fn save_renders_insert_without_a_key() {
        let model = USERS.new_instance(&[("name", "A".into())]);
        let (sql, params, returning_key) = model.save_statement();
        assert_eq!(
            sql,
            "INSERT INTO users (name, email, updated_at) VALUES ($1, $2, NOW()) RETURNING id"
        );
        // Absent fillable attributes bind NULL, same filtered set both sides.
        assert_eq!(params, vec![Value::Text("A".into()), Value::Null]);
        assert!(returning_key);
    }

    #[test]
    fn save_renders_update_with_a_key() {
        let model = USERS.new_instance(&[
            ("id", 7i64.into()),
            ("name", "A".into()),
            ("email", "a@b.com".into()),
        ]);
        let (sql, params, returning_key) = model.save_statement();
        assert_eq!(
            sql,
            "UPDATE users SET name = $1, email = $2, updated_at = NOW() WHERE id = $3"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], Value::Int(7));
        assert!(!returning_key);
    }

    #[test]
    fn null_key_means_unsaved() {
        let model = USERS.new_instance(&[("id", Value::Null), ("name", "A".into())]);
        let (sql, _, _) = model.save_statement();
        assert!(sql.starts_with("INSERT INTO users"));
    }

    #[test]
    fn non_incrementing_insert_has_no_returning_clause() {
        let model = TOKENS.new_instance(&[("label", "ci".into())]);
        let (sql, _, returning_key) = model.save_statement();
        assert_eq!(
            sql,
            "INSERT INTO api_tokens (label, updated_at) VALUES ($1, NOW())"
        );
        assert!(!returning_key);
    }

    #[test]
    fn clear_attributes_nulls_fillable_and_drops_the_rest() {
        let mut model = USERS.new_instance(&[
            ("id", 1i64.into()),
            ("name", "A".into()),
            ("created_at", "2024-01-01 00:00:00".into()),
        ]);
        model.clear_attributes();
        assert_eq!(model.get("name"), Some(&Value::Null));
        assert_eq!(model.get("id"), None);
        assert_eq!(model.get("created_at"), None);
    }

    #[test]
    fn json_round_trip() {
        let model = USERS.new_instance(&[("id", 1i64.into()), ("name", "A".into())]);
        let parsed: serde_json::Value = serde_json::from_str(&model.to_json()).unwrap();
        assert_eq!(parsed, serde_json::json!({"id": 1, "name": "A"}));
    }

    #[test]
    fn identity_requires_matching_key_and_table() {
        let a = USERS.new_instance(&[("id", 1i64.into())]);
        let b = USERS.new_instance(&[("id", 1i64.into()), ("name", "B".into())]);
        let c = USERS.new_instance(&[("id", 2i64.into())]);
        let t = TOKENS.new_instance(&[("token", "x".into())]);
        assert!(a.is(&b));
        assert!(a.is_not(&c));
        assert!(a.is_not(&t));
    }

    #[test]
    fn unsaved_instances_are_never_identical() {
        let a = USERS.new_instance(&[("name", "A".into())]);
        let b = USERS.new_instance(&[("name", "A".into())]);
        assert!(a.is_not(&b));
        assert!(a.is_not(&a.clone()));
    }

    #[test]
    fn accessors_read_and_write_the_attribute_map() {
        let mut model = Model::new(&USERS);
        assert_eq!(model.get("name"), None);
        model.set("name", "A");
        assert_eq!(model.get("name"), Some(&Value::Text("A".into())));
        model.fill(&[("email", "a@b.com".into())]);
        assert_eq!(model.attributes().len(), 2);
    }
}
