//! Ordered result container.

use rand::seq::IndexedRandom;
use serde::{Serialize, Serializer};

use crate::database::Database;
use crate::error::RecordResult;
use crate::model::Model;
use crate::value::Value;

/// An ordered sequence of entities or scalar values.
///
/// No invariant beyond insertion order. Query results arrive as
/// `Collection<Model>`; [`pluck`](Collection::pluck) projects one attribute
/// into a `Collection<Value>` for the numeric aggregates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append one item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// The number of items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first item, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// The last item, if any.
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// A pseudo-random item, if any.
    pub fn random(&self) -> Option<&T> {
        self.items.choose(&mut rand::rng())
    }

    /// Call `f` on every item in order.
    pub fn each(&self, f: impl FnMut(&T)) {
        self.items.iter().for_each(f);
    }

    /// Iterate over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Remove and return the first item.
    pub(crate) fn take_first(&mut self) -> Option<T> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }
}

impl<T: Clone> Collection<T> {
    /// The first `n` items.
    pub fn first_n(&self, n: usize) -> Self {
        self.items[..n.min(self.items.len())].to_vec().into()
    }

    /// The last `n` items.
    pub fn last_n(&self, n: usize) -> Self {
        let start = self.items.len().saturating_sub(n);
        self.items[start..].to_vec().into()
    }

    /// Non-mutating union: this collection followed by `other`.
    pub fn merge(&self, other: &Self) -> Self {
        self.items
            .iter()
            .chain(other.items.iter())
            .cloned()
            .collect()
    }
}

impl<T: Clone + PartialEq> Collection<T> {
    /// Deduplicate by value equality, keeping first occurrences in order.
    pub fn unique(&self) -> Self {
        let mut seen: Vec<&T> = Vec::new();
        let mut result = Self::new();
        for item in &self.items {
            if !seen.contains(&item) {
                seen.push(item);
                result.push(item.clone());
            }
        }
        result
    }
}

impl Collection<Model> {
    /// Cascade [`Model::delete`] to every contained entity.
    pub async fn delete(&mut self, db: &Database) -> RecordResult<()> {
        for model in &mut self.items {
            model.delete(db).await?;
        }
        Ok(())
    }

    /// Expand every entity into its JSON attribute map.
    pub fn to_array(&self) -> serde_json::Value {
        serde_json::Value::Array(self.items.iter().map(Model::to_array).collect())
    }

    /// Project one attribute per entity. Entities without the attribute
    /// contribute `Null`.
    pub fn pluck(&self, attribute: &str) -> Collection<Value> {
        self.items
            .iter()
            .map(|model| model.get(attribute).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl Collection<Value> {
    fn numeric(&self) -> impl Iterator<Item = f64> + '_ {
        self.items.iter().filter_map(Value::as_f64)
    }

    /// Sum of the numeric items.
    pub fn sum(&self) -> f64 {
        self.numeric().sum()
    }

    /// Average of the numeric items, if there are any.
    pub fn avg(&self) -> Option<f64> {
        let count = self.numeric().count();
        (count > 0).then(|| self.sum() / count as f64)
    }

    /// Largest numeric item, if any.
    pub fn max(&self) -> Option<f64> {
        self.numeric().reduce(f64::max)
    }

    /// Smallest numeric item, if any.
    pub fn min(&self) -> Option<f64> {
        self.numeric().reduce(f64::min)
    }
}

impl<T> std::ops::Deref for Collection<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Collection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ModelMeta;

    static USERS: ModelMeta = ModelMeta::new("users").fillable(&["name", "age"]);

    fn numbers(values: &[i64]) -> Collection<Value> {
        values.iter().map(|v| Value::Int(*v)).collect()
    }

    #[test]
    fn first_and_last_respect_insertion_order() {
        let c = numbers(&[1, 2, 3]);
        assert_eq!(c.first(), Some(&Value::Int(1)));
        assert_eq!(c.last(), Some(&Value::Int(3)));
        assert_eq!(c.first_n(2).count(), 2);
        assert_eq!(c.last_n(5).count(), 3);
        assert!(Collection::<Value>::new().first().is_none());
    }

    #[test]
    fn unique_keeps_first_occurrences() {
        let c = numbers(&[1, 2, 1, 3, 2]);
        assert_eq!(c.unique(), numbers(&[1, 2, 3]));
    }

    #[test]
    fn merge_does_not_mutate_either_side() {
        let a = numbers(&[1]);
        let b = numbers(&[2]);
        assert_eq!(a.merge(&b), numbers(&[1, 2]));
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn aggregates_ignore_non_numeric_items() {
        let mut c = numbers(&[2, 4]);
        c.push(Value::Text("nine".into()));
        c.push(Value::Null);
        assert_eq!(c.sum(), 6.0);
        assert_eq!(c.avg(), Some(3.0));
        assert_eq!(c.max(), Some(4.0));
        assert_eq!(c.min(), Some(2.0));
    }

    #[test]
    fn aggregates_on_empty_input() {
        let c = Collection::<Value>::new();
        assert_eq!(c.sum(), 0.0);
        assert_eq!(c.avg(), None);
        assert_eq!(c.max(), None);
    }

    #[test]
    fn pluck_projects_one_attribute() {
        let models: Collection<Model> = vec![
            USERS.new_instance(&[("id", 1i64.into()), ("name", "A".into())]),
            USERS.new_instance(&[("id", 2i64.into())]),
        ]
        .into();
        let names = models.pluck("name");
        assert_eq!(names.count(), 2);
        assert_eq!(names.first(), Some(&Value::Text("A".into())));
        assert_eq!(names.last(), Some(&Value::Null));
    }

    #[test]
    fn to_array_expands_models() {
        let models: Collection<Model> =
            vec![USERS.new_instance(&[("id", 1i64.into()), ("name", "A".into())])].into();
        assert_eq!(
            models.to_array(),
            serde_json::json!([{"id": 1, "name": "A"}])
        );
    }

    #[test]
    fn random_comes_from_the_collection() {
        let c = numbers(&[5, 6, 7]);
        let picked = c.random().unwrap();
        assert!(c.iter().any(|v| v == picked));
        assert!(Collection::<Value>::new().random().is_none());
    }
}
