//! PropertyMap — the key-value store on nodes, edges and records.

use std::collections::BTreeMap;
use super::Value;

/// A map of attribute names to values. Ordered, so snapshots and exports
/// are byte-stable across runs.
pub type PropertyMap = BTreeMap<String, Value>;

/// Collect (key, value) pairs into a `PropertyMap`.
pub fn properties<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> PropertyMap
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
