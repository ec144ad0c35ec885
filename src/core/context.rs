/// Generation context — names bound to already-resolved strings.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable bindings threaded through an expansion.
///
/// A placeholder whose name is bound here emits the bound text instead of
/// expanding a category. Extending a context produces a new one; the
/// original is left untouched and cheap to share.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationContext {
    bindings: Arc<BTreeMap<String, String>>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new context with `name` bound to `value`.
    pub fn with(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut bindings = (*self.bindings).clone();
        bindings.insert(name.into(), value.into());
        Self {
            bindings: Arc::new(bindings),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

impl<K, V> FromIterator<(K, V)> for GenerationContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}
