//! Comparison of an object's own keys against a class's known properties.
//!
//! Only names are compared. Values, value types and nesting are ignored.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::class::ClassId;
use crate::errors::PropertyError;
use crate::registry::PropertyRegistry;

/// A value that exposes its own (top-level) keys, in its natural iteration order.
///
/// ## Notes
/// - `serde_json` objects keep insertion order (the crate enables `preserve_order`); arrays expose their indices
///   (`"0"`, `"1"`, ...) and scalars expose no keys.
/// - `HashMap` keys come back in unspecified order, so `extra` is unordered for hash maps.
pub trait OwnKeys {
    fn own_keys(&self) -> Vec<Cow<'_, str>>;
}

impl<T: OwnKeys + ?Sized> OwnKeys for &T {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        (**self).own_keys()
    }
}

impl<K: AsRef<str>, V> OwnKeys for BTreeMap<K, V> {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.keys().map(|k| Cow::Borrowed(k.as_ref())).collect()
    }
}

impl<K: AsRef<str>, V, S> OwnKeys for HashMap<K, V, S> {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.keys().map(|k| Cow::Borrowed(k.as_ref())).collect()
    }
}

/// A bare list of key names.
impl<S: AsRef<str>> OwnKeys for [S] {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.iter().map(|k| Cow::Borrowed(k.as_ref())).collect()
    }
}

impl<S: AsRef<str>> OwnKeys for Vec<S> {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.as_slice().own_keys()
    }
}

impl<S: AsRef<str>, const N: usize> OwnKeys for [S; N] {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.as_slice().own_keys()
    }
}

#[cfg(feature = "json")]
impl OwnKeys for serde_json::Map<String, serde_json::Value> {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        self.keys().map(|k| Cow::Borrowed(k.as_str())).collect()
    }
}

#[cfg(feature = "json")]
impl OwnKeys for serde_json::Value {
    fn own_keys(&self) -> Vec<Cow<'_, str>> {
        match self {
            serde_json::Value::Object(map) => map.own_keys(),
            serde_json::Value::Array(items) => (0..items.len()).map(|i| Cow::Owned(i.to_string())).collect(),
            _ => Vec::new(),
        }
    }
}

/// Result of comparing an object's own keys with a class's known properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PropertyComparison {
    /// Known properties absent from the object, in the class's property order.
    pub missing: Vec<String>,
    /// Object keys the class does not know, in the object's key order.
    pub extra: Vec<String>,
}

impl PropertyComparison {
    /// Diff `present` keys against `expected` property names.
    pub fn between<S: AsRef<str>>(present: &[S], expected: &[String]) -> Self {
        let extra = present
            .iter()
            .map(|key| AsRef::<str>::as_ref(key))
            .filter(|&key| !expected.iter().any(|p| p == key))
            .map(str::to_string)
            .collect();
        let missing = expected
            .iter()
            .filter(|p| !present.iter().any(|key| AsRef::<str>::as_ref(key) == p.as_str()))
            .cloned()
            .collect();
        Self { missing, extra }
    }

    /// `true` when nothing is missing and nothing is extra.
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

impl PropertyRegistry {
    /// Compare `object`'s own keys against the known properties of `class`.
    ///
    /// A class with no known properties reports every key as extra and nothing as missing.
    pub fn compare(&self, object: &(impl OwnKeys + ?Sized), class: ClassId) -> PropertyComparison {
        let expected = self.list(class);
        PropertyComparison::between(&object.own_keys(), &expected)
    }

    /// Whether `object`'s own keys are exactly the known properties of `class` (in any order).
    pub fn is_valid(&self, object: &(impl OwnKeys + ?Sized), class: ClassId) -> bool {
        self.compare(object, class).is_exact()
    }

    /// Like [`is_valid`](Self::is_valid), but returns the mismatch as an error.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Mismatch`] if any property is missing or extra.
    pub fn ensure_valid(&self, object: &(impl OwnKeys + ?Sized), class: ClassId) -> Result<(), PropertyError> {
        let comparison = self.compare(object, class);
        if comparison.is_exact() {
            Ok(())
        } else {
            Err(PropertyError::mismatch(class, comparison))
        }
    }

    /// Serialize `value` to JSON and compare its top-level keys against `class`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Serialize`] if `value` cannot be represented as JSON.
    #[cfg(feature = "json")]
    pub fn compare_serialized<V: serde::Serialize + ?Sized>(
        &self,
        value: &V,
        class: ClassId,
    ) -> Result<PropertyComparison, PropertyError> {
        let json = serde_json::to_value(value).map_err(|source| PropertyError::Serialize {
            class,
            source: Box::new(source),
        })?;
        Ok(self.compare(&json, class))
    }
}
