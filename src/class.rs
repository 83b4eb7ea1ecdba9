//! Stable class identity used as the registry key.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identify a class (any `'static` Rust type) in a [`PropertyRegistry`](crate::PropertyRegistry).
///
/// Equality and hashing use only the [`TypeId`]; the type name is carried for logs and error messages.
///
/// ## Examples
/// ```rust
/// use classprops::ClassId;
///
/// struct User;
/// assert_eq!(ClassId::of::<User>(), ClassId::of::<User>());
/// assert_ne!(ClassId::of::<User>(), ClassId::of::<String>());
/// assert!(ClassId::of::<User>().name().ends_with("User"));
/// ```
#[derive(Clone, Copy)]
pub struct ClassId {
    id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// Class id of `T`. Works for any type, marked or not.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name (`crate::module::Type`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of [`name`](Self::name), ignoring generic arguments.
    ///
    /// Tuples, arrays, slices, references, pointers and trait objects have no single path, so they keep the full
    /// name.
    pub fn short_name(&self) -> &'static str {
        if self.name.starts_with(['(', '[', '&', '*']) || self.name.starts_with("dyn ") {
            return self.name;
        }
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
