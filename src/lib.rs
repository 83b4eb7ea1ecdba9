#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
//! Known-property metadata for Rust types.
//!
//! Types mark members as *known properties* (with `#[derive(Properties)]` or a hand-written [`Properties`] impl),
//! optionally inheriting the properties of a base type. The registry then answers:
//!
//! - which properties a type has ([`class_properties`]),
//! - whether it has a given one ([`has_property`]),
//! - how an object's own keys differ from them ([`compare_properties`], [`has_valid_properties`],
//!   [`ensure_valid_properties`]).
//!
//! ## Examples
//!
//! ```rust
//! use classprops::prelude::*;
//!
//! #[derive(Properties)]
//! struct Entity {
//!     #[property]
//!     id: u64,
//! }
//!
//! #[derive(Properties)]
//! #[properties(extends = Entity, member = "display_name")]
//! struct User {
//!     #[property]
//!     email: String,
//!     cached: bool,
//! }
//!
//! assert_eq!(class_properties::<User>(), vec!["id", "email", "display_name"]);
//! assert!(!has_property::<Entity>("email"));
//!
//! let comparison = compare_properties::<User>(&["email", "nickname"]);
//! assert_eq!(comparison.missing, vec!["id", "display_name"]);
//! assert_eq!(comparison.extra, vec!["nickname"]);
//! ```
//!
//! ## Notes
//!
//! - Only names are compared; values and their types are never inspected.
//! - The crate-level functions use [`PropertyRegistry::global`]. Build a [`PropertyRegistry`] directly for an
//!   isolated registry or to mark classes without implementing [`Properties`].

// Lets `#[derive(Properties)]` expand to `::classprops::...` inside this crate's own tests.
extern crate self as classprops;

pub mod class;
pub mod compare;
pub mod declare;
pub mod errors;
pub mod prelude;
pub mod registry;

pub use class::ClassId;
pub use compare::{OwnKeys, PropertyComparison};
pub use declare::{Declaration, Properties};
pub use errors::PropertyError;
pub use registry::PropertyRegistry;

pub use classprops_derive::Properties;

/// Known property names of `T`, base properties first.
pub fn class_properties<T: Properties>() -> Vec<String> {
    let registry = PropertyRegistry::global();
    registry.register::<T>();
    registry.list(ClassId::of::<T>())
}

/// Whether `name` is a known property of `T`.
pub fn has_property<T: Properties>(name: &str) -> bool {
    let registry = PropertyRegistry::global();
    registry.register::<T>();
    registry.has(ClassId::of::<T>(), name)
}

/// Compare `object`'s own keys against the known properties of `T`.
pub fn compare_properties<T: Properties>(object: &(impl OwnKeys + ?Sized)) -> PropertyComparison {
    let registry = PropertyRegistry::global();
    registry.register::<T>();
    registry.compare(object, ClassId::of::<T>())
}

/// Whether `object`'s own keys are exactly the known properties of `T`.
pub fn has_valid_properties<T: Properties>(object: &(impl OwnKeys + ?Sized)) -> bool {
    compare_properties::<T>(object).is_exact()
}

/// Check that `object`'s own keys are exactly the known properties of `T`.
///
/// # Errors
///
/// Returns [`PropertyError::Mismatch`] describing the missing and extra names.
pub fn ensure_valid_properties<T: Properties>(object: &(impl OwnKeys + ?Sized)) -> Result<(), PropertyError> {
    let registry = PropertyRegistry::global();
    registry.register::<T>();
    registry.ensure_valid(object, ClassId::of::<T>())
}

/// Serialize `value` and compare its top-level JSON keys against the known properties of `T`.
///
/// # Errors
///
/// Returns [`PropertyError::Serialize`] if `value` cannot be serialized to JSON.
#[cfg(feature = "json")]
pub fn compare_serialized<T: Properties>(
    value: &(impl serde::Serialize + ?Sized),
) -> Result<PropertyComparison, PropertyError> {
    let registry = PropertyRegistry::global();
    registry.register::<T>();
    registry.compare_serialized(value, ClassId::of::<T>())
}
