//! Prelude module for common imports.
//!
//! ```ignore
//! use classprops::prelude::*;
//! ```

// Trait + derive macro share the name `Properties` (type and macro namespaces)
pub use crate::declare::{Declaration, Properties};
pub use classprops_derive::Properties;

pub use crate::class::ClassId;
pub use crate::compare::{OwnKeys, PropertyComparison};
pub use crate::errors::PropertyError;
pub use crate::registry::PropertyRegistry;
pub use crate::{class_properties, compare_properties, ensure_valid_properties, has_property, has_valid_properties};

#[cfg(feature = "json")]
pub use crate::compare_serialized;
