//! Error type for strict property checks.
//!
//! Queries never fail: unknown classes simply have no known properties. The only error comes from the strict
//! variants that turn a mismatch into a `Result`.

use miette::Diagnostic;
use thiserror::Error;

use crate::class::ClassId;
use crate::compare::PropertyComparison;

/// Failure of a strict property check.
#[derive(Debug, Error, Diagnostic)]
pub enum PropertyError {
    /// The object's keys differ from the class's known properties.
    #[error(
        "object does not match `{}`: missing {}, extra {}",
        .class.short_name(),
        bracketed(&.comparison.missing),
        bracketed(&.comparison.extra)
    )]
    #[diagnostic(
        code(classprops::mismatch),
        help("known properties come from `#[property]` fields and `#[properties(member = ...)]`")
    )]
    Mismatch {
        class: ClassId,
        comparison: PropertyComparison,
    },

    /// The value could not be turned into JSON to read its keys.
    #[error("cannot compare value against `{}`: {source}", .class.short_name())]
    #[diagnostic(code(classprops::serialize))]
    Serialize {
        class: ClassId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PropertyError {
    pub(crate) fn mismatch(class: ClassId, comparison: PropertyComparison) -> Self {
        tracing::debug!(
            %class,
            missing = comparison.missing.len(),
            extra = comparison.extra.len(),
            "property mismatch"
        );
        PropertyError::Mismatch { class, comparison }
    }

    /// The class the check was made against.
    pub fn class(&self) -> ClassId {
        match self {
            PropertyError::Mismatch { class, .. } => *class,
            PropertyError::Serialize { class, .. } => *class,
        }
    }

    /// The comparison behind a [`Mismatch`](PropertyError::Mismatch).
    pub fn comparison(&self) -> Option<&PropertyComparison> {
        match self {
            PropertyError::Mismatch { comparison, .. } => Some(comparison),
            PropertyError::Serialize { .. } => None,
        }
    }
}

fn bracketed(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}
