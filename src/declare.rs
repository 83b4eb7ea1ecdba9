//! Property declarations for types.
//!
//! A type opts into the registry by implementing [`Properties`], usually through `#[derive(Properties)]`.
//! The declaration only *records* a base class and member names; [`PropertyRegistry::register`] applies it.

use crate::class::ClassId;
use crate::registry::PropertyRegistry;

/// Declare the known properties of a type.
///
/// This trait is typically derived using `#[derive(Properties)]`, but can be written by hand for members the
/// derive cannot see.
///
/// # Examples
///
/// ```rust
/// use classprops::{Declaration, Properties, class_properties};
///
/// struct Base;
/// struct Account {
///     owner: String,
/// }
///
/// impl Properties for Base {
///     fn declare(decl: &mut Declaration) {
///         decl.mark("id");
///     }
/// }
///
/// impl Properties for Account {
///     fn declare(decl: &mut Declaration) {
///         decl.extends::<Base>().mark("owner").mark("close");
///     }
/// }
///
/// assert_eq!(class_properties::<Account>(), vec!["id", "owner", "close"]);
/// ```
pub trait Properties: 'static {
    /// Record this type's base class (if any) and the names of its known members, in order.
    fn declare(decl: &mut Declaration);
}

/// Base class link recorded by [`Declaration::extends`].
#[derive(Clone, Copy)]
pub(crate) struct BaseClass {
    pub(crate) class: ClassId,
    /// Registers the base's own declaration before the subclass is applied.
    pub(crate) register: fn(&PropertyRegistry),
}

/// Recorded declaration of one class, filled in by [`Properties::declare`].
pub struct Declaration {
    class: ClassId,
    base: Option<BaseClass>,
    names: Vec<String>,
}

impl Declaration {
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            base: None,
            names: Vec::new(),
        }
    }

    /// The class being declared.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Inherit the known properties of `B`. A later call replaces an earlier one.
    pub fn extends<B: Properties>(&mut self) -> &mut Self {
        self.base = Some(BaseClass {
            class: ClassId::of::<B>(),
            register: PropertyRegistry::register::<B>,
        });
        self
    }

    /// Mark `name` as a known property. Marking the same name twice has no further effect.
    pub fn mark(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.push(name.into());
        self
    }

    /// The declared base class, if any.
    pub fn base(&self) -> Option<ClassId> {
        self.base.map(|b| b.class)
    }

    /// Names marked so far, in call order (duplicates are collapsed when applied).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn into_parts(self) -> (Option<BaseClass>, Vec<String>) {
        (self.base, self.names)
    }
}
