//! The property registry: per-class ordered name lists with explicit inheritance.
//!
//! ## Notes
//!
//! - Each class owns at most one list. A class without its own list inherits the nearest list up its base chain.
//! - The first [`mark`](PropertyRegistry::mark) on a class copies the inherited list before appending, so
//!   extending a subclass never changes what its ancestors (or siblings) report.
//! - Entries are never removed. The [`global`](PropertyRegistry::global) registry lives for the whole process.
//! - All state sits behind one `RwLock`; every read-modify-write of a list happens under the write guard.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::class::ClassId;
use crate::declare::{Declaration, Properties};

static GLOBAL: LazyLock<PropertyRegistry> = LazyLock::new(PropertyRegistry::new);

thread_local! {
    /// Registrations in progress on this thread, keyed by registry address, used to cut declaration cycles.
    static IN_PROGRESS: RefCell<Vec<(usize, ClassId)>> = const { RefCell::new(Vec::new()) };
}

/// Removes an `IN_PROGRESS` entry when registration ends, including by unwinding.
struct InProgress {
    key: (usize, ClassId),
}

impl InProgress {
    /// Claim `key` for this thread, or `None` if it is already being registered here.
    fn enter(key: (usize, ClassId)) -> Option<Self> {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return None;
            }
            stack.push(key);
            Some(Self { key })
        })
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        // `try_with`: the thread-local may already be gone during thread teardown.
        let _ = IN_PROGRESS.try_with(|stack| {
            stack.borrow_mut().retain(|k| *k != self.key);
        });
    }
}

#[derive(Default)]
struct State {
    /// Own list per class (inherited names included once copied).
    lists: HashMap<ClassId, Vec<String>>,
    /// Immediate base per class.
    bases: HashMap<ClassId, ClassId>,
    /// Types whose `Properties::declare` has been applied.
    registered: HashSet<ClassId>,
}

impl State {
    /// Nearest stored list along the base chain, starting at `class` itself.
    fn resolve(&self, class: ClassId) -> Option<&Vec<String>> {
        let mut current = Some(class);
        // Base links are kept acyclic by `set_base`, so the walk terminates.
        while let Some(c) = current {
            if let Some(list) = self.lists.get(&c) {
                return Some(list);
            }
            current = self.bases.get(&c).copied();
        }
        None
    }

    fn is_ancestor_or_self(&self, candidate: ClassId, class: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == candidate {
                return true;
            }
            current = self.bases.get(&c).copied();
        }
        false
    }

    fn mark(&mut self, class: ClassId, name: &str) {
        if let Some(own) = self.lists.get_mut(&class) {
            if !own.iter().any(|n| n == name) {
                own.push(name.to_string());
            }
            return;
        }

        // Copy, never alias, the inherited list.
        let mut list = self
            .bases
            .get(&class)
            .and_then(|&base| self.resolve(base))
            .cloned()
            .unwrap_or_default();
        if !list.iter().any(|n| n == name) {
            list.push(name.to_string());
        }
        self.lists.insert(class, list);
    }

    fn set_base(&mut self, class: ClassId, base: ClassId) -> bool {
        if self.bases.get(&class) == Some(&base) {
            return true;
        }
        if self.is_ancestor_or_self(class, base) {
            return false;
        }
        self.bases.insert(class, base);
        true
    }
}

/// Registry mapping each class to its ordered list of known property names.
///
/// ## Examples
/// ```rust
/// use classprops::{ClassId, PropertyRegistry};
///
/// struct Base;
/// struct Derived;
///
/// let registry = PropertyRegistry::new();
/// let (base, derived) = (ClassId::of::<Base>(), ClassId::of::<Derived>());
///
/// registry.mark(base, "a");
/// registry.set_base(derived, base);
/// registry.mark(derived, "b");
///
/// assert_eq!(registry.list(base), vec!["a"]);
/// assert_eq!(registry.list(derived), vec!["a", "b"]);
/// assert!(!registry.has(base, "b"));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    state: RwLock<State>,
}

impl PropertyRegistry {
    /// Create an empty, isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the crate-level query functions.
    pub fn global() -> &'static PropertyRegistry {
        &GLOBAL
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `name` as a known property of `class`.
    ///
    /// The class's own list is used if it has one; otherwise the nearest inherited list is copied first.
    /// Marking an already-listed name (own or inherited) leaves the list unchanged.
    pub fn mark(&self, class: ClassId, name: &str) {
        tracing::trace!(%class, name, "mark property");
        self.write().mark(class, name);
    }

    /// Record `base` as the immediate base class of `class`.
    ///
    /// ## Returns
    /// - (`bool`): `false` if the link was rejected because it would make the base chain cyclic.
    ///
    /// ## Notes
    /// - Only names marked on `class` *after* the link inherit from `base`; a list the class already owns is
    ///   not rebuilt.
    pub fn set_base(&self, class: ClassId, base: ClassId) -> bool {
        let linked = self.write().set_base(class, base);
        if !linked {
            tracing::warn!(%class, %base, "ignoring base class link that would form a cycle");
        }
        linked
    }

    /// Immediate base class of `class`, if one was linked.
    pub fn base(&self, class: ClassId) -> Option<ClassId> {
        self.read().bases.get(&class).copied()
    }

    /// Ordered property names of `class`, or an empty list for classes never marked (directly or via a base).
    pub fn list(&self, class: ClassId) -> Vec<String> {
        self.read().resolve(class).cloned().unwrap_or_default()
    }

    /// Whether `name` appears in [`list`](Self::list) for `class`.
    pub fn has(&self, class: ClassId, name: &str) -> bool {
        self.read()
            .resolve(class)
            .is_some_and(|list| list.iter().any(|n| n == name))
    }

    /// Whether `T`'s declaration has been applied to this registry.
    pub fn is_registered<T: Properties>(&self) -> bool {
        self.read().registered.contains(&ClassId::of::<T>())
    }

    /// Apply `T`'s [`Properties`] declaration once: its base first, then the base link, then each marked name.
    ///
    /// ## Notes
    /// - Repeated calls are cheap no-ops.
    /// - A declaration cycle (`A` extends `B` extends `A`) terminates: the type already being registered on this
    ///   thread is skipped and the closing base link is rejected.
    /// - Two threads may race to register the same type; marks are idempotent so both converge on one list.
    /// - If `declare` panics, nothing is marked and a later call retries the registration.
    #[tracing::instrument(level = "debug", skip_all, fields(class = std::any::type_name::<T>()))]
    pub fn register<T: Properties>(&self) {
        let class = ClassId::of::<T>();
        if self.read().registered.contains(&class) {
            return;
        }

        let Some(_guard) = InProgress::enter((self as *const Self as usize, class)) else {
            tracing::warn!(%class, "declaration cycle detected; skipping re-entrant registration");
            return;
        };

        let mut decl = Declaration::new(class);
        T::declare(&mut decl);
        let (base, names) = decl.into_parts();

        if let Some(base) = base {
            (base.register)(self);
            self.set_base(class, base.class);
        }

        {
            let mut state = self.write();
            for name in &names {
                tracing::trace!(%class, name = name.as_str(), "mark property");
                state.mark(class, name);
            }
            state.registered.insert(class);
        }

        tracing::debug!(%class, marked = names.len(), "registered class properties");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct B;
    struct S1;
    struct S2;
    struct S3;

    fn id<T: 'static>() -> ClassId {
        ClassId::of::<T>()
    }

    #[test]
    fn unmarked_class_lists_nothing() {
        let registry = PropertyRegistry::new();
        assert!(registry.list(id::<B>()).is_empty());
        assert!(!registry.has(id::<B>(), "anything"));
    }

    #[test]
    fn mark_is_idempotent() {
        let registry = PropertyRegistry::new();
        registry.mark(id::<B>(), "a");
        registry.mark(id::<B>(), "a");
        assert_eq!(registry.list(id::<B>()), vec!["a"]);
    }

    #[test]
    fn marking_subclasses_never_touches_ancestors_or_siblings() {
        let registry = PropertyRegistry::new();
        registry.mark(id::<B>(), "a");
        registry.set_base(id::<S1>(), id::<B>());
        registry.set_base(id::<S2>(), id::<B>());
        registry.set_base(id::<S3>(), id::<S2>());
        registry.mark(id::<S2>(), "c");
        registry.mark(id::<S3>(), "d");
        registry.mark(id::<S1>(), "b");

        assert_eq!(registry.list(id::<B>()), vec!["a"]);
        assert_eq!(registry.list(id::<S1>()), vec!["a", "b"]);
        assert_eq!(registry.list(id::<S2>()), vec!["a", "c"]);
        assert_eq!(registry.list(id::<S3>()), vec!["a", "c", "d"]);
    }

    #[test]
    fn unmarked_subclass_inherits_nearest_list() {
        let registry = PropertyRegistry::new();
        registry.mark(id::<B>(), "a");
        registry.set_base(id::<S2>(), id::<B>());
        registry.set_base(id::<S3>(), id::<S2>());

        assert_eq!(registry.list(id::<S3>()), vec!["a"]);
        assert!(registry.has(id::<S3>(), "a"));
    }

    #[test]
    fn inherited_name_is_not_duplicated() {
        let registry = PropertyRegistry::new();
        registry.mark(id::<B>(), "a");
        registry.set_base(id::<S1>(), id::<B>());
        registry.mark(id::<S1>(), "a");
        registry.mark(id::<S1>(), "b");
        assert_eq!(registry.list(id::<S1>()), vec!["a", "b"]);
    }

    #[test]
    fn cyclic_base_links_are_rejected() {
        let registry = PropertyRegistry::new();
        assert!(registry.set_base(id::<S1>(), id::<B>()));
        assert!(!registry.set_base(id::<B>(), id::<S1>()));
        assert!(!registry.set_base(id::<S2>(), id::<S2>()));
        assert_eq!(registry.base(id::<B>()), None);
        assert!(registry.list(id::<B>()).is_empty());
    }

    #[test]
    fn concurrent_marks_on_one_class_are_not_lost() {
        let registry = PropertyRegistry::new();
        std::thread::scope(|scope| {
            for t in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 0..50 {
                        registry.mark(id::<B>(), &format!("t{t}_{i}"));
                    }
                });
            }
        });
        assert_eq!(registry.list(id::<B>()).len(), 8 * 50);
    }

    struct Cyclic1;
    struct Cyclic2;

    impl Properties for Cyclic1 {
        fn declare(decl: &mut Declaration) {
            decl.extends::<Cyclic2>().mark("one");
        }
    }

    impl Properties for Cyclic2 {
        fn declare(decl: &mut Declaration) {
            decl.extends::<Cyclic1>().mark("two");
        }
    }

    struct Flaky;

    static FLAKY_CALLS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    impl Properties for Flaky {
        fn declare(decl: &mut Declaration) {
            if FLAKY_CALLS.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                panic!("declaration failed");
            }
            decl.mark("a");
        }
    }

    #[test]
    fn panicking_declaration_can_be_retried() {
        let registry = PropertyRegistry::new();
        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| registry.register::<Flaky>()));
        assert!(unwound.is_err());
        assert!(!registry.is_registered::<Flaky>());

        registry.register::<Flaky>();
        assert!(registry.is_registered::<Flaky>());
        assert_eq!(registry.list(id::<Flaky>()), vec!["a"]);

        let fresh = PropertyRegistry::new();
        fresh.register::<Flaky>();
        assert_eq!(fresh.list(id::<Flaky>()), vec!["a"]);
        IN_PROGRESS.with(|stack| assert!(stack.borrow().is_empty()));
    }

    struct Outer;
    struct Inner;

    impl Properties for Inner {
        fn declare(decl: &mut Declaration) {
            decl.mark("inner");
        }
    }

    static OTHER: LazyLock<PropertyRegistry> = LazyLock::new(PropertyRegistry::new);

    impl Properties for Outer {
        fn declare(decl: &mut Declaration) {
            // Registering the same type into another registry mid-declaration is not a cycle.
            OTHER.register::<Outer>();
            decl.extends::<Inner>().mark("outer");
        }
    }

    #[test]
    fn in_progress_is_tracked_per_registry() {
        let registry = PropertyRegistry::new();
        registry.register::<Outer>();

        assert_eq!(registry.list(id::<Outer>()), vec!["inner", "outer"]);
        assert!(OTHER.is_registered::<Outer>());
        assert_eq!(OTHER.list(id::<Outer>()), vec!["inner", "outer"]);
    }

    #[test]
    fn declaration_cycles_terminate() {
        let registry = PropertyRegistry::new();
        registry.register::<Cyclic1>();

        assert!(registry.is_registered::<Cyclic1>());
        assert!(registry.is_registered::<Cyclic2>());
        // `Cyclic2 -> Cyclic1` is linked first; the closing `Cyclic1 -> Cyclic2` link is rejected.
        assert_eq!(registry.base(id::<Cyclic2>()), Some(id::<Cyclic1>()));
        assert_eq!(registry.base(id::<Cyclic1>()), None);
        assert_eq!(registry.list(id::<Cyclic1>()), vec!["one"]);
        assert_eq!(registry.list(id::<Cyclic2>()), vec!["two"]);
    }
}
