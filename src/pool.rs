//! Indexed, immutable collections of parsed classes.
//!
//! Each pool represents one physical source (an archive, a directory, a
//! synthetic union) and reports its origin for diagnostics. Names are unique
//! within one pool; the same name appearing in different pools is expected
//! and resolution precedence decides which one wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::BinaryClass;

/// A class that failed to parse, kept so the owning run can report it.
#[derive(Clone, Debug)]
pub struct MalformedEntry {
    pub name: String,
    pub reason: String,
}

/// One indexed source of classes.
pub trait ClassPool: Send + Sync {
    /// Look up a class by binary name.
    fn find(&self, name: &str) -> Option<Arc<BinaryClass>>;

    fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// All class names, in deterministic (sorted) order.
    fn all_names(&self) -> Vec<String>;

    fn is_empty(&self) -> bool;

    /// Descriptive moniker of the physical source, diagnostics only.
    fn origin(&self) -> &str;

    /// Entries of this source that did not parse.
    fn malformed(&self) -> &[MalformedEntry] {
        &[]
    }
}

/// The identity element for pool union: no classes at all.
pub struct EmptyPool;

impl ClassPool for EmptyPool {
    fn find(&self, _name: &str) -> Option<Arc<BinaryClass>> {
        None
    }

    fn all_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn origin(&self) -> &str {
        "<empty>"
    }
}

/// A pool of eagerly parsed classes keyed by name.
///
/// Lookups are infallible; whatever could go wrong went wrong while the
/// pool was built.
pub struct ParsedPool {
    origin: String,
    classes: BTreeMap<String, Arc<BinaryClass>>,
    malformed: Vec<MalformedEntry>,
}

impl ParsedPool {
    pub fn from_classes(origin: impl Into<String>, classes: Vec<BinaryClass>) -> ParsedPool {
        let classes = classes
            .into_iter()
            .map(|class| (class.name.clone(), Arc::new(class)))
            .collect();
        ParsedPool {
            origin: origin.into(),
            classes,
            malformed: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        origin: String,
        classes: BTreeMap<String, Arc<BinaryClass>>,
        malformed: Vec<MalformedEntry>,
    ) -> ParsedPool {
        ParsedPool {
            origin,
            classes,
            malformed,
        }
    }
}

impl ClassPool for ParsedPool {
    fn find(&self, name: &str) -> Option<Arc<BinaryClass>> {
        self.classes.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn all_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.malformed.is_empty()
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn malformed(&self) -> &[MalformedEntry] {
        &self.malformed
    }
}

/// Union of several pools: first member to contain a name wins.
pub struct UnionPool {
    origin: String,
    members: Vec<Arc<dyn ClassPool>>,
}

impl UnionPool {
    /// Compose pools, skipping empty members. Degenerates to the single
    /// non-empty member, or to [`EmptyPool`] when nothing is left.
    pub fn union(members: Vec<Arc<dyn ClassPool>>) -> Arc<dyn ClassPool> {
        let mut members: Vec<Arc<dyn ClassPool>> =
            members.into_iter().filter(|pool| !pool.is_empty()).collect();
        match members.len() {
            0 => Arc::new(EmptyPool),
            1 => members.remove(0),
            _ => {
                let origin = members
                    .iter()
                    .map(|pool| pool.origin())
                    .collect::<Vec<_>>()
                    .join(" + ");
                Arc::new(UnionPool { origin, members })
            }
        }
    }
}

impl ClassPool for UnionPool {
    fn find(&self, name: &str) -> Option<Arc<BinaryClass>> {
        self.members.iter().find_map(|pool| pool.find(name))
    }

    fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .iter()
            .flat_map(|pool| pool.all_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn is_empty(&self) -> bool {
        self.members.iter().all(|pool| pool.is_empty())
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}
