//! Hierarchy walks and symbolic member resolution shared by the rules.
//!
//! These walks mirror JVM linkage: methods resolve through the superclass
//! chain and then through superinterfaces, fields resolve through the
//! owner, its superinterfaces, and then the superclass. Unresolvable links
//! end a walk without failing it; the class-level rules report them.

use std::collections::HashSet;
use std::sync::Arc;

use crate::context::VerificationContext;
use crate::model::{BinaryClass, Field, Method};

/// A method found in a concrete declaring class.
pub(crate) struct ResolvedMethod {
    pub(crate) owner: Arc<BinaryClass>,
    index: usize,
}

impl ResolvedMethod {
    pub(crate) fn method(&self) -> &Method {
        &self.owner.methods[self.index]
    }
}

/// A field found in a concrete declaring class.
pub(crate) struct ResolvedField {
    pub(crate) owner: Arc<BinaryClass>,
    index: usize,
}

impl ResolvedField {
    pub(crate) fn field(&self) -> &Field {
        &self.owner.fields[self.index]
    }
}

/// Outcome of symbolic method resolution.
pub(crate) enum MethodResolution {
    NotFound,
    Found(ResolvedMethod),
    /// Two or more unrelated superinterfaces provide default implementations
    /// and nothing overrides them.
    Ambiguous { owners: Vec<String> },
}

/// The class and every resolvable ancestor class, nearest first.
/// Stops at the first unresolvable or cyclic link.
pub(crate) fn superclass_chain(
    ctx: &VerificationContext,
    start: Arc<BinaryClass>,
) -> Vec<Arc<BinaryClass>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.name.clone());
    let mut chain = vec![start];
    loop {
        let Some(super_name) = chain[chain.len() - 1].super_name.clone() else {
            break;
        };
        if !visited.insert(super_name.clone()) {
            break;
        }
        match ctx.resolver.find_class(&super_name) {
            Some(super_class) => chain.push(super_class),
            None => break,
        }
    }
    chain
}

/// Every resolvable superinterface of the given classes, transitively,
/// in deterministic breadth-first order.
pub(crate) fn all_superinterfaces(
    ctx: &VerificationContext,
    classes: &[Arc<BinaryClass>],
) -> Vec<Arc<BinaryClass>> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: Vec<String> = classes
        .iter()
        .flat_map(|class| class.interfaces.iter().cloned())
        .collect();
    let mut interfaces = Vec::new();
    let mut index = 0;
    while index < queue.len() {
        let name = queue[index].clone();
        index += 1;
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(interface) = ctx.resolver.find_class(&name) else {
            continue;
        };
        queue.extend(interface.interfaces.iter().cloned());
        interfaces.push(interface);
    }
    interfaces
}

/// True when `sub` names `sup` or a type reachable from `sub` through
/// superclasses and superinterfaces.
pub(crate) fn is_subtype_of(ctx: &VerificationContext, sub: &str, sup: &str) -> bool {
    if sub == sup {
        return true;
    }
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue = vec![sub.to_string()];
    while let Some(name) = queue.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if name == sup {
            return true;
        }
        let Some(class) = ctx.resolver.find_class(&name) else {
            continue;
        };
        if let Some(super_name) = &class.super_name {
            queue.push(super_name.clone());
        }
        queue.extend(class.interfaces.iter().cloned());
    }
    false
}

/// Resolve `(owner, name, descriptor)` the way the JVM links a method
/// reference: the owner and its superclasses first, then superinterfaces,
/// preferring the maximally specific candidates.
pub(crate) fn resolve_method(
    ctx: &VerificationContext,
    owner: &Arc<BinaryClass>,
    name: &str,
    descriptor: &str,
) -> MethodResolution {
    let chain = superclass_chain(ctx, Arc::clone(owner));
    for class in &chain {
        if let Some(index) = method_index(class, name, descriptor) {
            return MethodResolution::Found(ResolvedMethod {
                owner: Arc::clone(class),
                index,
            });
        }
    }

    // Static and private interface methods are not inherited, so they never
    // become candidates below the declaring interface.
    let mut candidates: Vec<ResolvedMethod> = Vec::new();
    for interface in all_superinterfaces(ctx, &chain) {
        if let Some(index) = method_index(&interface, name, descriptor) {
            let method = &interface.methods[index];
            if !method.is_static() && !method.is_private() {
                candidates.push(ResolvedMethod { owner: interface, index });
            }
        }
    }
    if candidates.is_empty() {
        return MethodResolution::NotFound;
    }

    let maximal = maximally_specific(ctx, candidates);
    let mut default_owners: Vec<String> = maximal
        .iter()
        .filter(|candidate| !candidate.method().is_abstract())
        .map(|candidate| candidate.owner.name.clone())
        .collect();
    if default_owners.len() > 1 {
        default_owners.sort();
        return MethodResolution::Ambiguous { owners: default_owners };
    }

    // A hierarchy cycle among candidate owners can empty the maximal set;
    // such a hierarchy is malformed and the reference treated as unresolved.
    match maximal.into_iter().min_by(|a, b| {
        let a_default = !a.method().is_abstract();
        let b_default = !b.method().is_abstract();
        b_default
            .cmp(&a_default)
            .then_with(|| a.owner.name.cmp(&b.owner.name))
    }) {
        Some(chosen) => MethodResolution::Found(chosen),
        None => MethodResolution::NotFound,
    }
}

/// Keep only candidates whose declaring interface has no more specific
/// declaring interface among the other candidates.
fn maximally_specific(
    ctx: &VerificationContext,
    candidates: Vec<ResolvedMethod>,
) -> Vec<ResolvedMethod> {
    let owners: Vec<String> = candidates
        .iter()
        .map(|candidate| candidate.owner.name.clone())
        .collect();
    candidates
        .into_iter()
        .filter(|candidate| {
            !owners.iter().any(|other| {
                other != &candidate.owner.name
                    && is_subtype_of(ctx, other, &candidate.owner.name)
            })
        })
        .collect()
}

/// Resolve a field reference: the owner's own fields, then superinterfaces
/// recursively, then the superclass.
pub(crate) fn resolve_field(
    ctx: &VerificationContext,
    owner: &Arc<BinaryClass>,
    name: &str,
    descriptor: &str,
) -> Option<ResolvedField> {
    let mut visited = HashSet::new();
    resolve_field_in(ctx, owner, name, descriptor, &mut visited)
}

fn resolve_field_in(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    name: &str,
    descriptor: &str,
    visited: &mut HashSet<String>,
) -> Option<ResolvedField> {
    if !visited.insert(class.name.clone()) {
        return None;
    }
    if let Some(index) = class
        .fields
        .iter()
        .position(|field| field.name == name && field.descriptor == descriptor)
    {
        return Some(ResolvedField {
            owner: Arc::clone(class),
            index,
        });
    }
    for interface_name in &class.interfaces {
        if let Some(interface) = ctx.resolver.find_class(interface_name) {
            if let Some(found) = resolve_field_in(ctx, &interface, name, descriptor, visited) {
                return Some(found);
            }
        }
    }
    let super_class = class
        .super_name
        .as_ref()
        .and_then(|super_name| ctx.resolver.find_class(super_name))?;
    resolve_field_in(ctx, &super_class, name, descriptor, visited)
}

fn method_index(class: &BinaryClass, name: &str, descriptor: &str) -> Option<usize> {
    class
        .methods
        .iter()
        .position(|method| method.name == name && method.descriptor == descriptor)
}
