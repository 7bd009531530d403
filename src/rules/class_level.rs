//! Class-level compatibility rules: hierarchy resolvability, class/interface
//! kind changes, final superclasses, and abstract-method coverage.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::context::VerificationContext;
use crate::model::BinaryClass;
use crate::problem::{ClassKind, Location, Problem, ProblemReport};
use crate::rules::lookup::{all_superinterfaces, superclass_chain};

pub(crate) fn check(ctx: &VerificationContext, class: &Arc<BinaryClass>, sink: &mut ProblemReport) {
    let location = Location::class(&class.name);

    if let Some(super_name) = &class.super_name {
        match ctx.resolver.find_class(super_name) {
            None => {
                if !ctx.policy.is_exempt(super_name) {
                    sink.record(
                        Problem::ClassNotFound { name: super_name.clone() },
                        location.clone(),
                    );
                }
            }
            Some(super_class) => {
                if super_class.is_interface() {
                    sink.record(
                        Problem::IncompatibleKindChange {
                            name: super_name.clone(),
                            expected: ClassKind::Class,
                        },
                        location.clone(),
                    );
                } else if super_class.is_final() {
                    sink.record(
                        Problem::FinalClassExtended { name: super_name.clone() },
                        location.clone(),
                    );
                }
            }
        }
    }

    for interface_name in &class.interfaces {
        match ctx.resolver.find_class(interface_name) {
            None => {
                if !ctx.policy.is_exempt(interface_name) {
                    sink.record(
                        Problem::ClassNotFound { name: interface_name.clone() },
                        location.clone(),
                    );
                }
            }
            Some(interface) => {
                if !interface.is_interface() {
                    sink.record(
                        Problem::IncompatibleKindChange {
                            name: interface_name.clone(),
                            expected: ClassKind::Interface,
                        },
                        location.clone(),
                    );
                }
            }
        }
    }

    check_abstract_coverage(ctx, class, sink);
}

/// What the superclass chain contributes for one inherited signature.
enum ChainAnswer {
    Concrete,
    AbstractOnly,
    Nothing,
}

/// A concrete class must provide (or inherit) an implementation of every
/// abstract method reachable through its ancestors. Interface default
/// methods count as provided, but a superclass declaration left abstract
/// does not fall back to them. Private and static members do not take
/// part in virtual dispatch, so a same-signature one is skipped and the
/// walk keeps going down the chain.
fn check_abstract_coverage(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    sink: &mut ProblemReport,
) {
    if class.is_interface() || class.is_abstract() {
        return;
    }

    let chain = superclass_chain(ctx, Arc::clone(class));
    let interfaces = all_superinterfaces(ctx, &chain);

    // Signature -> nearest declaring owner of the abstract contract.
    let mut requirements: BTreeMap<(String, String), String> = BTreeMap::new();
    for ancestor in chain.iter().skip(1) {
        for method in &ancestor.methods {
            if method.is_abstract() {
                requirements
                    .entry((method.name.clone(), method.descriptor.clone()))
                    .or_insert_with(|| ancestor.name.clone());
            }
        }
    }
    for interface in &interfaces {
        for method in &interface.methods {
            if method.is_abstract() && !method.is_static() && !method.is_private() {
                requirements
                    .entry((method.name.clone(), method.descriptor.clone()))
                    .or_insert_with(|| interface.name.clone());
            }
        }
    }

    for ((name, descriptor), owner) in requirements {
        let answer = chain
            .iter()
            .filter_map(|ancestor| ancestor.find_method(&name, &descriptor))
            .find(|method| !method.is_private() && !method.is_static())
            .map(|method| {
                if method.is_abstract() {
                    ChainAnswer::AbstractOnly
                } else {
                    ChainAnswer::Concrete
                }
            })
            .unwrap_or(ChainAnswer::Nothing);

        let satisfied = match answer {
            ChainAnswer::Concrete => true,
            ChainAnswer::AbstractOnly => false,
            ChainAnswer::Nothing => interfaces.iter().any(|interface| {
                interface
                    .find_method(&name, &descriptor)
                    .is_some_and(|method| {
                        !method.is_abstract() && !method.is_static() && !method.is_private()
                    })
            }),
        };
        if !satisfied {
            sink.record(
                Problem::AbstractMethodNotImplemented { owner, name, descriptor },
                Location::class(&class.name),
            );
        }
    }
}
