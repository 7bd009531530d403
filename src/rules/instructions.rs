//! Instruction-level rules: every symbolic reference a method's bytecode
//! carries is resolved the way the runtime would link it, and each failure
//! mode maps to one structured finding at the call site.

use std::sync::Arc;

use crate::context::VerificationContext;
use crate::model::{
    AccessLevel, BinaryClass, FieldAccessKind, Instruction, InvokeKind, Method, TypeRefKind,
};
use crate::problem::{Location, MemberKind, Problem, ProblemReport};
use crate::rules::access::member_accessible;
use crate::rules::lookup::{resolve_field, resolve_method, MethodResolution, ResolvedMethod};

pub(crate) fn check(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    method: &Method,
    instruction: &Instruction,
    sink: &mut ProblemReport,
) {
    let location = Location::method(&class.name, &method.name, &method.descriptor);
    match instruction {
        Instruction::InvokeMethod { owner, name, descriptor, kind } => {
            check_invoke(ctx, class, owner, name, descriptor, *kind, location, sink);
        }
        Instruction::FieldAccess { owner, name, descriptor, kind } => {
            check_field_access(
                ctx, class, method, owner, name, descriptor, *kind, location, sink,
            );
        }
        Instruction::TypeReference { class_name, kind } => {
            check_type_reference(ctx, class_name, *kind, location, sink);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_invoke(
    ctx: &VerificationContext,
    caller: &Arc<BinaryClass>,
    owner: &str,
    name: &str,
    descriptor: &str,
    kind: InvokeKind,
    location: Location,
    sink: &mut ProblemReport,
) {
    // Array owners only expose java/lang/Object plumbing and clone;
    // nothing a platform change can break.
    if owner.starts_with('[') {
        return;
    }
    let Some(owner_class) = ctx.resolver.find_class(owner) else {
        if !ctx.policy.is_exempt(owner) {
            sink.record(Problem::ClassNotFound { name: owner.to_string() }, location);
        }
        return;
    };

    let found = match resolve_method(ctx, &owner_class, name, descriptor) {
        MethodResolution::NotFound => {
            if !ctx.policy.is_exempt(owner) {
                sink.record(
                    Problem::MethodNotFound {
                        owner: owner.to_string(),
                        name: name.to_string(),
                        descriptor: descriptor.to_string(),
                    },
                    location,
                );
            }
            return;
        }
        MethodResolution::Ambiguous { owners } => {
            sink.record(
                Problem::MultipleDefaultImplementations {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                    owners,
                },
                location,
            );
            return;
        }
        MethodResolution::Found(found) => found,
    };

    let target = found.method();
    if target.is_static() && kind.is_instance() {
        sink.record(
            Problem::InstanceInvokeOnStaticMethod {
                owner: found.owner.name.clone(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
            location.clone(),
        );
    } else if !target.is_static() && kind == InvokeKind::Static {
        sink.record(
            Problem::StaticInvokeOnInstanceMethod {
                owner: found.owner.name.clone(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
            location.clone(),
        );
    }

    if kind == InvokeKind::Interface && target.access_level() == AccessLevel::Private {
        sink.record(
            Problem::InvokeInterfaceOnPrivateMethod {
                owner: found.owner.name.clone(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
            location,
        );
        return;
    }

    // Bridge methods and compiler-generated accessors are transparent
    // plumbing; the call they forward to is checked where it appears.
    if transparent_plumbing(&found) {
        return;
    }
    let access = target.access_level();
    if !member_accessible(ctx, caller, owner, &found.owner, access, target.is_static()) {
        sink.record(
            Problem::IllegalAccess {
                member: MemberKind::Method,
                owner: found.owner.name.clone(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                access,
            },
            location,
        );
    }
}

fn transparent_plumbing(found: &ResolvedMethod) -> bool {
    let method = found.method();
    method.is_bridge() || method.is_synthetic() || method.is_accessor_stub()
}

#[allow(clippy::too_many_arguments)]
fn check_field_access(
    ctx: &VerificationContext,
    caller: &Arc<BinaryClass>,
    caller_method: &Method,
    owner: &str,
    name: &str,
    descriptor: &str,
    kind: FieldAccessKind,
    location: Location,
    sink: &mut ProblemReport,
) {
    if owner.starts_with('[') {
        return;
    }
    let Some(owner_class) = ctx.resolver.find_class(owner) else {
        if !ctx.policy.is_exempt(owner) {
            sink.record(Problem::ClassNotFound { name: owner.to_string() }, location);
        }
        return;
    };

    let Some(found) = resolve_field(ctx, &owner_class, name, descriptor) else {
        if !ctx.policy.is_exempt(owner) {
            sink.record(
                Problem::FieldNotFound {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                },
                location,
            );
        }
        return;
    };

    let field = found.field();
    if kind.is_static() && !field.is_static() {
        sink.record(
            Problem::StaticAccessOnInstanceField {
                owner: found.owner.name.clone(),
                name: name.to_string(),
            },
            location.clone(),
        );
    } else if !kind.is_static() && field.is_static() {
        sink.record(
            Problem::InstanceAccessOnStaticField {
                owner: found.owner.name.clone(),
                name: name.to_string(),
            },
            location.clone(),
        );
    }

    let access = field.access_level();
    if !member_accessible(ctx, caller, owner, &found.owner, access, field.is_static()) {
        sink.record(
            Problem::IllegalAccess {
                member: MemberKind::Field,
                owner: found.owner.name.clone(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                access,
            },
            location.clone(),
        );
    }

    if kind.is_put() && field.is_final() {
        // Writes to a final field only link inside the owning class's
        // constructor (instance) or static initializer (static).
        let in_owner = caller.name == found.owner.name;
        let allowed = in_owner
            && match kind {
                FieldAccessKind::PutField => caller_method.is_constructor(),
                FieldAccessKind::PutStatic => caller_method.is_class_initializer(),
                _ => false,
            };
        if !allowed {
            sink.record(
                Problem::FinalFieldModification {
                    owner: found.owner.name.clone(),
                    name: name.to_string(),
                },
                location,
            );
        }
    }
}

fn check_type_reference(
    ctx: &VerificationContext,
    class_name: &str,
    kind: TypeRefKind,
    location: Location,
    sink: &mut ProblemReport,
) {
    let Some(target) = ctx.resolver.find_class(class_name) else {
        if !ctx.policy.is_exempt(class_name) {
            sink.record(
                Problem::ClassNotFound { name: class_name.to_string() },
                location,
            );
        }
        return;
    };
    if kind == TypeRefKind::New {
        if target.is_interface() {
            sink.record(
                Problem::InterfaceInstantiation { name: class_name.to_string() },
                location,
            );
        } else if target.is_abstract() {
            sink.record(
                Problem::AbstractClassInstantiation { name: class_name.to_string() },
                location,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        abstract_class, accessor_stub, concrete_class, context_over, default_method, field,
        final_field, interface, invoke, method, private_method, protected_method, static_field,
        static_method,
    };
    use crate::model::MethodFlags;

    fn check_one(
        classes: Vec<BinaryClass>,
        caller: &str,
        caller_method: &Method,
        instruction: &Instruction,
    ) -> ProblemReport {
        let ctx = context_over(classes);
        let class = ctx.resolver.find_class(caller).expect("resolve caller");
        let mut sink = ProblemReport::new();
        check(&ctx, &class, caller_method, instruction, &mut sink);
        sink
    }

    fn caller_method() -> Method {
        method("run", "()V", MethodFlags::PUBLIC)
    }

    #[test]
    fn invoking_a_missing_method_on_a_present_class_is_method_not_found() {
        let report = check_one(
            vec![
                concrete_class("com/a/Caller", Some("java/lang/Object")),
                concrete_class("com/p/Api", Some("java/lang/Object")),
            ],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "gone", "()V", InvokeKind::Virtual),
        );

        assert!(report.contains(&Problem::MethodNotFound {
            owner: "com/p/Api".to_string(),
            name: "gone".to_string(),
            descriptor: "()V".to_string(),
        }));
    }

    #[test]
    fn private_method_found_elsewhere_is_illegal_access_not_not_found() {
        let mut api = concrete_class("com/p/Api", Some("java/lang/Object"));
        api.methods.push(private_method("secret", "()V"));
        let report = check_one(
            vec![concrete_class("com/a/Caller", Some("java/lang/Object")), api],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "secret", "()V", InvokeKind::Virtual),
        );

        assert!(report.contains(&Problem::IllegalAccess {
            member: MemberKind::Method,
            owner: "com/p/Api".to_string(),
            name: "secret".to_string(),
            descriptor: "()V".to_string(),
            access: AccessLevel::Private,
        }));
        assert!(!report.contains(&Problem::MethodNotFound {
            owner: "com/p/Api".to_string(),
            name: "secret".to_string(),
            descriptor: "()V".to_string(),
        }));
    }

    #[test]
    fn protected_access_via_unrelated_subtype_is_flagged() {
        let mut base = concrete_class("com/p/Base", Some("java/lang/Object"));
        base.methods.push(protected_method("guarded", "()V"));
        let sibling = concrete_class("com/p2/Sibling", Some("com/p/Base"));
        let caller = concrete_class("com/a/Caller", Some("com/p/Base"));
        let report = check_one(
            vec![base, sibling, caller],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p2/Sibling", "guarded", "()V", InvokeKind::Virtual),
        );

        assert!(report.contains(&Problem::IllegalAccess {
            member: MemberKind::Method,
            owner: "com/p/Base".to_string(),
            name: "guarded".to_string(),
            descriptor: "()V".to_string(),
            access: AccessLevel::Protected,
        }));
    }

    #[test]
    fn static_and_instance_invocations_must_match_the_target() {
        let mut api = concrete_class("com/p/Api", Some("java/lang/Object"));
        api.methods.push(static_method("helper", "()V"));
        api.methods.push(method("work", "()V", MethodFlags::PUBLIC));
        let classes = vec![concrete_class("com/a/Caller", Some("java/lang/Object")), api];

        let report = check_one(
            classes.clone(),
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "helper", "()V", InvokeKind::Virtual),
        );
        assert!(report.contains(&Problem::InstanceInvokeOnStaticMethod {
            owner: "com/p/Api".to_string(),
            name: "helper".to_string(),
            descriptor: "()V".to_string(),
        }));

        let report = check_one(
            classes,
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "work", "()V", InvokeKind::Static),
        );
        assert!(report.contains(&Problem::StaticInvokeOnInstanceMethod {
            owner: "com/p/Api".to_string(),
            name: "work".to_string(),
            descriptor: "()V".to_string(),
        }));
    }

    #[test]
    fn invokeinterface_on_a_private_interface_method_is_flagged() {
        let mut iface = interface("com/p/Api");
        iface.methods.push(private_method("hidden", "()V"));
        let report = check_one(
            vec![concrete_class("com/a/Caller", Some("java/lang/Object")), iface],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "hidden", "()V", InvokeKind::Interface),
        );

        assert!(report.contains(&Problem::InvokeInterfaceOnPrivateMethod {
            owner: "com/p/Api".to_string(),
            name: "hidden".to_string(),
            descriptor: "()V".to_string(),
        }));
    }

    #[test]
    fn accessor_stubs_are_transparent_plumbing() {
        let mut api = concrete_class("com/p/Api", Some("java/lang/Object"));
        api.methods.push(accessor_stub("access$100", "()V"));
        let report = check_one(
            vec![concrete_class("com/a/Caller", Some("java/lang/Object")), api],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Api", "access$100", "()V", InvokeKind::Static),
        );

        assert!(report.is_empty());
    }

    #[test]
    fn ambiguous_default_methods_surface_at_the_call_site() {
        let mut left = interface("com/p/Left");
        left.methods.push(default_method("run", "()V"));
        let mut right = interface("com/p/Right");
        right.methods.push(default_method("run", "()V"));
        let mut target = concrete_class("com/p/Both", Some("java/lang/Object"));
        target.interfaces.extend(["com/p/Left".to_string(), "com/p/Right".to_string()]);
        let report = check_one(
            vec![left, right, target, concrete_class("com/a/Caller", Some("java/lang/Object"))],
            "com/a/Caller",
            &caller_method(),
            &invoke("com/p/Both", "run", "()V", InvokeKind::Virtual),
        );

        assert!(report.contains(&Problem::MultipleDefaultImplementations {
            name: "run".to_string(),
            descriptor: "()V".to_string(),
            owners: vec!["com/p/Left".to_string(), "com/p/Right".to_string()],
        }));
    }

    #[test]
    fn field_static_mismatches_are_flagged_both_ways() {
        let mut api = concrete_class("com/p/Api", Some("java/lang/Object"));
        api.fields.push(field("value", "I"));
        api.fields.push(static_field("COUNT", "I"));
        let classes = vec![concrete_class("com/a/Caller", Some("java/lang/Object")), api];

        let report = check_one(
            classes.clone(),
            "com/a/Caller",
            &caller_method(),
            &Instruction::FieldAccess {
                owner: "com/p/Api".to_string(),
                name: "value".to_string(),
                descriptor: "I".to_string(),
                kind: FieldAccessKind::GetStatic,
            },
        );
        assert!(report.contains(&Problem::StaticAccessOnInstanceField {
            owner: "com/p/Api".to_string(),
            name: "value".to_string(),
        }));

        let report = check_one(
            classes,
            "com/a/Caller",
            &caller_method(),
            &Instruction::FieldAccess {
                owner: "com/p/Api".to_string(),
                name: "COUNT".to_string(),
                descriptor: "I".to_string(),
                kind: FieldAccessKind::GetField,
            },
        );
        assert!(report.contains(&Problem::InstanceAccessOnStaticField {
            owner: "com/p/Api".to_string(),
            name: "COUNT".to_string(),
        }));
    }

    #[test]
    fn writing_a_final_field_from_outside_its_owner_is_flagged() {
        let mut api = concrete_class("com/p/Api", Some("java/lang/Object"));
        api.fields.push(final_field("LIMIT", "I"));
        let report = check_one(
            vec![concrete_class("com/a/Caller", Some("java/lang/Object")), api],
            "com/a/Caller",
            &caller_method(),
            &Instruction::FieldAccess {
                owner: "com/p/Api".to_string(),
                name: "LIMIT".to_string(),
                descriptor: "I".to_string(),
                kind: FieldAccessKind::PutField,
            },
        );

        assert!(report.contains(&Problem::FinalFieldModification {
            owner: "com/p/Api".to_string(),
            name: "LIMIT".to_string(),
        }));
    }

    #[test]
    fn constructors_may_write_their_own_final_fields() {
        let mut owner = concrete_class("com/a/Owner", Some("java/lang/Object"));
        owner.fields.push(final_field("limit", "I"));
        let constructor = method("<init>", "()V", MethodFlags::PUBLIC);
        let report = check_one(
            vec![owner],
            "com/a/Owner",
            &constructor,
            &Instruction::FieldAccess {
                owner: "com/a/Owner".to_string(),
                name: "limit".to_string(),
                descriptor: "I".to_string(),
                kind: FieldAccessKind::PutField,
            },
        );

        assert!(report.is_empty());
    }

    #[test]
    fn class_initializers_may_write_their_own_static_finals() {
        let mut owner = concrete_class("com/a/Owner", Some("java/lang/Object"));
        let mut limit = final_field("LIMIT", "I");
        limit.flags |= crate::model::FieldFlags::STATIC;
        owner.fields.push(limit);
        let initializer = static_method("<clinit>", "()V");
        let report = check_one(
            vec![owner],
            "com/a/Owner",
            &initializer,
            &Instruction::FieldAccess {
                owner: "com/a/Owner".to_string(),
                name: "LIMIT".to_string(),
                descriptor: "I".to_string(),
                kind: FieldAccessKind::PutStatic,
            },
        );

        assert!(report.is_empty());
    }

    #[test]
    fn instantiating_abstract_classes_and_interfaces_is_flagged() {
        let classes = vec![
            concrete_class("com/a/Caller", Some("java/lang/Object")),
            abstract_class("com/p/Base", Some("java/lang/Object")),
            interface("com/p/Api"),
        ];

        let report = check_one(
            classes.clone(),
            "com/a/Caller",
            &caller_method(),
            &Instruction::TypeReference {
                class_name: "com/p/Base".to_string(),
                kind: TypeRefKind::New,
            },
        );
        assert!(report.contains(&Problem::AbstractClassInstantiation {
            name: "com/p/Base".to_string(),
        }));

        let report = check_one(
            classes.clone(),
            "com/a/Caller",
            &caller_method(),
            &Instruction::TypeReference {
                class_name: "com/p/Api".to_string(),
                kind: TypeRefKind::New,
            },
        );
        assert!(report.contains(&Problem::InterfaceInstantiation {
            name: "com/p/Api".to_string(),
        }));

        // Casting to either is fine.
        let report = check_one(
            classes,
            "com/a/Caller",
            &caller_method(),
            &Instruction::TypeReference {
                class_name: "com/p/Api".to_string(),
                kind: TypeRefKind::CheckCast,
            },
        );
        assert!(report.is_empty());
    }

    #[test]
    fn array_owners_are_skipped() {
        let report = check_one(
            vec![concrete_class("com/a/Caller", Some("java/lang/Object"))],
            "com/a/Caller",
            &caller_method(),
            &invoke("[Lcom/p/Api;", "clone", "()Ljava/lang/Object;", InvokeKind::Virtual),
        );

        assert!(report.is_empty());
    }
}
