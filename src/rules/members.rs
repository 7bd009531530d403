//! Member-level rules: reference types named by field and method metadata
//! must resolve, and no declared method may override a final ancestor.

use std::sync::Arc;

use crate::context::VerificationContext;
use crate::descriptor;
use crate::model::{BinaryClass, Field, Method};
use crate::problem::{Location, Problem, ProblemReport};
use crate::rules::lookup::superclass_chain;

pub(crate) fn check_field(
    ctx: &VerificationContext,
    class: &BinaryClass,
    field: &Field,
    sink: &mut ProblemReport,
) {
    if let Some(reference) = descriptor::element_class(&field.descriptor) {
        require_resolvable(ctx, reference, Location::field(&class.name, &field.name), sink);
    }
}

pub(crate) fn check_method(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    method: &Method,
    sink: &mut ProblemReport,
) {
    let location = Location::method(&class.name, &method.name, &method.descriptor);
    for reference in descriptor::method_descriptor_classes(&method.descriptor) {
        require_resolvable(ctx, &reference, location.clone(), sink);
    }
    for reference in &method.declared_exceptions {
        require_resolvable(ctx, reference, location.clone(), sink);
    }
    for reference in &method.catch_types {
        require_resolvable(ctx, reference, location.clone(), sink);
    }
    for reference in &method.local_variable_types {
        require_resolvable(ctx, reference, location.clone(), sink);
    }

    check_final_override(ctx, class, method, sink);
}

fn require_resolvable(
    ctx: &VerificationContext,
    name: &str,
    location: Location,
    sink: &mut ProblemReport,
) {
    if ctx.resolver.find_class(name).is_none() && !ctx.policy.is_exempt(name) {
        sink.record(Problem::ClassNotFound { name: name.to_string() }, location);
    }
}

/// The nearest ancestor declaration of the same signature decides: if it is
/// final, redeclaring it here breaks linkage.
fn check_final_override(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    method: &Method,
    sink: &mut ProblemReport,
) {
    if method.is_private()
        || method.is_static()
        || method.is_constructor()
        || method.is_class_initializer()
        || class.super_name.is_none()
    {
        return;
    }
    let chain = superclass_chain(ctx, Arc::clone(class));
    for ancestor in chain.iter().skip(1) {
        let Some(inherited) = ancestor.find_method(&method.name, &method.descriptor) else {
            continue;
        };
        // Private and static members do not participate in overriding.
        if inherited.is_private() || inherited.is_static() {
            continue;
        }
        if inherited.is_final() && !inherited.is_abstract() {
            sink.record(
                Problem::FinalMethodOverride {
                    owner: ancestor.name.clone(),
                    name: method.name.clone(),
                    descriptor: method.descriptor.clone(),
                },
                Location::method(&class.name, &method.name, &method.descriptor),
            );
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{concrete_class, context_over, field, final_method, method};
    use crate::model::MethodFlags;

    #[test]
    fn unresolvable_field_type_is_reported_at_field_scope() {
        let mut subject = concrete_class("com/a/A", Some("java/lang/Object"));
        subject.fields.push(field("api", "Lcom/a/Gone;"));
        let ctx = context_over(vec![subject]);
        let class = ctx.resolver.find_class("com/a/A").expect("resolve");
        let mut sink = ProblemReport::new();

        check_field(&ctx, &class, &class.fields[0], &mut sink);

        assert!(sink.contains(&Problem::ClassNotFound { name: "com/a/Gone".to_string() }));
        assert!(sink
            .locations(&Problem::ClassNotFound { name: "com/a/Gone".to_string() })
            .expect("locations")
            .contains(&Location::field("com/a/A", "api")));
    }

    #[test]
    fn primitive_field_types_are_ignored() {
        let mut subject = concrete_class("com/a/A", Some("java/lang/Object"));
        subject.fields.push(field("count", "[[I"));
        let ctx = context_over(vec![subject]);
        let class = ctx.resolver.find_class("com/a/A").expect("resolve");
        let mut sink = ProblemReport::new();

        check_field(&ctx, &class, &class.fields[0], &mut sink);

        assert!(sink.is_empty());
    }

    #[test]
    fn method_metadata_references_must_resolve() {
        let mut subject = concrete_class("com/a/A", Some("java/lang/Object"));
        let mut run = method("run", "(Lcom/a/Param;)V", MethodFlags::PUBLIC);
        run.declared_exceptions.push("com/a/Oops".to_string());
        run.catch_types.push("com/a/Caught".to_string());
        run.local_variable_types.push("com/a/Local".to_string());
        subject.methods.push(run);
        let ctx = context_over(vec![subject, concrete_class("com/a/Caught", Some("java/lang/Object"))]);
        let class = ctx.resolver.find_class("com/a/A").expect("resolve");
        let mut sink = ProblemReport::new();

        check_method(&ctx, &class, &class.methods[0], &mut sink);

        for missing in ["com/a/Param", "com/a/Oops", "com/a/Local"] {
            assert!(
                sink.contains(&Problem::ClassNotFound { name: missing.to_string() }),
                "expected {missing} to be reported"
            );
        }
        assert!(!sink.contains(&Problem::ClassNotFound { name: "com/a/Caught".to_string() }));
    }

    #[test]
    fn overriding_a_final_method_is_reported() {
        let mut base = concrete_class("com/a/Base", Some("java/lang/Object"));
        base.methods.push(final_method("run", "()V"));
        let mut subject = concrete_class("com/a/A", Some("com/a/Base"));
        subject.methods.push(method("run", "()V", MethodFlags::PUBLIC));
        let ctx = context_over(vec![base, subject]);
        let class = ctx.resolver.find_class("com/a/A").expect("resolve");
        let mut sink = ProblemReport::new();

        check_method(&ctx, &class, &class.methods[0], &mut sink);

        assert!(sink.contains(&Problem::FinalMethodOverride {
            owner: "com/a/Base".to_string(),
            name: "run".to_string(),
            descriptor: "()V".to_string(),
        }));
    }

    #[test]
    fn nearest_non_final_declaration_shields_a_deeper_final_one() {
        let mut root = concrete_class("com/a/Root", Some("java/lang/Object"));
        root.methods.push(final_method("run", "()V"));
        let mut middle = concrete_class("com/a/Middle", Some("com/a/Root"));
        middle.methods.push(method("run", "()V", MethodFlags::PUBLIC));
        let mut subject = concrete_class("com/a/A", Some("com/a/Middle"));
        subject.methods.push(method("run", "()V", MethodFlags::PUBLIC));
        let ctx = context_over(vec![root, middle, subject]);
        let class = ctx.resolver.find_class("com/a/A").expect("resolve");
        let mut sink = ProblemReport::new();

        check_method(&ctx, &class, &class.methods[0], &mut sink);

        assert!(sink.is_empty());
    }
}
