//! Access legality under JVM linkage rules.

use crate::context::VerificationContext;
use crate::model::{AccessLevel, BinaryClass};
use crate::rules::lookup::is_subtype_of;

/// Whether code in `caller` may reach a member of the given declared
/// access level.
///
/// `reference_owner` is the class named by the referencing instruction,
/// which for protected instance members must stay within the caller's own
/// inheritance line: a subclass may touch an inherited protected member
/// through itself or its subtypes, never through an unrelated sibling
/// subtype of the declaring class.
pub(crate) fn member_accessible(
    ctx: &VerificationContext,
    caller: &BinaryClass,
    reference_owner: &str,
    declaring: &BinaryClass,
    access: AccessLevel,
    is_static: bool,
) -> bool {
    match access {
        AccessLevel::Public => true,
        AccessLevel::Private => caller.name == declaring.name,
        AccessLevel::PackagePrivate => caller.package() == declaring.package(),
        AccessLevel::Protected => {
            if caller.package() == declaring.package() {
                return true;
            }
            if !is_subtype_of(ctx, &caller.name, &declaring.name) {
                return false;
            }
            if is_static {
                return true;
            }
            is_subtype_of(ctx, reference_owner, &caller.name)
                || is_subtype_of(ctx, &caller.name, reference_owner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{concrete_class, context_over};

    #[test]
    fn private_members_are_confined_to_the_declaring_class() {
        let declaring = concrete_class("com/a/Api", Some("java/lang/Object"));
        let same = concrete_class("com/a/Api", Some("java/lang/Object"));
        let other = concrete_class("com/a/Other", Some("java/lang/Object"));
        let ctx = context_over(vec![declaring.clone()]);

        assert!(member_accessible(&ctx, &same, "com/a/Api", &declaring, AccessLevel::Private, false));
        assert!(!member_accessible(&ctx, &other, "com/a/Api", &declaring, AccessLevel::Private, false));
    }

    #[test]
    fn package_private_members_stop_at_the_package_boundary() {
        let declaring = concrete_class("com/a/Api", Some("java/lang/Object"));
        let neighbour = concrete_class("com/a/Neighbour", Some("java/lang/Object"));
        let stranger = concrete_class("com/b/Stranger", Some("java/lang/Object"));
        let ctx = context_over(vec![declaring.clone()]);

        assert!(member_accessible(
            &ctx, &neighbour, "com/a/Api", &declaring, AccessLevel::PackagePrivate, false
        ));
        assert!(!member_accessible(
            &ctx, &stranger, "com/a/Api", &declaring, AccessLevel::PackagePrivate, false
        ));
    }

    #[test]
    fn protected_access_requires_the_callers_own_inheritance_line() {
        let declaring = concrete_class("com/a/Base", Some("java/lang/Object"));
        let caller = concrete_class("com/b/Caller", Some("com/a/Base"));
        let sibling = concrete_class("com/c/Sibling", Some("com/a/Base"));
        let ctx = context_over(vec![declaring.clone(), caller.clone(), sibling]);

        // Through itself: fine.
        assert!(member_accessible(
            &ctx, &caller, "com/b/Caller", &declaring, AccessLevel::Protected, false
        ));
        // Through the declaring superclass: fine.
        assert!(member_accessible(
            &ctx, &caller, "com/a/Base", &declaring, AccessLevel::Protected, false
        ));
        // Through an unrelated sibling subtype: flagged.
        assert!(!member_accessible(
            &ctx, &caller, "com/c/Sibling", &declaring, AccessLevel::Protected, false
        ));
        // Static protected members skip the receiver discipline.
        assert!(member_accessible(
            &ctx, &caller, "com/c/Sibling", &declaring, AccessLevel::Protected, true
        ));
    }

    #[test]
    fn protected_access_from_a_non_subclass_is_rejected() {
        let declaring = concrete_class("com/a/Base", Some("java/lang/Object"));
        let stranger = concrete_class("com/b/Stranger", Some("java/lang/Object"));
        let ctx = context_over(vec![declaring.clone(), stranger.clone()]);

        assert!(!member_accessible(
            &ctx, &stranger, "com/a/Base", &declaring, AccessLevel::Protected, false
        ));
    }
}
