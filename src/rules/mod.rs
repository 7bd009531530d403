//! Compatibility rules, split by the granularity they work at: class
//! hierarchy shape, member metadata, and individual instructions.

use std::sync::Arc;

use crate::context::VerificationContext;
use crate::model::BinaryClass;
use crate::problem::ProblemReport;

pub(crate) mod access;
pub(crate) mod class_level;
pub(crate) mod instructions;
pub(crate) mod lookup;
pub(crate) mod members;

/// Runs every rule against one class, appending findings to `sink`.
pub(crate) fn check_class(
    ctx: &VerificationContext,
    class: &Arc<BinaryClass>,
    sink: &mut ProblemReport,
) {
    class_level::check(ctx, class, sink);
    for field in &class.fields {
        members::check_field(ctx, class, field, sink);
    }
    for method in &class.methods {
        members::check_method(ctx, class, method, sink);
        for instruction in &method.instructions {
            instructions::check(ctx, class, method, instruction, sink);
        }
    }
}
