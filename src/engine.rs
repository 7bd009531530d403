//! Verification driver: walks every class in the plugin artifact in
//! parallel and folds the per-worker findings into one report.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::context::{CancellationFlag, ExemptionPolicy, VerificationContext};
use crate::pool::ClassPool;
use crate::problem::{Location, Problem, ProblemReport};
use crate::resolver::{PoolResolver, Resolver, UnionResolver};
use crate::rules;

/// Checks every class in `artifact` against the platform classes behind
/// `platform`, resolving plugin-internal references through the artifact
/// itself first.
///
/// The traversal is order-independent; [`ProblemReport`] keeps findings
/// sorted, so two runs over the same inputs produce identical output.
pub fn verify(
    artifact: Arc<dyn ClassPool>,
    platform: Arc<dyn Resolver>,
    policy: ExemptionPolicy,
    cancel: CancellationFlag,
) -> ProblemReport {
    let resolver = UnionResolver::compose(vec![
        Arc::new(PoolResolver::new(Arc::clone(&artifact))),
        platform,
    ]);
    let ctx = VerificationContext {
        resolver,
        policy,
        cancel,
    };

    let mut report = artifact
        .all_names()
        .into_par_iter()
        .map(|name| {
            let mut sink = ProblemReport::new();
            if ctx.cancel.is_cancelled() {
                return sink;
            }
            if let Some(class) = artifact.find(&name) {
                rules::check_class(&ctx, &class, &mut sink);
            }
            sink
        })
        .reduce(ProblemReport::new, |mut merged, sink| {
            merged.merge(sink);
            merged
        });

    for entry in artifact.malformed() {
        report.record(
            Problem::MalformedClass {
                name: entry.name.clone(),
                reason: entry.reason.clone(),
            },
            Location::class(&entry.name),
        );
    }

    debug!(
        classes = artifact.all_names().len(),
        problems = report.occurrence_count(),
        "verification finished"
    );
    report
}
