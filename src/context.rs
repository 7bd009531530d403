//! Per-run verification state: resolver, exemption policy, cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::plugin::PluginDescriptor;
use crate::resolver::Resolver;

/// Names whose failure to resolve must be silently tolerated.
///
/// Covers classes of dependencies the artifact declares optional and
/// baselines deliberately excluded from the check. The policy suppresses
/// only not-found findings; once a symbol resolves, every other rule still
/// applies to it.
#[derive(Clone, Debug, Default)]
pub struct ExemptionPolicy {
    package_prefixes: Vec<String>,
    classes: Vec<String>,
}

impl ExemptionPolicy {
    pub fn new() -> ExemptionPolicy {
        ExemptionPolicy::default()
    }

    /// Exempt every class under a package prefix (binary-name form).
    pub fn exempt_package(&mut self, package: impl Into<String>) {
        let mut prefix = package.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.package_prefixes.push(prefix);
    }

    pub fn exempt_class(&mut self, class: impl Into<String>) {
        self.classes.push(class.into());
    }

    /// Policy derived from a descriptor: optional dependencies' packages
    /// are exempt.
    pub fn for_plugin(descriptor: &PluginDescriptor) -> ExemptionPolicy {
        let mut policy = ExemptionPolicy::new();
        for dependency in &descriptor.dependencies {
            if dependency.optional {
                policy.exempt_package(dependency.package_prefix());
            }
        }
        policy
    }

    pub fn is_exempt(&self, class_name: &str) -> bool {
        self.classes.iter().any(|class| class == class_name)
            || self
                .package_prefixes
                .iter()
                .any(|prefix| class_name.starts_with(prefix.as_str()))
    }
}

/// Externally triggered abort, checked at class-traversal granularity.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> CancellationFlag {
        CancellationFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Read-only state shared by every rule during one verification run.
///
/// Constructed before traversal and never mutated by it; findings flow
/// through per-worker sinks instead.
pub struct VerificationContext {
    pub resolver: Arc<dyn Resolver>,
    pub policy: ExemptionPolicy,
    pub cancel: CancellationFlag,
}

impl VerificationContext {
    pub fn new(resolver: Arc<dyn Resolver>, policy: ExemptionPolicy) -> VerificationContext {
        VerificationContext {
            resolver,
            policy,
            cancel: CancellationFlag::new(),
        }
    }
}
