//! Offline binary-compatibility verification for JVM plugins.
//!
//! A plugin artifact is checked against the class pools of a target
//! platform without executing any code: every symbolic reference the
//! plugin's class files carry is resolved the way the runtime would link
//! it, and each failure mode becomes a structured [`Problem`] at the
//! locations that triggered it.

pub mod classfile;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod load;
pub mod model;
pub mod plugin;
pub mod pool;
pub mod problem;
pub mod report;
pub mod resolver;

mod rules;

#[cfg(test)]
mod fixtures;

pub use context::{CancellationFlag, ExemptionPolicy, VerificationContext};
pub use engine::verify;
pub use model::BinaryClass;
pub use plugin::PluginDescriptor;
pub use pool::{ClassPool, ParsedPool, UnionPool};
pub use problem::{Location, Problem, ProblemReport, Severity};
pub use resolver::{CachingResolver, PoolResolver, Resolver, UnionResolver};
