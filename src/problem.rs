//! Structured binary-incompatibility findings.
//!
//! Findings are data, never control flow: the engine records them and keeps
//! going. Problems compare structurally so the same incompatibility found
//! via different code paths deduplicates, and the report is a multimap from
//! each problem to every location it was observed at.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::model::AccessLevel;

/// Whether a reference expected a class or an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Class => f.write_str("class"),
            ClassKind::Interface => f.write_str("interface"),
        }
    }
}

/// Member category carried by access findings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MemberKind {
    Method,
    Field,
}

/// Severity tier for rendering; every linkage failure is an error, only
/// analysis gaps rank below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One kind of binary incompatibility, with the data needed to render it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Problem {
    ClassNotFound {
        name: String,
    },
    MalformedClass {
        name: String,
        reason: String,
    },
    IncompatibleKindChange {
        name: String,
        expected: ClassKind,
    },
    FinalClassExtended {
        name: String,
    },
    AbstractMethodNotImplemented {
        owner: String,
        name: String,
        descriptor: String,
    },
    MultipleDefaultImplementations {
        name: String,
        descriptor: String,
        owners: Vec<String>,
    },
    MethodNotFound {
        owner: String,
        name: String,
        descriptor: String,
    },
    FieldNotFound {
        owner: String,
        name: String,
        descriptor: String,
    },
    IllegalAccess {
        member: MemberKind,
        owner: String,
        name: String,
        descriptor: String,
        access: AccessLevel,
    },
    InstanceInvokeOnStaticMethod {
        owner: String,
        name: String,
        descriptor: String,
    },
    StaticInvokeOnInstanceMethod {
        owner: String,
        name: String,
        descriptor: String,
    },
    InvokeInterfaceOnPrivateMethod {
        owner: String,
        name: String,
        descriptor: String,
    },
    StaticAccessOnInstanceField {
        owner: String,
        name: String,
    },
    InstanceAccessOnStaticField {
        owner: String,
        name: String,
    },
    FinalFieldModification {
        owner: String,
        name: String,
    },
    AbstractClassInstantiation {
        name: String,
    },
    InterfaceInstantiation {
        name: String,
    },
    FinalMethodOverride {
        owner: String,
        name: String,
        descriptor: String,
    },
}

impl Problem {
    /// Stable rule identifier for report output.
    pub fn rule_id(&self) -> &'static str {
        match self {
            Problem::ClassNotFound { .. } => "CLASS_NOT_FOUND",
            Problem::MalformedClass { .. } => "MALFORMED_CLASS",
            Problem::IncompatibleKindChange { .. } => "INCOMPATIBLE_KIND_CHANGE",
            Problem::FinalClassExtended { .. } => "FINAL_CLASS_EXTENDED",
            Problem::AbstractMethodNotImplemented { .. } => "ABSTRACT_METHOD_NOT_IMPLEMENTED",
            Problem::MultipleDefaultImplementations { .. } => "MULTIPLE_DEFAULT_IMPLEMENTATIONS",
            Problem::MethodNotFound { .. } => "METHOD_NOT_FOUND",
            Problem::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            Problem::IllegalAccess { .. } => "ILLEGAL_ACCESS",
            Problem::InstanceInvokeOnStaticMethod { .. } => "INSTANCE_INVOKE_ON_STATIC_METHOD",
            Problem::StaticInvokeOnInstanceMethod { .. } => "STATIC_INVOKE_ON_INSTANCE_METHOD",
            Problem::InvokeInterfaceOnPrivateMethod { .. } => "INVOKE_INTERFACE_ON_PRIVATE_METHOD",
            Problem::StaticAccessOnInstanceField { .. } => "STATIC_ACCESS_ON_INSTANCE_FIELD",
            Problem::InstanceAccessOnStaticField { .. } => "INSTANCE_ACCESS_ON_STATIC_FIELD",
            Problem::FinalFieldModification { .. } => "FINAL_FIELD_MODIFICATION",
            Problem::AbstractClassInstantiation { .. } => "ABSTRACT_CLASS_INSTANTIATION",
            Problem::InterfaceInstantiation { .. } => "INTERFACE_INSTANTIATION",
            Problem::FinalMethodOverride { .. } => "FINAL_METHOD_OVERRIDE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            // The analysis could not cover the class; everything else is a
            // proven linkage failure.
            Problem::MalformedClass { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::ClassNotFound { name } => write!(f, "class {name} not found"),
            Problem::MalformedClass { name, reason } => {
                write!(f, "class {name} could not be parsed: {reason}")
            }
            Problem::IncompatibleKindChange { name, expected } => {
                let found = match expected {
                    ClassKind::Class => ClassKind::Interface,
                    ClassKind::Interface => ClassKind::Class,
                };
                write!(f, "expected {name} to be a {expected} but found a {found}")
            }
            Problem::FinalClassExtended { name } => {
                write!(f, "final class {name} is extended")
            }
            Problem::AbstractMethodNotImplemented { owner, name, descriptor } => {
                write!(f, "abstract method {owner}.{name}{descriptor} is not implemented")
            }
            Problem::MultipleDefaultImplementations { name, descriptor, owners } => {
                write!(
                    f,
                    "method {name}{descriptor} has multiple default implementations: {}",
                    owners.join(", ")
                )
            }
            Problem::MethodNotFound { owner, name, descriptor } => {
                write!(f, "method {owner}.{name}{descriptor} not found")
            }
            Problem::FieldNotFound { owner, name, descriptor } => {
                write!(f, "field {owner}.{name} of type {descriptor} not found")
            }
            Problem::IllegalAccess { member, owner, name, descriptor, access } => {
                let member = match member {
                    MemberKind::Method => "method",
                    MemberKind::Field => "field",
                };
                write!(
                    f,
                    "illegal access to {access} {member} {owner}.{name}{descriptor}"
                )
            }
            Problem::InstanceInvokeOnStaticMethod { owner, name, descriptor } => {
                write!(f, "instance-style invocation of static method {owner}.{name}{descriptor}")
            }
            Problem::StaticInvokeOnInstanceMethod { owner, name, descriptor } => {
                write!(f, "invokestatic on instance method {owner}.{name}{descriptor}")
            }
            Problem::InvokeInterfaceOnPrivateMethod { owner, name, descriptor } => {
                write!(f, "invokeinterface on private method {owner}.{name}{descriptor}")
            }
            Problem::StaticAccessOnInstanceField { owner, name } => {
                write!(f, "static access to instance field {owner}.{name}")
            }
            Problem::InstanceAccessOnStaticField { owner, name } => {
                write!(f, "instance access to static field {owner}.{name}")
            }
            Problem::FinalFieldModification { owner, name } => {
                write!(f, "final field {owner}.{name} is modified")
            }
            Problem::AbstractClassInstantiation { name } => {
                write!(f, "abstract class {name} is instantiated")
            }
            Problem::InterfaceInstantiation { name } => {
                write!(f, "interface {name} is instantiated")
            }
            Problem::FinalMethodOverride { owner, name, descriptor } => {
                write!(f, "final method {owner}.{name}{descriptor} is overridden")
            }
        }
    }
}

/// Structural position a problem was observed at.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Location {
    Plugin,
    Class {
        class: String,
    },
    Field {
        class: String,
        field: String,
    },
    Method {
        class: String,
        name: String,
        descriptor: String,
    },
}

impl Location {
    pub fn class(class: impl Into<String>) -> Location {
        Location::Class { class: class.into() }
    }

    pub fn field(class: impl Into<String>, field: impl Into<String>) -> Location {
        Location::Field {
            class: class.into(),
            field: field.into(),
        }
    }

    pub fn method(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Location {
        Location::Method {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Plugin => f.write_str("<plugin>"),
            Location::Class { class } => f.write_str(class),
            Location::Field { class, field } => write!(f, "{class}.{field}"),
            Location::Method { class, name, descriptor } => {
                write!(f, "{class}.{name}{descriptor}")
            }
        }
    }
}

/// Finished multimap of problem to every location it was observed at.
///
/// Aggregation is commutative and associative, so the content never depends
/// on traversal or thread scheduling order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProblemReport {
    entries: BTreeMap<Problem, BTreeSet<Location>>,
}

impl ProblemReport {
    pub fn new() -> ProblemReport {
        ProblemReport::default()
    }

    pub fn record(&mut self, problem: Problem, location: Location) {
        self.entries.entry(problem).or_default().insert(location);
    }

    pub fn merge(&mut self, other: ProblemReport) {
        for (problem, locations) in other.entries {
            self.entries.entry(problem).or_default().extend(locations);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct problems.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of (problem, location) observations.
    pub fn occurrence_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn contains(&self, problem: &Problem) -> bool {
        self.entries.contains_key(problem)
    }

    pub fn locations(&self, problem: &Problem) -> Option<&BTreeSet<Location>> {
        self.entries.get(problem)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Problem, &BTreeSet<Location>)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(name: &str) -> Problem {
        Problem::ClassNotFound { name: name.to_string() }
    }

    #[test]
    fn structurally_equal_problems_deduplicate() {
        let mut report = ProblemReport::new();
        report.record(missing("com/a/B"), Location::class("com/a/A"));
        report.record(missing("com/a/B"), Location::class("com/a/A"));
        report.record(missing("com/a/B"), Location::method("com/a/A", "run", "()V"));

        assert_eq!(report.len(), 1);
        assert_eq!(report.occurrence_count(), 2);
    }

    #[test]
    fn merge_is_order_independent() {
        let mut left = ProblemReport::new();
        left.record(missing("com/a/B"), Location::class("com/a/A"));
        let mut right = ProblemReport::new();
        right.record(missing("com/a/C"), Location::class("com/a/A"));
        right.record(missing("com/a/B"), Location::class("com/a/D"));

        let mut forward = left.clone();
        forward.merge(right.clone());
        let mut backward = right;
        backward.merge(left);

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn severity_separates_analysis_gaps_from_linkage_failures() {
        let malformed = Problem::MalformedClass {
            name: "com/a/A".to_string(),
            reason: "bad magic".to_string(),
        };

        assert_eq!(malformed.severity(), Severity::Warning);
        assert_eq!(missing("com/a/B").severity(), Severity::Error);
        assert_eq!(malformed.rule_id(), "MALFORMED_CLASS");
    }
}
