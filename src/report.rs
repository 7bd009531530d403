//! SARIF rendering of a [`ProblemReport`].

use serde_json::json;
use serde_sarif::sarif::{
    Artifact, ArtifactLocation, Invocation, Location as SarifLocation, LogicalLocation, Message,
    Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent, SCHEMA_URL,
};

use crate::problem::{Location, ProblemReport, Severity};

pub fn build_invocation() -> Invocation {
    let arguments: Vec<String> = std::env::args().collect();
    let command_line = arguments.join(" ");

    Invocation::builder()
        .execution_successful(true)
        .arguments(arguments)
        .command_line(command_line)
        .build()
}

pub fn input_artifact(path: &std::path::Path) -> Artifact {
    let location = ArtifactLocation::builder()
        .uri(path.display().to_string())
        .build();
    Artifact::builder().location(location).build()
}

/// Renders the report as one SARIF run, one result per (problem, location)
/// pair. The report already iterates in sorted order, so the output is
/// byte-stable for a given input.
pub fn build_sarif(report: &ProblemReport, artifacts: Vec<Artifact>, invocation: Invocation) -> Sarif {
    let mut results = Vec::new();
    for (problem, locations) in report.iter() {
        let level = match problem.severity() {
            Severity::Warning => ResultLevel::Warning,
            Severity::Error => ResultLevel::Error,
        };
        for location in locations {
            let message = Message::builder().text(problem.to_string()).build();
            results.push(
                SarifResult::builder()
                    .rule_id(problem.rule_id())
                    .level(level)
                    .message(message)
                    .locations(vec![sarif_location(location)])
                    .build(),
            );
        }
    }

    let driver = ToolComponent::builder()
        .name("classlink")
        .information_uri("https://github.com/classlink/classlink")
        .build();
    let tool = Tool {
        driver,
        extensions: None,
        properties: None,
    };
    let run = if artifacts.is_empty() {
        Run::builder()
            .tool(tool)
            .invocations(vec![invocation])
            .results(results)
            .build()
    } else {
        Run::builder()
            .tool(tool)
            .invocations(vec![invocation])
            .results(results)
            .artifacts(artifacts)
            .build()
    };

    Sarif::builder()
        .schema(SCHEMA_URL)
        .runs(vec![run])
        .version(json!("2.1.0"))
        .build()
}

fn sarif_location(location: &Location) -> SarifLocation {
    let logical = match location {
        Location::Plugin => LogicalLocation::builder().name("<plugin>").kind("module").build(),
        Location::Class { class } => LogicalLocation::builder().name(class).kind("type").build(),
        Location::Field { class, field } => LogicalLocation::builder()
            .name(format!("{class}.{field}"))
            .kind("member")
            .build(),
        Location::Method { class, name, descriptor } => LogicalLocation::builder()
            .name(format!("{class}.{name}{descriptor}"))
            .kind("function")
            .build(),
    };
    SarifLocation::builder().logical_locations(vec![logical]).build()
}
