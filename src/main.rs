use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use classlink::load::load_pool;
use classlink::report::{build_invocation, build_sarif, input_artifact};
use classlink::{
    CachingResolver, CancellationFlag, ExemptionPolicy, PluginDescriptor, PoolResolver, Resolver,
    UnionResolver, verify,
};

/// CLI arguments for classlink execution.
#[derive(Parser, Debug)]
#[command(
    name = "classlink",
    about = "Offline binary-compatibility checks for JVM plugins, reported as SARIF.",
    version
)]
struct Cli {
    /// Plugin artifact to verify, a jar or a class directory.
    #[arg(long, value_name = "PATH")]
    plugin: PathBuf,
    /// Platform class source; may be repeated, earlier entries win.
    #[arg(long, value_name = "PATH")]
    platform: Vec<PathBuf>,
    /// JDK class source; may be repeated. Without one, the standard JDK
    /// namespaces are exempt from not-found findings.
    #[arg(long, value_name = "PATH")]
    jdk: Vec<PathBuf>,
    /// Plugin descriptor (JSON); optional dependencies become exemptions.
    #[arg(long, value_name = "PATH")]
    descriptor: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if !cli.plugin.exists() {
        anyhow::bail!("plugin not found: {}", cli.plugin.display());
    }
    for entry in cli.platform.iter().chain(&cli.jdk) {
        if !entry.exists() {
            anyhow::bail!("class source not found: {}", entry.display());
        }
    }

    let started_at = Instant::now();
    let artifact = load_pool(&cli.plugin)?;
    let platform = build_platform_resolver(&cli.platform, &cli.jdk)?;
    let policy = build_policy(cli.descriptor.as_deref(), cli.jdk.is_empty())?;

    let class_count = artifact.all_names().len();
    let report = verify(artifact, platform, policy, CancellationFlag::new());
    let problem_count = report.occurrence_count();

    let invocation = build_invocation();
    let sarif = build_sarif(&report, vec![input_artifact(&cli.plugin)], invocation);
    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &sarif)
        .context("failed to serialize SARIF output")?;
    writer
        .write_all(b"\n")
        .context("failed to write SARIF output")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} classes={} problems={}",
            started_at.elapsed().as_millis(),
            class_count,
            problem_count
        );
    }

    Ok(())
}

fn build_platform_resolver(platform: &[PathBuf], jdk: &[PathBuf]) -> Result<Arc<dyn Resolver>> {
    let mut children: Vec<Arc<dyn Resolver>> = Vec::new();
    for path in platform.iter().chain(jdk) {
        let pool = load_pool(path)?;
        children.push(Arc::new(PoolResolver::new(pool)));
    }
    Ok(Arc::new(CachingResolver::new(UnionResolver::compose(
        children,
    ))))
}

fn build_policy(descriptor: Option<&Path>, exempt_jdk: bool) -> Result<ExemptionPolicy> {
    let mut policy = match descriptor {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let descriptor: PluginDescriptor = serde_json::from_slice(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            ExemptionPolicy::for_plugin(&descriptor)
        }
        None => ExemptionPolicy::new(),
    };
    if exempt_jdk {
        for package in ["java", "javax", "jdk", "sun", "com/sun"] {
            policy.exempt_package(package);
        }
    }
    Ok(policy)
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}
