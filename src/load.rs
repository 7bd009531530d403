//! Building class pools from jar archives and class directories.
//!
//! All classes are parsed eagerly here so that lookups later on are
//! infallible. I/O failures while reading a source are fatal for the run;
//! treating an unreadable source as empty would manufacture false
//! not-found findings. Individual malformed classes are collected per pool
//! instead of failing the whole source.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::classfile;
use crate::model::BinaryClass;
use crate::pool::{ClassPool, MalformedEntry, ParsedPool};

/// Build a pool from a path, dispatching on its kind: a directory tree of
/// `.class` files or a `.jar`/`.zip` archive.
pub fn load_pool(path: &Path) -> Result<Arc<dyn ClassPool>> {
    if path.is_dir() {
        return load_dir_pool(path).map(|pool| Arc::new(pool) as Arc<dyn ClassPool>);
    }
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match extension {
        "jar" | "zip" => load_jar_pool(path).map(|pool| Arc::new(pool) as Arc<dyn ClassPool>),
        _ => anyhow::bail!("unsupported class source: {}", path.display()),
    }
}

/// Pool over the `.class` entries of a jar archive.
pub fn load_jar_pool(path: &Path) -> Result<ParsedPool> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;

    let mut entry_names = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if name.ends_with(".class") && !name.ends_with("module-info.class") {
            entry_names.push(name);
        }
    }
    entry_names.sort();

    let origin = path.display().to_string();
    let mut classes = BTreeMap::new();
    let mut malformed = Vec::new();
    for name in entry_names {
        let mut entry = archive
            .by_name(&name)
            .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
        index_class(&origin, entry_class_name(&name), &data, &mut classes, &mut malformed);
    }

    tracing::debug!(
        origin = %origin,
        classes = classes.len(),
        malformed = malformed.len(),
        "loaded jar pool"
    );
    Ok(ParsedPool::from_parts(origin, classes, malformed))
}

/// Pool over all `.class` files below a directory root.
pub fn load_dir_pool(root: &Path) -> Result<ParsedPool> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry =
            entry.with_context(|| format!("failed to walk directory {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let name = path.to_string_lossy().to_string();
        if name.ends_with(".class") && !name.ends_with("module-info.class") {
            paths.push(path);
        }
    }
    paths.sort();

    let origin = root.display().to_string();
    let mut classes = BTreeMap::new();
    let mut malformed = Vec::new();
    for path in paths {
        let data =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let fallback = entry_class_name(&relative.to_string_lossy().replace('\\', "/"));
        index_class(&origin, fallback, &data, &mut classes, &mut malformed);
    }

    tracing::debug!(
        origin = %origin,
        classes = classes.len(),
        malformed = malformed.len(),
        "loaded directory pool"
    );
    Ok(ParsedPool::from_parts(origin, classes, malformed))
}

/// Parse one class and index it under its declared name; the entry-derived
/// name is only a fallback for reporting parse failures.
fn index_class(
    origin: &str,
    fallback_name: String,
    data: &[u8],
    classes: &mut BTreeMap<String, Arc<BinaryClass>>,
    malformed: &mut Vec<MalformedEntry>,
) {
    match classfile::parse(data) {
        Ok(class) => {
            classes.insert(class.name.clone(), Arc::new(class));
        }
        Err(error) => {
            tracing::warn!(origin = %origin, class = %fallback_name, %error, "malformed class");
            malformed.push(MalformedEntry {
                name: fallback_name,
                reason: error.to_string(),
            });
        }
    }
}

fn entry_class_name(entry_name: &str) -> String {
    entry_name.trim_end_matches(".class").to_string()
}
