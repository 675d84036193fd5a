//! Command-line interface module.

mod args;

pub use args::{Cli, Commands};

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;

use crate::cache::CompilationCache;
use crate::config::ReliveConfig;
use crate::log;
use crate::reload::url::fill_placeholders;
use crate::transform::{ModuleTransformer, Strategy, TransformPlan};

/// `relive transform <file>`: print the generated module.
pub fn transform(config: &ReliveConfig, file: &Path, changed: &[String], stamp: &str) -> Result<()> {
    let transformer = ModuleTransformer::new(config);
    let code = match transformer.transform_file(file).into_result() {
        Ok(code) => code,
        Err(err) => bail!(err),
    };

    let code = if changed.is_empty() {
        code
    } else {
        let changed: Vec<&str> = changed.iter().map(String::as_str).collect();
        fill_placeholders(&code, &changed, stamp)
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(code.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// `relive plan <file>`: summarize the transform plan.
pub fn plan(config: &ReliveConfig, file: &Path) -> Result<()> {
    let source = read(file)?;
    let file_id = file.to_string_lossy();
    let plan = ModuleTransformer::new(config).plan(&file_id, &source)?;

    println!("{}", summarize(&plan));
    Ok(())
}

/// `relive key <file>`: print the cache key, one field per line.
pub fn key(config: &ReliveConfig, file: &Path) -> Result<()> {
    let source = read(file)?;
    let cache = CompilationCache::from_config(config);
    let key = cache.key(&file.to_string_lossy(), source.as_bytes(), Some(&config.transform_options()))?;

    const LABELS: [&str; 5] = ["file", "content", "config", "env", "deps"];
    for (label, field) in LABELS.iter().zip(key.fields()) {
        println!("{:>8} {}", label.dimmed(), field);
    }
    log!("key"; "{}", key);
    Ok(())
}

fn read(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn summarize(plan: &TransformPlan) -> String {
    let flags = plan.flags;
    let mut lines = vec![
        format!("strategy     {}", Strategy::for_plan(plan).bright_green()),
        format!(
            "flags        component={} entry={} core={}",
            flags.is_component_file, flags.is_entry_point_file, flags.is_core_definition_file
        ),
        format!("passthrough  {}", plan.passthrough_import_text.len()),
    ];

    for group in &plan.rebindable_groups {
        let names: Vec<_> = group.local_names().collect();
        lines.push(format!("rebindable   {} {{ {} }}", group.source_path, names.join(", ")));
    }
    lines.push(format!("exports      {}", plan.export_text.len()));
    lines.join("\n")
}
