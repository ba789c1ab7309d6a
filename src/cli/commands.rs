use crate::core::Projector;
use crate::error::{CastError, CastResult};
use crate::mapping::Mapping;
use crate::parser;
use crate::types::StructRegistry;
use crate::writer;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::warn;

/// Inputs shared by the cast and watch commands
#[derive(Debug, Clone)]
pub struct CastRequest {
    pub init_file: PathBuf,
    pub header: PathBuf,
    pub views: PathBuf,
    pub target_struct: String,
    pub target_view: String,
    pub mapping: Option<PathBuf>,
    pub output: PathBuf,
    pub postfix: Option<String>,
    pub rename: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Inputs for the validate command
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub init_file: PathBuf,
    pub header: PathBuf,
    pub views: PathBuf,
    pub target_struct: String,
    pub target_view: String,
    pub mapping: Option<PathBuf>,
    pub verbose: bool,
}

fn load_mapping(path: Option<&Path>) -> CastResult<Mapping> {
    match path {
        Some(p) => Mapping::load(p),
        None => Ok(Mapping::new()),
    }
}

fn build_projector(
    header: &Path,
    views: &Path,
    target_struct: &str,
    target_view: &str,
    mapping: Option<&Path>,
) -> CastResult<(Projector, Mapping)> {
    let full = parser::parse_header(header)?;
    let view_reg = parser::parse_header(views)?;
    let mapping = load_mapping(mapping)?;
    let projector = Projector::new(&full, &view_reg, target_struct, target_view, &mapping)?;
    Ok((projector, mapping))
}

/// Execute the cast command: project every declaration of the target struct
/// from the init file onto the view layout and update the output header.
pub fn cast(req: &CastRequest) -> CastResult<()> {
    println!("{}", "🔩 structcast - Casting initializers".bold().green());
    println!("   Init file: {}", req.init_file.display());
    println!(
        "   Project: {} → {}",
        req.target_struct.bright_blue().bold(),
        req.target_view.bright_blue().bold()
    );
    println!("   Output: {}\n", req.output.display());

    if req.dry_run {
        println!(
            "{}",
            "📋 DRY RUN MODE - No changes will be written\n".yellow()
        );
    }

    if req.verbose {
        println!("{}", "📖 Parsing headers...".cyan());
    }

    let (projector, mapping) = build_projector(
        &req.header,
        &req.views,
        &req.target_struct,
        &req.target_view,
        req.mapping.as_deref(),
    )?;

    if req.verbose {
        println!(
            "   Struct '{}' flattens to {} fields",
            req.target_struct,
            projector.flat_fields().len()
        );
        if !mapping.is_empty() {
            println!("   Mapping entries: {}", mapping.len());
        }
        println!();
    }

    let init_text = fs::read_to_string(&req.init_file)?;
    let declarations = parser::extract_declarations(&init_text, &req.target_struct)?;

    if declarations.is_empty() {
        println!(
            "{}",
            format!(
                "⚠️  No initializer declarations of struct '{}' found",
                req.target_struct
            )
            .yellow()
        );
        return Ok(());
    }

    if req.rename.is_some() && declarations.len() > 1 {
        return Err(CastError::Validation(format!(
            "--rename needs exactly one declaration, found {}",
            declarations.len()
        )));
    }

    let postfix = req.postfix.as_deref().unwrap_or("");
    let mut rendered = Vec::new();
    let mut skipped = 0usize;

    for decl in &declarations {
        match projector.project_declaration(decl) {
            Ok(body) => {
                let var = req.rename.as_deref().unwrap_or(&decl.var);
                let text = decl.render(&req.target_struct, var, &body, postfix);
                if req.verbose {
                    println!("   {} {}", "✅".green(), var.bright_blue());
                }
                rendered.push((var.to_string(), text));
            }
            Err(e) => {
                warn!(var = %decl.var, error = %e, "skipping declaration");
                println!(
                    "   {} {} skipped: {}",
                    "⚠️".yellow(),
                    decl.var.bright_blue(),
                    e
                );
                skipped += 1;
            }
        }
    }

    if rendered.is_empty() {
        return Err(CastError::Validation(
            "No declarations could be projected".to_string(),
        ));
    }

    println!();
    if req.dry_run {
        for (_, text) in &rendered {
            println!("{text}");
        }
        println!("\n{}", "📋 Dry run complete - no changes written".yellow());
    } else {
        writer::update_header_file(&req.output, &rendered)?;
        println!("{}", "✅ Cast complete".bold().green());
        println!(
            "   {} declaration(s) written, {} skipped",
            rendered.len(),
            skipped
        );
        println!("   Output: {}", req.output.display());
    }

    Ok(())
}

/// Execute the validate command: check every declaration's value count
/// against the flattened field count, without writing anything.
pub fn validate(req: &ValidateRequest) -> CastResult<()> {
    println!("{}", "✅ structcast - Validating init file".bold().green());
    println!("   Init file: {}\n", req.init_file.display());

    let (projector, _) = build_projector(
        &req.header,
        &req.views,
        &req.target_struct,
        &req.target_view,
        req.mapping.as_deref(),
    )?;
    let expected = projector.flat_fields().len();

    if req.verbose {
        println!(
            "   Struct '{}' flattens to {} fields\n",
            req.target_struct, expected
        );
    }

    let init_text = fs::read_to_string(&req.init_file)?;
    let declarations = parser::extract_declarations(&init_text, &req.target_struct)?;

    if declarations.is_empty() {
        println!(
            "{}",
            format!(
                "⚠️  No initializer declarations of struct '{}' found",
                req.target_struct
            )
            .yellow()
        );
        return Ok(());
    }

    let mut failures = Vec::new();
    for decl in &declarations {
        match projector.project_declaration(decl) {
            Ok(_) => {
                println!("   {} {}", "✅".green(), decl.var.bright_blue());
            }
            Err(e) => {
                println!("   {} {}: {}", "❌".red(), decl.var.bright_blue(), e);
                failures.push(decl.var.clone());
            }
        }
    }

    println!();
    if failures.is_empty() {
        println!(
            "{}",
            format!("✅ All {} declaration(s) are valid!", declarations.len())
                .bold()
                .green()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!("❌ {} of {} declaration(s) failed", failures.len(), declarations.len())
                .bold()
                .red()
        );
        Err(CastError::Validation(format!(
            "Declarations failed validation: {}",
            failures.join(", ")
        )))
    }
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    name: String,
    fields: Vec<crate::types::Field>,
    flattened: Vec<String>,
    flattened_count: usize,
}

fn layout_report(
    registry: &StructRegistry,
    name: &str,
    mapping: &Mapping,
) -> CastResult<LayoutReport> {
    let def = registry
        .get(name)
        .ok_or_else(|| CastError::Validation(format!("Struct '{name}' not found in header")))?;
    let flattened = crate::core::Flattener::new(registry, mapping).flatten(name)?;
    Ok(LayoutReport {
        name: def.name.clone(),
        fields: def.fields.clone(),
        flattened_count: flattened.len(),
        flattened,
    })
}

/// Execute the inspect command: show struct layouts and flattened field lists.
pub fn inspect(
    header: PathBuf,
    struct_name: Option<String>,
    mapping: Option<PathBuf>,
    json: bool,
) -> CastResult<()> {
    let registry = parser::parse_header(&header)?;
    crate::core::check_embedding_cycles(&registry)?;
    let mapping = load_mapping(mapping.as_deref())?;

    let names: Vec<String> = match struct_name {
        Some(name) => vec![name],
        None => registry.names().map(ToString::to_string).collect(),
    };

    let reports = names
        .iter()
        .map(|n| layout_report(&registry, n, &mapping))
        .collect::<CastResult<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports).map_err(|e| {
            CastError::Validation(format!("Failed to serialize layout report: {e}"))
        })?);
        return Ok(());
    }

    println!("{}", "🔍 structcast - Struct layouts".bold().green());
    println!("   Header: {}\n", header.display());

    for report in &reports {
        println!("   📐 {}", report.name.bright_blue().bold());
        for field in &report.fields {
            let dims: String = field.dims.iter().map(|d| format!("[{d}]")).collect();
            println!("      {} {}{}", field.ty.cyan(), field.name, dims);
        }
        println!(
            "      {} {} flattened field(s): {}",
            "→".yellow(),
            report.flattened_count,
            report.flattened.join(", ")
        );
        println!();
    }

    Ok(())
}

/// Execute the watch command: re-run cast (or validate) whenever any of the
/// input files change.
pub fn watch(req: &CastRequest, validate_only: bool) -> CastResult<()> {
    println!("{}", "👁️  structcast - Watch Mode".bold().green());
    println!("   Watching: {}", req.init_file.display());
    println!(
        "   Mode: {}",
        if validate_only { "validate only" } else { "cast" }
    );
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    let mut inputs = vec![req.init_file.clone(), req.header.clone(), req.views.clone()];
    if let Some(mapping) = &req.mapping {
        inputs.push(mapping.clone());
    }

    let mut canonical = Vec::new();
    for input in &inputs {
        if !input.exists() {
            return Err(CastError::Validation(format!(
                "File not found: {}",
                input.display()
            )));
        }
        canonical.push(input.canonicalize()?);
    }

    // One watch per distinct parent directory
    let mut parents = BTreeSet::new();
    for path in &canonical {
        let parent = path.parent().ok_or_else(|| {
            CastError::Validation("Cannot determine parent directory".to_string())
        })?;
        parents.insert(parent.to_path_buf());
    }

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| CastError::Validation(format!("Failed to create file watcher: {e}")))?;

    for parent in &parents {
        debouncer
            .watcher()
            .watch(parent, RecursiveMode::NonRecursive)
            .map_err(|e| CastError::Validation(format!("Failed to watch directory: {e}")))?;
        if req.verbose {
            println!("   {} {}", "Watching directory:".cyan(), parent.display());
        }
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(req, validate_only);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    if event.kind != DebouncedEventKind::Any {
                        return false;
                    }
                    if let Ok(event_canonical) = event.path.canonicalize() {
                        if canonical.contains(&event_canonical) {
                            return true;
                        }
                    }
                    // The file may have been replaced (editor save); match names
                    event.path.file_name().is_some_and(|name| {
                        canonical.iter().any(|c| c.file_name() == Some(name))
                    })
                });

                if relevant {
                    println!("{}", "🔄 Change detected, re-running...".cyan());
                    run_watch_action(req, validate_only);
                    println!();
                }
            }
            Ok(Err(e)) => {
                println!("   {} Watch error: {}", "⚠️".yellow(), e);
            }
            Err(e) => {
                return Err(CastError::Validation(format!(
                    "File watcher channel closed: {e}"
                )));
            }
        }
    }
}

fn run_watch_action(req: &CastRequest, validate_only: bool) {
    let result = if validate_only {
        validate(&ValidateRequest {
            init_file: req.init_file.clone(),
            header: req.header.clone(),
            views: req.views.clone(),
            target_struct: req.target_struct.clone(),
            target_view: req.target_view.clone(),
            mapping: req.mapping.clone(),
            verbose: req.verbose,
        })
    } else {
        cast(req)
    };

    if let Err(e) = result {
        println!("   {} {}", "❌".red(), e);
    }
}
