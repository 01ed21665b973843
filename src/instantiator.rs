//! Instantiation pipeline.
//!
//! Loads a template bundle (spec + `Content/` tree), builds the rendering
//! context, applies the spec's conditional inclusion rules, and drives the
//! template engine across directory names, file names, and parametrizable
//! file bodies to materialize the output project.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use chrono::Local;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::SpecError;
use crate::spec::{BootstrappSpec, IncludeRule, Parameter, PLACEHOLDER_FILE_NAME};
use crate::template::{parse_condition, Context, TemplateEngine, Value};

/// Name of the source tree inside a template bundle.
pub const CONTENT_DIR_NAME: &str = "Content";

/// Date-stamped results root used when no output override is given.
const RESULTS_ROOT: &str = "Bootstrapp";

/// Configuration for the instantiation pipeline.
#[derive(Debug, Clone)]
pub struct InstantiatorConfig {
    /// Path to the template bundle.
    pub template_dir: PathBuf,
    /// User-supplied parameter values, keyed by parameter id.
    pub parameters: HashMap<String, String>,
    /// Names of spec-declared packages to leave out.
    pub excluded_packages: Vec<String>,
    /// Optional output directory override.
    pub output_dir: Option<PathBuf>,
    /// Render into a temporary directory and discard the result.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

impl InstantiatorConfig {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            parameters: HashMap::new(),
            excluded_packages: Vec::new(),
            output_dir: None,
            dry_run: false,
            quiet: false,
        }
    }

    pub fn with_parameter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(id.into(), value.into());
        self
    }

    pub fn with_excluded_package(mut self, name: impl Into<String>) -> Self {
        self.excluded_packages.push(name.into());
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// What a pipeline run produced; the interface external tooling consumes.
#[derive(Debug)]
pub struct InstantiationReport {
    /// The materialized output directory. For dry runs this directory is
    /// already gone by the time the report is returned.
    pub output_dir: PathBuf,
    /// Rendered relative paths of every file written, in traversal order.
    pub files_written: Vec<PathBuf>,
    /// The fully built rendering context.
    pub context: Context,
}

/// The instantiation pipeline driver.
pub struct Instantiator {
    config: InstantiatorConfig,
}

impl Instantiator {
    pub fn new(config: InstantiatorConfig) -> Self {
        Self { config }
    }

    /// Runs the complete pipeline: load spec, build context, apply
    /// inclusion rules, prepare the output directory, materialize.
    pub fn run(&self) -> Result<InstantiationReport> {
        self.progress(format_args!(
            "Loading template spec from {}",
            self.config.template_dir.display()
        ));
        let spec = BootstrappSpec::load(&self.config.template_dir)?;
        let context = self.build_context(&spec)?;
        let blacklist = Blacklist::from_spec(&spec, &context)?;
        let patterns = compile_file_patterns(&spec)?;

        let (output_dir, preview_dir) = self.resolve_output_dir(&spec, &context)?;
        self.prepare_output_dir(&output_dir)?;
        let files_written = self.materialize(&context, &blacklist, &patterns, &output_dir)?;

        self.progress(format_args!(
            "Instantiated {} files into {}",
            files_written.len(),
            output_dir.display()
        ));
        if preview_dir.is_some() {
            self.progress(format_args!("Dry run: discarding output directory"));
        }

        Ok(InstantiationReport {
            output_dir,
            files_written,
            context,
        })
    }

    /// Seeds dates, the template version, substitutions, parameters, and
    /// the filtered package list.
    fn build_context(&self, spec: &BootstrappSpec) -> Result<Context> {
        let now = Local::now();
        let mut context = Context::new();
        context.set("CURRENT_YEAR", Value::String(now.format("%Y").to_string()));
        context.set(
            "CURRENT_DATE",
            Value::String(now.format("%Y-%m-%d").to_string()),
        );
        context.set("CURRENT_DATETIME", Value::String(now.to_rfc3339()));
        context.set(
            "CURRENT_TIME",
            Value::String(now.format("%H:%M:%S").to_string()),
        );
        context.set(
            "TEMPLATE_VERSION",
            Value::String(spec.template_version.clone()),
        );
        for (key, value) in &spec.substitutions {
            context.set(key, Value::from(value));
        }
        Parameter::resolve_all(&spec.parameters, &self.config.parameters, &mut context)?;
        let packages = spec
            .retained_packages(&self.config.excluded_packages)
            .into_iter()
            .map(Value::from)
            .collect();
        context.set("packages", Value::List(packages));
        Ok(context)
    }

    /// Picks the output directory: a temporary one for dry runs, the
    /// override when given, otherwise the rendered `outputDirectoryName`
    /// under a date-stamped results root.
    fn resolve_output_dir(
        &self,
        spec: &BootstrappSpec,
        context: &Context,
    ) -> Result<(PathBuf, Option<tempfile::TempDir>)> {
        if self.config.dry_run {
            let preview = tempfile::tempdir().context("failed to create preview directory")?;
            let name = self.rendered_output_name(spec, context)?;
            let output_dir = preview.path().join(name);
            return Ok((output_dir, Some(preview)));
        }
        if let Some(output_dir) = &self.config.output_dir {
            return Ok((output_dir.clone(), None));
        }
        let name = self.rendered_output_name(spec, context)?;
        let stamp = Local::now().format("%Y-%m-%d_%H%M%S").to_string();
        Ok((PathBuf::from(RESULTS_ROOT).join(stamp).join(name), None))
    }

    fn rendered_output_name(&self, spec: &BootstrappSpec, context: &Context) -> Result<String> {
        let engine = self.engine();
        let name = engine
            .render(&spec.output_directory_name, context)
            .context("failed to render outputDirectoryName")?;
        if name.trim().is_empty() {
            bail!("spec declares no outputDirectoryName and no output override was given");
        }
        Ok(name)
    }

    fn prepare_output_dir(&self, output_dir: &Path) -> Result<()> {
        if output_dir.exists() {
            self.progress(format_args!(
                "Removing existing output directory: {}",
                output_dir.display()
            ));
            fs::remove_dir_all(output_dir).with_context(|| {
                format!("failed to remove output directory {}", output_dir.display())
            })?;
        }
        self.progress(format_args!(
            "Creating output directory: {}",
            output_dir.display()
        ));
        fs::create_dir_all(output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;
        Ok(())
    }

    /// Walks `Content/`, rendering directory names first (lexicographic
    /// order, so parents exist before children), then file names and
    /// parametrizable file bodies.
    fn materialize(
        &self,
        context: &Context,
        blacklist: &Blacklist,
        patterns: &[Regex],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let content_root = self.config.template_dir.join(CONTENT_DIR_NAME);
        if !content_root.is_dir() {
            bail!(
                "template bundle has no {} directory: {}",
                CONTENT_DIR_NAME,
                content_root.display()
            );
        }

        let mut directories = Vec::new();
        let mut files = Vec::new();
        for entry in WalkDir::new(&content_root).min_depth(1) {
            let entry =
                entry.with_context(|| format!("failed to walk {}", content_root.display()))?;
            let relative = entry
                .path()
                .strip_prefix(&content_root)
                .with_context(|| format!("failed to relativize {}", entry.path().display()))?
                .to_path_buf();
            if entry.file_type().is_dir() {
                directories.push(relative);
            } else {
                files.push(relative);
            }
        }
        directories.sort();

        let engine = self.engine();

        for relative in &directories {
            if blacklist.excludes_dir(relative) {
                continue;
            }
            let rendered = render_path(&engine, context, relative)?;
            let destination = output_dir.join(&rendered);
            fs::create_dir_all(&destination).with_context(|| {
                format!("failed to create directory {}", destination.display())
            })?;
        }

        let mut files_written = Vec::new();
        for relative in &files {
            if blacklist.excludes_dir(relative) {
                continue;
            }
            if relative
                .file_name()
                .is_some_and(|name| name == PLACEHOLDER_FILE_NAME)
            {
                continue;
            }
            if blacklist.excludes_file(relative) {
                continue;
            }

            let rendered = render_path(&engine, context, relative)?;
            let destination = output_dir.join(&rendered);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory {}", parent.display())
                })?;
            }

            let source_path = content_root.join(relative);
            let basename = Path::new(&rendered)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            if patterns.iter().any(|pattern| pattern.is_match(&basename)) {
                match fs::read_to_string(&source_path) {
                    Ok(source) => {
                        let body = engine.render(&source, context).with_context(|| {
                            format!("failed to render {}", relative.display())
                        })?;
                        fs::write(&destination, body).with_context(|| {
                            format!("failed to write {}", destination.display())
                        })?;
                    }
                    // Not valid UTF-8 after all: fall back to a byte copy.
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        copy_verbatim(&source_path, &destination)?;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| {
                            format!("failed to read {}", source_path.display())
                        })
                    }
                }
            } else {
                copy_verbatim(&source_path, &destination)?;
            }

            self.progress(format_args!("Generated file: {}", destination.display()));
            files_written.push(PathBuf::from(rendered));
        }

        Ok(files_written)
    }

    fn engine(&self) -> TemplateEngine {
        TemplateEngine::new(self.config.template_dir.join(CONTENT_DIR_NAME))
    }

    fn progress(&self, message: std::fmt::Arguments<'_>) {
        if !self.config.quiet {
            println!("{}", message);
        }
    }
}

fn render_path(engine: &TemplateEngine, context: &Context, relative: &Path) -> Result<String> {
    engine
        .render(&relative.to_string_lossy(), context)
        .with_context(|| format!("failed to render path {}", relative.display()))
}

/// Copies source bytes verbatim, preserving metadata.
fn copy_verbatim(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    Ok(())
}

fn compile_file_patterns(spec: &BootstrappSpec) -> Result<Vec<Regex>, SpecError> {
    spec.parametrizable_files
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                SpecError::InvalidFilePattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// Relative paths excluded from traversal because their governing
/// condition evaluated false.
#[derive(Debug, Default)]
struct Blacklist {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl Blacklist {
    fn from_spec(spec: &BootstrappSpec, context: &Context) -> Result<Self, SpecError> {
        let mut blacklist = Self::default();
        for rule in &spec.include_directories {
            if !rule_applies(rule, context)? {
                blacklist
                    .directories
                    .extend(rule.directories.iter().map(PathBuf::from));
            }
        }
        for rule in &spec.include_files {
            if !rule_applies(rule, context)? {
                blacklist.files.extend(rule.files.iter().map(PathBuf::from));
            }
        }
        Ok(blacklist)
    }

    /// A directory entry blacklists itself and everything beneath it.
    fn excludes_dir(&self, path: &Path) -> bool {
        self.directories.iter().any(|dir| path.starts_with(dir))
    }

    fn excludes_file(&self, path: &Path) -> bool {
        self.files.iter().any(|file| file == path)
    }
}

fn rule_applies(rule: &IncludeRule, context: &Context) -> Result<bool, SpecError> {
    let condition =
        parse_condition(&rule.condition).map_err(|source| SpecError::InvalidCondition {
            condition: rule.condition.clone(),
            source,
        })?;
    Ok(condition.evaluate(context))
}
