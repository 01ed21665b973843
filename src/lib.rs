//! # Bootstrapp: template engine & project instantiator
//!
//! Bootstrapp materializes a project from a parameterized template bundle:
//! a directory holding a `Bootstrapp.json` spec and a `Content/` source
//! tree. It uses a pipeline approach:
//!
//! 1. **Spec loading**: `Bootstrapp.json` declares substitutions,
//!    parameters, packages, inclusion rules, and parametrizable files
//! 2. **Context building**: date values, the template version,
//!    substitutions, resolved parameters, and the filtered package list
//!    become one dynamic mapping
//! 3. **Traversal**: the `Content/` tree is walked, spec-derived
//!    blacklists are applied, and every kept name is rendered as a
//!    template
//! 4. **Rendering**: parametrizable file bodies run through the `<{ }>`
//!    template engine; everything else is copied byte-for-byte
//!
//! ## Quick Start
//!
//! ```ignore
//! use bootstrapp::{Instantiator, InstantiatorConfig};
//!
//! let config = InstantiatorConfig::new("templates/swift-app")
//!     .with_parameter("projectName", "MyApp");
//! let report = Instantiator::new(config).run()?;
//! println!("wrote {} files", report.files_written.len());
//! ```
//!
//! ## Modules
//!
//! - [`template`]: the template language: scanner, condition sub-language,
//!   tag parser, lexer with newline elision, node tree, renderer
//! - [`spec`]: the `Bootstrapp.json` model and parameter resolution
//! - [`instantiator`]: the pipeline driving the engine across a bundle
//! - [`error`]: template and spec error types

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser as ClapParser;

pub mod error;
pub mod instantiator;
pub mod spec;
pub mod template;

// Re-exports for convenience
pub use crate::error::{SpecError, TemplateError};
pub use crate::instantiator::{InstantiationReport, Instantiator, InstantiatorConfig};
pub use crate::spec::BootstrappSpec;
pub use crate::template::{Context, TemplateEngine, Value};

/// Instantiate a project from a Bootstrapp template bundle
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the template bundle (contains Bootstrapp.json and Content/)
    pub template_dir: PathBuf,

    /// Set a parameter value (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Exclude a spec-declared package (repeatable)
    #[arg(long = "exclude-package", value_name = "NAME")]
    pub exclude_packages: Vec<String>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Render into a temporary directory and discard the result
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the instantiation pipeline with the given CLI arguments
pub fn run(cli: Cli) -> Result<()> {
    let mut config = InstantiatorConfig::new(cli.template_dir)
        .with_dry_run(cli.dry_run)
        .with_quiet(cli.quiet);

    for param in &cli.params {
        let Some((key, value)) = param.split_once('=') else {
            bail!("invalid --param '{}': expected KEY=VALUE", param);
        };
        config = config.with_parameter(key, value);
    }
    for name in cli.exclude_packages {
        config = config.with_excluded_package(name);
    }
    if let Some(output_dir) = cli.output_dir {
        config = config.with_output_dir(output_dir);
    }

    Instantiator::new(config).run()?;
    Ok(())
}
