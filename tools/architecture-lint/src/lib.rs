//! Repo-local lint for the hybrid-cloud crate's hexagonal boundaries.
//!
//! The backend keeps its business rules in `domain` (entities, services and
//! ports) and its storage adapters in `outbound`. `services` wires the two
//! together per silo and is the only module allowed to see both. The lint:
//!
//! - forbids `domain` code from depending on `outbound`, the composition
//!   root (`services`), process configuration, or storage and process
//!   crates such as Diesel and clap
//! - forbids `outbound` adapters from depending on the composition root or
//!   process configuration
//!
//! Files outside the two layers (`lib.rs`, `services.rs`, binaries) are not
//! linted. Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name of the linted crate, as seen from its own binaries.
const CRATE_NAME: &str = "hybrid_cloud";

/// Top-level modules of the linted crate.
const CRATE_MODULES: [&str; 5] = ["domain", "outbound", "services", "config", "telemetry"];

/// What one layer may not reach.
struct LayerRule {
    layer: &'static str,
    modules: &'static [&'static str],
    crates: &'static [&'static str],
}

const RULES: [LayerRule; 2] = [
    LayerRule {
        layer: "domain",
        modules: &["outbound", "services", "config", "telemetry"],
        crates: &[
            "bb8",
            "clap",
            "color_eyre",
            "diesel",
            "diesel_async",
            "diesel_migrations",
            "ortho_config",
            "pg_embedded_setup_unpriv",
            "postgres",
            "tracing_subscriber",
        ],
    },
    LayerRule {
        layer: "outbound",
        modules: &["services", "config", "telemetry"],
        crates: &["clap", "color_eyre", "ortho_config", "tracing_subscriber"],
    },
];

impl LayerRule {
    fn for_file(file: &Path) -> Option<&'static Self> {
        let first = file.components().next()?.as_os_str().to_str()?;
        RULES.iter().find(|rule| rule.layer == first)
    }

    fn check(&self, path: &[String]) -> Option<String> {
        match Dependency::classify(path)? {
            Dependency::Module(root) if self.modules.contains(&root) => Some(format!(
                "{} module must not depend on crate::{root}",
                self.layer
            )),
            Dependency::Crate(root) if self.crates.contains(&root) => Some(format!(
                "{} module must not depend on external crate `{root}`",
                self.layer
            )),
            _ => None,
        }
    }
}

/// The root a path resolves to.
enum Dependency<'a> {
    Module(&'a str),
    Crate(&'a str),
}

impl<'a> Dependency<'a> {
    fn classify(path: &'a [String]) -> Option<Self> {
        let first = path.first()?.as_str();
        match first {
            "crate" | "self" | "super" => path
                .iter()
                .map(String::as_str)
                .find(|segment| !matches!(*segment, "crate" | "self" | "super"))
                .map(Self::Module),
            CRATE_NAME => path.get(1).map(|segment| Self::Module(segment.as_str())),
            // Single-segment paths are locals such as `config`, not modules.
            root if path.len() > 1 && CRATE_MODULES.contains(&root) => Some(Self::Module(root)),
            root => Some(Self::Crate(root)),
        }
    }
}

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// A file could not be parsed or placed in a layer.
    Parse { file: PathBuf, message: String },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error while linting architecture: {err}"),
            Self::Parse { file, message } => {
                write!(f, "cannot lint {}: {message}", file.display())
            }
            Self::Violations(violations) => {
                writeln!(f, "{} architecture boundary violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "- {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

/// Lint the crate sources under `backend_dir/src`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for rule in &RULES {
        let dir = src_dir.join(rule.layer);
        if dir.is_dir() {
            collect_sources(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint in-memory sources. Every file must live in a linted layer.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let rule = LayerRule::for_file(&source.file).ok_or_else(|| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: "file is not in a linted layer".to_owned(),
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;

        let mut collector = PathCollector::default();
        collector.visit_file(&parsed);
        let messages: BTreeSet<String> = collector
            .paths
            .iter()
            .filter_map(|path| rule.check(path))
            .collect();
        violations.extend(messages.into_iter().map(|message| Violation {
            file: source.file.clone(),
            message,
        }));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// Every path mentioned by a file, with `use` trees flattened.
#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn flatten_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.flatten_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                self.insert(prefix.iter().cloned().chain([ident.to_string()]));
            }
            syn::UseTree::Glob(_) => {
                self.insert(prefix.iter().cloned().chain(["*".to_owned()]));
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.flatten_use(item, prefix);
                }
            }
        }
    }

    fn insert(&mut self, segments: impl Iterator<Item = String>) {
        let path: Vec<String> = segments.collect();
        if !path.is_empty() {
            self.paths.insert(path);
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        self.insert(node.segments.iter().map(|segment| segment.ident.to_string()));
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.flatten_use(&node.tree, &mut Vec::new());
    }
}

fn collect_sources(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let file = path
                .strip_prefix(src_root)
                .map_err(|err| ArchitectureLintError::Parse {
                    file: path.clone(),
                    message: err.to_string(),
                })?
                .to_path_buf();
            let contents = fs::read_to_string(&path)?;
            sources.push(LintSource { file, contents });
        }
    }
    Ok(())
}
