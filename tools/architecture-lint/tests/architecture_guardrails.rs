//! Runs the lint over source trees laid out on disk.

use std::fs;
use std::path::{Path, PathBuf};

use architecture_lint::{ArchitectureLintError, Violation};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct BackendTree {
    dir: TempDir,
}

impl BackendTree {
    fn backend_dir(&self) -> PathBuf {
        self.dir.path().join("backend")
    }

    fn with(self, file: &str, contents: &str) -> Self {
        let path = self.backend_dir().join("src").join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write source file");
        self
    }

    fn lint(&self) -> Result<(), ArchitectureLintError> {
        architecture_lint::lint_backend_sources(&self.backend_dir())
    }
}

#[fixture]
fn valid_tree() -> BackendTree {
    BackendTree {
        dir: TempDir::new().expect("tempdir"),
    }
    .with(
        "domain/ids.rs",
        "pub struct OrganizationId(i64); impl OrganizationId { pub const fn new(v: i64) -> Self { Self(v) } }",
    )
    .with(
        "outbound/persistence/diesel_organization_mapping_repository.rs",
        "use crate::domain::ids::OrganizationId; use diesel::prelude::*; pub fn find(_id: OrganizationId) {}",
    )
    .with(
        "services.rs",
        "use crate::outbound::persistence::DbPool; use crate::config::HybridCloudSettings;",
    )
    .with("lib.rs", "pub mod domain; pub mod outbound; pub mod services;")
}

fn violations(result: Result<(), ArchitectureLintError>) -> Vec<Violation> {
    match result {
        Err(ArchitectureLintError::Violations(violations)) => violations,
        other => panic!("expected violations, got: {other:?}"),
    }
}

fn has_violation(violations: &[Violation], file: &str, needle: &str) -> bool {
    violations
        .iter()
        .any(|violation| violation.file == Path::new(file) && violation.message.contains(needle))
}

#[rstest]
fn layered_tree_passes(valid_tree: BackendTree) {
    let result = valid_tree.lint();
    assert!(result.is_ok(), "expected success, got: {result:?}");
}

#[rstest]
fn composition_root_is_not_linted(valid_tree: BackendTree) {
    let tree = valid_tree.with(
        "bin/outbox_inspect.rs",
        "use clap::Parser; use hybrid_cloud::services::SiloServices;",
    );
    assert!(tree.lint().is_ok());
}

#[rstest]
fn every_violation_is_reported(valid_tree: BackendTree) {
    let tree = valid_tree
        .with(
            "domain/organization_member/propagator.rs",
            "use crate::outbound::memory::InMemoryStore; fn f() {}",
        )
        .with("domain/outbox.rs", "use diesel_async::AsyncPgConnection; fn f() {}")
        .with(
            "outbound/persistence/pool.rs",
            "use crate::config::HybridCloudSettings; fn f() {}",
        );

    let found = violations(tree.lint());

    assert_eq!(found.len(), 3, "violations: {found:?}");
    assert!(has_violation(
        &found,
        "domain/organization_member/propagator.rs",
        "crate::outbound"
    ));
    assert!(has_violation(
        &found,
        "domain/outbox.rs",
        "external crate `diesel_async`"
    ));
    assert!(has_violation(
        &found,
        "outbound/persistence/pool.rs",
        "crate::config"
    ));
}

#[rstest]
fn unparsable_sources_fail_with_the_file_name(valid_tree: BackendTree) {
    let tree = valid_tree.with("domain/broken.rs", "fn f( {");
    match tree.lint() {
        Err(ArchitectureLintError::Parse { file, .. }) => {
            assert_eq!(file, Path::new("domain/broken.rs"));
        }
        other => panic!("expected parse error, got: {other:?}"),
    }
}
