//! CLI entry point for the hexagonal boundary lint.
//!
//! Lints `backend/` under the workspace root, or the crate directory given
//! as the first argument.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(backend_dir) = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| workspace_root().map(|root| root.join("backend")))
    else {
        let _ = writeln!(
            io::stderr().lock(),
            "unable to locate workspace root (directory containing a workspace Cargo.toml)"
        );
        return ExitCode::FAILURE;
    };

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr().lock(), "{err}");
            ExitCode::FAILURE
        }
    }
}

fn workspace_root() -> Option<PathBuf> {
    let starts = [
        std::env::var_os("CARGO_WORKSPACE_DIR").map(PathBuf::from),
        std::env::current_dir().ok(),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];
    starts
        .iter()
        .flatten()
        .find_map(|start| find_workspace_root(start))
}

fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            fs::read_to_string(dir.join("Cargo.toml"))
                .is_ok_and(|contents| contents.contains("[workspace]"))
        })
        .map(Path::to_path_buf)
}
