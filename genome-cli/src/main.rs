use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use genome::{Archive, GenomeContext, GenomeDriver, GenomeError};

mod builtins;
mod net_file;

#[derive(Parser)]
#[command(name = "genome-cli")]
#[command(about = "Canonicalize periodic nets and look them up in a topology archive")]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Compute a net's topological genome and, optionally, consult or update an archive.
    Analyze {
        net_file: PathBuf,
        #[arg(long)]
        archive: Option<PathBuf>,
        #[arg(long)]
        update: Option<String>,
        #[arg(long)]
        remove: bool,
        /// Skip the translational-reduction pass before canonicalization.
        #[arg(long)]
        no_reduce: bool,
    },
    /// Write a fresh archive seeded from a built-in topology set.
    CreateArchive {
        #[arg(long)]
        from: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Remove an archive file.
    DeleteArchive { path: PathBuf },
}

/// Exit codes, per §6/§7: 0 success, 1 genome unknown, 2 unhandled
/// exception, 3 internal error, 4 invalid input, 5 parse error.
fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();
    match Cli::parse().action {
        Action::Analyze {
            net_file,
            archive,
            update,
            remove,
            no_reduce,
        } => analyze(net_file, archive, update, remove, no_reduce),
        Action::CreateArchive { from, out } => create_archive(from, out),
        Action::DeleteArchive { path } => delete_archive(path),
    }
}

fn analyze(
    net_file: PathBuf,
    archive_path: Option<PathBuf>,
    update: Option<String>,
    remove: bool,
    no_reduce: bool,
) -> ExitCode {
    let text = match fs::read_to_string(&net_file) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, path = %net_file.display(), "failed to read net file");
            return exit_for_report(&format!("cannot read {}: {e}", net_file.display()), 5);
        }
    };

    let net = match net_file::parse_net_file(&text) {
        Ok(n) => n,
        Err(e) => return exit_for_report(&format!("parse error: {e:#}"), 5),
    };

    let ctx = GenomeContext::default();
    let genome_result = match GenomeDriver::run(&net, &ctx, !no_reduce) {
        Ok(r) => r,
        Err(e) => return exit_for_genome_error(&e),
    };

    println!("{}", genome_result.genome);

    let Some(archive_path) = archive_path else {
        return ExitCode::from(0);
    };

    let mut archive = match load_archive(&archive_path) {
        Ok(a) => a,
        Err(e) => return exit_for_report(&format!("{e:#}"), 4),
    };

    if remove {
        archive.remove(&genome_result.genome);
        if let Err(e) = save_archive(&archive_path, &archive) {
            return exit_for_report(&format!("{e:#}"), 3);
        }
        return ExitCode::from(0);
    }

    if let Some(name) = update {
        archive.insert(&genome_result.genome, &name);
        if let Err(e) = save_archive(&archive_path, &archive) {
            return exit_for_report(&format!("{e:#}"), 3);
        }
        return ExitCode::from(0);
    }

    match archive.lookup(&genome_result.genome) {
        Some(names) => {
            println!("{}", names.join(", "));
            ExitCode::from(0)
        }
        None => {
            println!("UNKNOWN");
            ExitCode::from(1)
        }
    }
}

fn create_archive(from: String, out: PathBuf) -> ExitCode {
    let archive = match builtins::builtin_archive(&from) {
        Ok(Some(a)) => a,
        Ok(None) => return exit_for_report(&format!("no such built-in archive '{from}'"), 4),
        Err(e) => return exit_for_report(&format!("{e:#}"), 3),
    };
    if let Err(e) = save_archive(&out, &archive) {
        return exit_for_report(&format!("{e:#}"), 3);
    }
    ExitCode::from(0)
}

fn delete_archive(path: PathBuf) -> ExitCode {
    match fs::remove_file(&path) {
        Ok(()) => ExitCode::from(0),
        Err(e) => exit_for_report(&format!("cannot delete {}: {e}", path.display()), 4),
    }
}

fn load_archive(path: &PathBuf) -> Result<Archive> {
    if !path.exists() {
        return Ok(Archive::new());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Archive::parse(&text).map_err(|e| anyhow::anyhow!(e.to_string()))
}

/// Persist `archive` by writing to a temporary path in the same directory
/// and renaming over `path`, so a crash never leaves a half-written file.
fn save_archive(path: &PathBuf, archive: &Archive) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, archive.render()).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

fn exit_for_report(message: &str, code: u8) -> ExitCode {
    eprintln!("{message}");
    ExitCode::from(code)
}

fn exit_for_genome_error(err: &GenomeError) -> ExitCode {
    tracing::error!(error = %err, "genome computation failed");
    let code = match err {
        GenomeError::InvalidInput(_) => 4,
        GenomeError::UnstableNet => 4,
        GenomeError::NotThreeDimensional => 4,
        GenomeError::ArchiveVersionMismatch { .. } => 4,
        GenomeError::InternalError(_) => 3,
    };
    exit_for_report(&err.to_string(), code)
}
