use std::fs;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{FilesArgs, FilesCommand, ServiceArgs};
use crate::commands::{connect, flush_notices, output};
use crate::console::ConsoleState;
use crate::util::sha256_file;

pub fn run(service: &ServiceArgs, args: FilesArgs) -> Result<()> {
    let api = connect(service)?;
    let mut console = ConsoleState::default();

    match args.command {
        FilesCommand::List => {
            let listed = console.refresh_files(&api).map(|_| ());
            flush_notices(&mut console);
            listed.context("failed to list staged files")?;
            output::write_files(console.files())
        }
        FilesCommand::Upload { paths } => {
            for path in &paths {
                let metadata = fs::metadata(path)
                    .with_context(|| format!("failed to stat {}", path.display()))?;
                if !metadata.is_file() {
                    bail!("not a regular file: {}", path.display());
                }
                info!(
                    path = %path.display(),
                    size_bytes = metadata.len(),
                    sha256 = %sha256_file(path)?,
                    "staging file for upload"
                );
            }

            let uploaded = console.upload_files(&api, &paths);
            flush_notices(&mut console);
            let uploaded = uploaded.context("failed to upload files")?;
            output::write_files(&uploaded)
        }
        FilesCommand::Delete { names } => {
            let deleted = console.delete_files(&api, &names);
            flush_notices(&mut console);
            let response = deleted.context("failed to delete files")?;
            info!(
                deleted = response.deleted,
                skipped = response.skipped,
                "delete finished"
            );
            Ok(())
        }
    }
}
