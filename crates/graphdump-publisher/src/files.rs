//! Filesystem helpers: relocation, compression, statistics and deletion.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use graphdump_core::FileStats;
use tracing::{info, warn};

use crate::error::PipelineError;

/// Suffix appended to compressed artifacts.
pub const COMPRESSED_EXTENSION: &str = "gz";

/// Move a file by copying it and deleting the source.
///
/// Source and destination may live on different devices.
pub async fn move_file(source: &Path, destination: &Path) -> Result<(), PipelineError> {
    tokio::fs::copy(source, destination)
        .await
        .map_err(PipelineError::io(source))?;
    tokio::fs::remove_file(source)
        .await
        .map_err(PipelineError::io(source))?;
    info!(from = %source.display(), to = %destination.display(), "File moved");
    Ok(())
}

/// Gzip `path` into a sibling `<path>.gz`, keeping the original.
///
/// A partially written `.gz` is removed when compression fails.
pub async fn compress(path: &Path) -> Result<PathBuf, PipelineError> {
    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(COMPRESSED_EXTENSION);
    let target = PathBuf::from(target);

    let source = path.to_path_buf();
    let destination = target.clone();
    let result = match tokio::task::spawn_blocking(move || gzip(&source, &destination)).await {
        Ok(result) => result,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        discard(&target).await;
        return Err(e);
    }

    info!(path = %target.display(), "Dump file compressed");
    Ok(target)
}

/// Best-effort removal of an artifact nothing refers to.
pub async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!(path = %path.display(), "Removed unpublished file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove unpublished file"),
    }
}

fn gzip(source: &Path, destination: &Path) -> Result<(), PipelineError> {
    let input = File::open(source).map_err(PipelineError::io(source))?;
    let output = File::create(destination).map_err(PipelineError::io(destination))?;

    let mut reader = BufReader::new(input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::new(6));
    io::copy(&mut reader, &mut encoder).map_err(PipelineError::io(destination))?;
    encoder
        .finish()
        .and_then(|mut writer| io::Write::flush(&mut writer))
        .map_err(PipelineError::io(destination))?;
    Ok(())
}

/// Name, extension, size and creation time of a file.
///
/// Falls back to the modification time on filesystems without birth time.
pub async fn file_stats(path: &Path) -> Result<FileStats, PipelineError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(PipelineError::io(path))?;
    let created = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(FileStats {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
        size: metadata.len(),
        created,
    })
}

pub async fn delete_file(path: &Path) -> Result<(), PipelineError> {
    tokio::fs::remove_file(path)
        .await
        .map_err(PipelineError::io(path))
}
