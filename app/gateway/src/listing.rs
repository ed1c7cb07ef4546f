//! Directory listing for `list` requests and `/api/list_dir`.

use protocol::{DirEntry, Listing};
use std::{io, path::Path};

/// List `path`, files first, then directories, each group by name,
/// truncated to `max_items`.
///
/// Never fails: a missing path yields `{error: "path not found"}`, any
/// other failure its io message.
pub async fn list_dir(path: &str, max_items: usize) -> Listing {
    match read_entries(Path::new(path)).await {
        Ok(mut items) => {
            items.sort_by(|a, b| a.is_dir.cmp(&b.is_dir).then_with(|| a.name.cmp(&b.name)));
            items.truncate(max_items);
            Listing::Items { items }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Listing::Error {
            error: "path not found".to_owned(),
        },
        Err(e) => {
            tracing::debug!("listing {path} failed: {e}");
            Listing::Error {
                error: e.to_string(),
            }
        }
    }
}

async fn read_entries(path: &Path) -> io::Result<Vec<DirEntry>> {
    let root = tokio::fs::canonicalize(path).await?;
    let mut dir = tokio::fs::read_dir(&root).await?;

    let mut items = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let is_dir = entry.file_type().await.is_ok_and(|ty| ty.is_dir())
            || tokio::fs::metadata(entry.path())
                .await
                .is_ok_and(|meta| meta.is_dir());
        items.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            path: entry.path().to_string_lossy().into_owned(),
        });
    }
    Ok(items)
}
