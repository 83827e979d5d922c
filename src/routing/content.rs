use super::{is_static_segment, I18nMapper, MapperError, RouteSpec};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Register a route for every `.html` page under `roots`.
///
/// A page at `<root>/a/b.html` is named and served as `/a/b.html`, handled by
/// `main`/`content` with the absolute file path as the `path` parameter.
/// Hidden files and anything inside hidden directories are skipped, as are
/// files whose names would read as route placeholders. Symlinks are
/// followed. Returns the number of pages registered.
pub fn connect_content(map: &mut I18nMapper, roots: &[PathBuf]) -> Result<usize, MapperError> {
    let mut count = 0;

    for root in roots {
        if !root.is_dir() {
            debug!("Content directory {:?} not found, skipping", root);
            continue;
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());

        for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable content entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            if !is_page(relative) {
                continue;
            }

            let Some(url) = web_path(relative) else {
                warn!("Skipping content file with a non UTF-8 name: {:?}", entry.path());
                continue;
            };
            if !is_static_segment(&url) {
                warn!("Skipping content file with a placeholder in its name: {:?}", entry.path());
                continue;
            }
            debug!("Content page {} -> {:?}", url, entry.path());
            map.connect(
                RouteSpec::named(url.clone(), url)
                    .controller("main")
                    .action("content")
                    .param("path", entry.path().to_string_lossy()),
            )?;
            count += 1;
        }
    }

    Ok(count)
}

/// `.html` files with no hidden component in their relative path.
fn is_page(relative: &Path) -> bool {
    let hidden = relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    });
    !hidden && relative.extension().map(|ext| ext == "html").unwrap_or(false)
}

fn web_path(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(format!("/{}", parts.join("/")))
}
