//! Static file lookup shared by the HTTP routes and the image acquirer.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// Directories mounted under the static root, each at `/<name>/`.
pub const STATIC_MOUNTS: [&str; 3] = ["assets", "views", "controllers"];

/// Page served at `/`.
pub const INDEX_PAGE: &str = "views/index.html";

/// Resolves a request path under `root`.
///
/// Returns `None` for anything that could escape the root: parent
/// components, absolute segments or drive prefixes. A leading `/` is
/// treated as relative to the root.
#[instrument(skip(root), fields(root = %root.display()))]
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                debug!("Rejected path outside static root");
                return None;
            }
        }
    }
    Some(resolved)
}

/// MIME type for a file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Whether a MIME type names an image.
pub fn is_image(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("image/")
}
