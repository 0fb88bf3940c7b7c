//! Utility functions for URLs, filenames and file placement

use crate::types::DeployAction;
use std::path::Path;

/// Extensions (without the dot) that mark a metalink descriptor
const METALINK_EXTENSIONS: &[&str] = &["meta4", "metalink"];

/// Substrings that route a file to the archiver instead of a plain copy
const ARCHIVE_MARKERS: &[&str] = &[".7z", ".zip"];

/// Last path segment of a URL, i.e. the filename the downloader will save it as
///
/// Query strings and fragments are not part of the name, and percent-escapes are
/// decoded so the result matches the file the downloader writes. Strings that are not
/// valid URLs fall back to everything after the last `/`.
///
/// # Examples
///
/// ```
/// use mod_installer::utils::url_basename;
///
/// assert_eq!(url_basename("http://x/a.7z"), "a.7z");
/// assert_eq!(url_basename("https://host/dir/b.meta4?token=1"), "b.meta4");
/// assert_eq!(url_basename("http://x/My%20Mod.7z"), "My Mod.7z");
/// assert_eq!(url_basename("not a url/c.zip"), "c.zip");
/// ```
#[must_use]
pub fn url_basename(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back())
        && !last.is_empty()
    {
        // Undecodable escapes (not UTF-8) are kept as they appear in the URL
        return urlencoding::decode(last)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| last.to_string());
    }
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Whether `url` points at a `.meta4` / `.metalink` descriptor
#[must_use]
pub fn is_metalink_url(url: &str) -> bool {
    Path::new(&url_basename(url))
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            METALINK_EXTENSIONS
                .iter()
                .any(|m| ext.eq_ignore_ascii_case(m))
        })
}

/// Decide whether a downloaded file is extracted or copied
///
/// Any name containing `.7z` or `.zip` (case-insensitive) is treated as an archive, so
/// multi-part names like `data.7z.001` are extracted too.
///
/// # Examples
///
/// ```
/// use mod_installer::types::DeployAction;
/// use mod_installer::utils::deploy_action;
///
/// assert_eq!(deploy_action("Patch.ZIP"), DeployAction::Extract);
/// assert_eq!(deploy_action("data.7z.001"), DeployAction::Extract);
/// assert_eq!(deploy_action("readme.txt"), DeployAction::Copy);
/// ```
#[must_use]
pub fn deploy_action(filename: &str) -> DeployAction {
    let lower = filename.to_lowercase();
    if ARCHIVE_MARKERS.iter().any(|m| lower.contains(m)) {
        DeployAction::Extract
    } else {
        DeployAction::Copy
    }
}

/// Name a copied file gets at its destination
///
/// Files whose extension starts with `utf` (e.g. `Localization.utf`) are renamed to the
/// same stem with a `.u` extension. Everything else keeps its name.
///
/// # Examples
///
/// ```
/// use mod_installer::utils::copy_target_name;
///
/// assert_eq!(copy_target_name("Engine.utf"), "Engine.u");
/// assert_eq!(copy_target_name("Engine.int"), "Engine.int");
/// ```
#[must_use]
pub fn copy_target_name(filename: &str) -> String {
    let path = Path::new(filename);
    let is_utf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.starts_with("utf"));
    match (is_utf, path.file_stem().and_then(|s| s.to_str())) {
        (true, Some(stem)) => format!("{}.u", stem),
        _ => filename.to_string(),
    }
}

/// Whether two paths name the same existing file
///
/// Returns `false` if either path cannot be resolved (e.g. the destination does not
/// exist yet).
pub async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
