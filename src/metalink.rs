//! Metalink / meta4 descriptor resolution
//!
//! A metalink names one or more files that are only known once the descriptor itself
//! has been fetched. Resolution downloads the descriptor (without following it), then
//! collects the `name` attribute of every `file` element. Namespace prefixes are
//! ignored, so Metalink 3 (`http://www.metalinker.org/`) and Metalink 4
//! (`urn:ietf:params:xml:ns:metalink`) documents both work.

use crate::error::{Error, Result};
use crate::tools::{DownloadRequest, Downloader};
use crate::utils::url_basename;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fetches metalink descriptors and lists the files they describe
#[derive(Clone)]
pub struct MetalinkResolver {
    downloader: Downloader,
}

impl MetalinkResolver {
    /// Create a resolver that fetches descriptors with `downloader`
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }

    /// Download the descriptor at `url` into `download_dir` and return its file names
    ///
    /// # Errors
    ///
    /// - [`Error::DownloadFailed`] if the descriptor cannot be fetched
    /// - [`Error::MetalinkParse`] if it is unreadable or not well-formed XML
    pub async fn resolve(&self, url: &str, download_dir: &Path) -> Result<Vec<String>> {
        let descriptor_path = download_dir.join(url_basename(url));
        tokio::fs::create_dir_all(download_dir).await?;

        let request = DownloadRequest::url(url).into_dir(download_dir);
        let exit_code = self.downloader.download(&request).await?;
        if exit_code != 0 {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                exit_code,
            });
        }

        let bytes = tokio::fs::read(&descriptor_path)
            .await
            .map_err(|e| parse_error(&descriptor_path, format!("cannot read descriptor: {}", e)))?;
        let xml = String::from_utf8(bytes)
            .map_err(|e| parse_error(&descriptor_path, format!("not valid UTF-8: {}", e)))?;

        let names = parse_metalink_filenames(&xml, &descriptor_path)?;
        info!(url, files = ?names, "metalink resolved");
        Ok(names)
    }
}

/// Collect the `name` attribute of every `file` element, in document order
///
/// `source` is only used to label errors.
///
/// # Errors
///
/// Returns [`Error::MetalinkParse`] if the document is not well-formed, has no root
/// element, or contains a `file` element without a `name`.
pub fn parse_metalink_filenames(xml: &str, source: &Path) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                saw_root = true;
                collect_file_name(&e, &mut names, source)?;
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                collect_file_name(&e, &mut names, source)?;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(parse_error(
                    source,
                    format!("at byte {}: {}", reader.buffer_position(), e),
                ));
            }
        }
    }

    if !saw_root {
        return Err(parse_error(source, "document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(parse_error(
            source,
            format!("document ended with {} unclosed element(s)", depth),
        ));
    }

    debug!(source = %source.display(), count = names.len(), "parsed metalink");
    Ok(names)
}

fn collect_file_name(element: &BytesStart<'_>, names: &mut Vec<String>, source: &Path) -> Result<()> {
    if element.local_name().as_ref() != b"file" {
        return Ok(());
    }

    for attr in element.attributes() {
        let attr = attr.map_err(|e| parse_error(source, format!("bad attribute: {}", e)))?;
        if attr.key.local_name().as_ref() == b"name" {
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(source, format!("bad file name: {}", e)))?;
            names.push(value.into_owned());
            return Ok(());
        }
    }

    Err(parse_error(
        source,
        "file element without a name attribute".to_string(),
    ))
}

fn parse_error(path: &Path, reason: String) -> Error {
    Error::MetalinkParse {
        path: PathBuf::from(path),
        reason,
    }
}
