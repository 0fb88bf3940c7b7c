//! Shared test helpers: a [`ToolRunner`] that records invocations instead of spawning.

use crate::error::Result;
use crate::metalink::parse_metalink_filenames;
use crate::process::ToolRunner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded call to the runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Value of a `--name=value` or `-ovalue` style argument
    pub fn flag_value(&self, prefix: &str) -> Option<&str> {
        self.args.iter().find_map(|a| a.strip_prefix(prefix))
    }

    /// The positional URL of a downloader call
    pub fn url(&self) -> Option<&str> {
        self.args
            .iter()
            .rev()
            .find(|a| !a.starts_with('-') && a.contains("://"))
            .map(String::as_str)
    }

    /// Whether this is an archiver extraction call
    pub fn is_extract(&self) -> bool {
        self.args.first().map(String::as_str) == Some("x")
    }
}

type Behavior = Box<dyn Fn(&Invocation) -> i32 + Send + Sync>;

/// Runner whose exit codes (and side effects) come from a closure
pub(crate) struct ScriptedRunner {
    calls: Mutex<Vec<Invocation>>,
    behavior: Behavior,
}

impl ScriptedRunner {
    pub fn new(behavior: impl Fn(&Invocation) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            behavior: Box::new(behavior),
        }
    }

    /// Every call exits 0 and does nothing
    pub fn succeeding() -> Self {
        Self::new(|_| 0)
    }

    /// Behaves like a working aria2c + 7-Zip pair
    ///
    /// Downloads write `<dir>/<basename>` with the content registered for that basename
    /// (or a placeholder); a followed metalink writes the files it names instead.
    /// Extractions write `<archive name>.extracted` into the output directory.
    pub fn fake_tools(contents: &[(&str, &str)]) -> Self {
        let contents: HashMap<String, String> = contents
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(move |call| fake_tool_effect(call, &contents))
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) fn fake_tool_effect(call: &Invocation, contents: &HashMap<String, String>) -> i32 {
    if call.is_extract() {
        let archive = Path::new(&call.args[1]);
        if let (Some(out), Some(name)) = (call.flag_value("-o"), archive.file_name()) {
            let marker = Path::new(out).join(format!("{}.extracted", name.to_string_lossy()));
            std::fs::write(marker, b"").unwrap();
        }
        return 0;
    }
    if let (Some(dir), Some(url)) = (call.flag_value("--dir="), call.url()) {
        let name = url.rsplit('/').next().unwrap();
        std::fs::create_dir_all(dir).unwrap();

        // Following a metalink fetches the files it names, not the descriptor
        let following = call.args.iter().any(|a| a == "--follow-metalink=mem");
        if following && let Some(xml) = contents.get(name) {
            for file in parse_metalink_filenames(xml, Path::new(name)).unwrap() {
                std::fs::write(Path::new(dir).join(&file), format!("payload of {}", file))
                    .unwrap();
            }
            return 0;
        }

        let body = contents
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("payload of {}", name));
        std::fs::write(Path::new(dir).join(name), body).unwrap();
    }
    0
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<i32> {
        let call = Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
        };
        let code = (self.behavior)(&call);
        self.calls.lock().unwrap().push(call);
        Ok(code)
    }
}

/// A two-file metalink in the Metalink 4 namespace
pub(crate) const SAMPLE_META4: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metalink xmlns="urn:ietf:params:xml:ns:metalink">
  <file name="c.dat">
    <size>14</size>
    <hash type="sha-256">f0ad929cd259957e160ea442eb80986b5f01</hash>
    <url location="us" priority="1">http://mirror-a/c.dat</url>
  </file>
  <file name="d.dat">
    <url priority="1">http://mirror-b/d.dat</url>
  </file>
</metalink>
"#;
