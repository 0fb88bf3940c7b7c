//! Shared fixtures for integration tests
//!
//! Provides a recording [`ToolRunner`] that simulates the downloader and archiver on
//! the filesystem, and (on unix) shell-script stand-ins for the real executables.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use mod_installer::{Result, ToolRunner};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Metalink document describing `c.dat` and `d.dat`
pub const PATCH_META4: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metalink xmlns="urn:ietf:params:xml:ns:metalink">
  <file name="c.dat">
    <url>http://mirror.example/c.dat</url>
  </file>
  <file name="d.dat">
    <url>http://mirror.example/d.dat</url>
  </file>
</metalink>
"#;

/// Runner that records every call and mimics aria2c / 7-Zip side effects
///
/// URLs containing `fail` make the downloader exit 7; archives named `broken*` make the
/// archiver exit 2.
#[derive(Default)]
pub struct FakeTools {
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeTools {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn flag<'a>(args: &'a [String], prefix: &str) -> Option<&'a str> {
        args.iter().find_map(|a| a.strip_prefix(prefix))
    }

    fn download(args: &[String]) -> i32 {
        let url = args.last().unwrap();
        if url.contains("fail") {
            return 7;
        }
        let dir = PathBuf::from(Self::flag(args, "--dir=").unwrap());
        std::fs::create_dir_all(&dir).unwrap();
        let name = url.rsplit('/').next().unwrap();

        if name.ends_with(".meta4") {
            if Self::flag(args, "--follow-metalink=") == Some("mem") {
                std::fs::write(dir.join("c.dat"), "payload of c.dat").unwrap();
                std::fs::write(dir.join("d.dat"), "payload of d.dat").unwrap();
            } else {
                std::fs::write(dir.join(name), PATCH_META4).unwrap();
            }
        } else {
            std::fs::write(dir.join(name), format!("payload of {}", name)).unwrap();
        }
        0
    }

    fn extract(args: &[String]) -> i32 {
        let archive = Path::new(&args[1]);
        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        if name.starts_with("broken") {
            return 2;
        }
        let out = PathBuf::from(Self::flag(args, "-o").unwrap());
        std::fs::write(out.join(format!("{}.extracted", name)), "extracted").unwrap();
        0
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, _program: &Path, args: &[String]) -> Result<i32> {
        self.calls.lock().unwrap().push(args.to_vec());
        if args.first().map(String::as_str) == Some("x") {
            Ok(Self::extract(args))
        } else {
            Ok(Self::download(args))
        }
    }
}

/// Shell stand-in for aria2c
#[cfg(unix)]
const FAKE_ARIA2C: &str = r#"#!/bin/sh
dir=.
url=
follow=false
for arg in "$@"; do
  case "$arg" in
    -h) exit 0 ;;
    --dir=*) dir="${arg#--dir=}" ;;
    --follow-metalink=*) follow="${arg#--follow-metalink=}" ;;
    -*) ;;
    *) url="$arg" ;;
  esac
done
case "$url" in
  *fail*) echo "errorCode=3 Resource not found" >&2; exit 3 ;;
esac
mkdir -p "$dir"
name="${url##*/}"
case "$name" in
  *.meta4)
    if [ "$follow" = "mem" ]; then
      echo "payload of c.dat" > "$dir/c.dat"
      echo "payload of d.dat" > "$dir/d.dat"
    else
      cat > "$dir/$name" <<'EOF'
<?xml version="1.0" encoding="UTF-8"?>
<metalink xmlns="urn:ietf:params:xml:ns:metalink">
  <file name="c.dat"><url>http://mirror.example/c.dat</url></file>
  <file name="d.dat"><url>http://mirror.example/d.dat</url></file>
</metalink>
EOF
    fi
    ;;
  *) echo "payload of $name" > "$dir/$name" ;;
esac
echo "Download complete: $dir/$name"
"#;

/// Shell stand-in for 7za
#[cfg(unix)]
const FAKE_7ZA: &str = r#"#!/bin/sh
[ "$1" = "-h" ] && exit 0
archive="$2"
out=.
for arg in "$@"; do
  case "$arg" in
    -o*) out="${arg#-o}" ;;
  esac
done
name="${archive##*/}"
case "$name" in
  broken*) echo "ERROR: $archive : Can not open the file as archive" >&2; exit 2 ;;
esac
echo "extracted" > "$out/$name.extracted"
echo "Everything is Ok"
"#;

/// Write executable `aria2c` and `7za` stand-ins into `dir`, returning their paths
#[cfg(unix)]
pub fn write_fake_executables(dir: &Path) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).unwrap();
    let mut paths = Vec::new();
    for (name, script) in [("aria2c", FAKE_ARIA2C), ("7za", FAKE_7ZA)] {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        paths.push(path);
    }
    let archiver = paths.pop().unwrap();
    let downloader = paths.pop().unwrap();
    (downloader, archiver)
}
