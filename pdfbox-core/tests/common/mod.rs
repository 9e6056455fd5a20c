//! Shared fixtures: a fake `java` that understands `-jar <archive> <command>`
//!
//! The script implements just enough of each subcommand to observe what the
//! toolkit handle passes to it. It is written once per test process, before
//! any test can spawn it.

#![allow(dead_code)]

use pdfbox_core::{BytesArchiveProvider, FixedInterpreter, ToolkitConfig, ToolkitHandle};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

const FAKE_JAVA: &str = r#"#!/bin/sh
if [ "$1" != "-jar" ]; then
    echo "usage: java -jar <archive> <command> ..." >&2
    exit 64
fi
if [ ! -f "$2" ]; then
    echo "Error: Unable to access jarfile $2" >&2
    exit 65
fi
if [ "$3" = "Argv" ]; then
    log="$4"
    for a in "$@"; do printf '%s\n' "$a"; done > "$log"
    exit 0
fi
command="$3"
shift 3
case "$command" in
    Size)
        printf '%s %s\n' "$(wc -c < "$1" | tr -d ' ')" "$1" > "$2"
        ;;
    TextToPDF)
        { printf '%%PDF-fake\n'; cat "$2"; } > "$1"
        ;;
    ExtractText)
        if [ "$1" = "-sort" ]; then shift; fi
        if ! head -n 1 "$1" | grep -q '^%PDF'; then
            echo "Error: not a PDF: $1" >&2
            exit 1
        fi
        tail -n +2 "$1" > "$2"
        ;;
    PDFToImage)
        format=jpg
        while [ $# -gt 1 ]; do
            case "$1" in
                -startPage) start="$2"; shift 2 ;;
                -endPage) end="$2"; shift 2 ;;
                -outputPrefix) prefix="$2"; shift 2 ;;
                -format) format="$2"; shift 2 ;;
                -dpi) dpi="$2"; shift 2 ;;
                *) echo "unknown option $1" >&2; exit 1 ;;
            esac
        done
        input="$1"
        case "$format" in
            jpg|png|gif|bmp) ;;
            *) echo "Error: Image format $format is not supported" >&2; exit 1 ;;
        esac
        case "$input" in
            *.pdf) ;;
            *) echo "Error: input must end in .pdf: $input" >&2; exit 1 ;;
        esac
        [ -f "$input" ] || { echo "Error: missing $input" >&2; exit 1; }
        printf 'not an image' > "$(dirname "$prefix")/unrelated.txt"
        i="$start"
        while [ "$i" -le "$end" ]; do
            printf 'page %s' "$i" > "$prefix$i.$format"
            i=$((i + 1))
        done
        if [ "$dpi" = "0" ]; then exec sleep 30; fi
        ;;
    Fail)
        echo "Processing input"
        echo "java.io.IOException: boom" >&2
        exit 3
        ;;
    Sleep)
        echo $$ > "$1"
        exec sleep 30
        ;;
    *)
        echo "Unknown command: $command" >&2
        exit 2
        ;;
esac
"#;

static FAKE_JAVA_DIR: OnceLock<TempDir> = OnceLock::new();

/// Path of the fake interpreter, created on first use
pub fn fake_java() -> PathBuf {
    let dir = FAKE_JAVA_DIR.get_or_init(|| {
        let dir = tempfile::Builder::new()
            .prefix("pdfbox-fake-java")
            .tempdir()
            .unwrap();
        let path = dir.path().join("java");
        std::fs::write(&path, FAKE_JAVA).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        dir
    });
    dir.path().join("java")
}

/// A handle running the fake interpreter with its own scratch directory
pub struct Fixture {
    pub handle: ToolkitHandle,
    pub scratch: TempDir,
    /// Separate directory for files the tests inspect
    pub out: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ToolkitConfig::default())
    }

    pub fn with_config(config: ToolkitConfig) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let config = ToolkitConfig {
            scratch_dir: Some(scratch.path().to_path_buf()),
            ..config
        };
        let handle = ToolkitHandle::create_with_config(
            &BytesArchiveProvider::embedded(b"PK\x03\x04 fake pdfbox"),
            &FixedInterpreter::new(fake_java()),
            &config,
        )
        .unwrap();
        Self {
            handle,
            scratch,
            out,
        }
    }

    pub fn out_path(&self, name: &str) -> PathBuf {
        self.out.path().join(name)
    }

    /// Everything in the scratch directory except the materialized archive
    pub fn leftovers(&self) -> Vec<String> {
        let archive = self.handle.archive_path().file_name().unwrap().to_owned();
        let mut names: Vec<String> = std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| *name != archive)
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
