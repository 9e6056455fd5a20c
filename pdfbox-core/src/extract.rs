//! Page range to image extraction
//!
//! Wraps the toolkit's `PDFToImage` subcommand: the input PDF is copied to a
//! temp file, images are rendered into a temp directory under a derived
//! file name prefix, and each image is handed to a callback as a reader.
//!
//! ## File naming
//!
//! With `-outputPrefix <dir>/<stem>-` the toolkit writes one file per page,
//! named `<stem>-<page>.<ext>`. Only entries starting with `<stem>-` are
//! reported, in page order.

use crate::cancel::CancelToken;
use crate::error::{BoxError, Error, Result};
use crate::scratch;
use crate::toolkit::ToolkitHandle;
use regex::Regex;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const PDF_TO_IMAGE: &str = "PDFToImage";
const INPUT_PREFIX: &str = "pdfbox-images.";
const OUTPUT_DIR_PREFIX: &str = "pdfbox-images";

/// Page number and extension following the output prefix, e.g. `12.jpg`
static PAGE_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.[^.]*)?$").unwrap());

/// Inclusive, 1-based page range.
///
/// No validation happens here: a range with `start > end` is passed to the
/// toolkit as is and it is up to the toolkit to reject or ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(page: u32) -> Self {
        Self::new(page, page)
    }
}

/// Optional rendering parameters passed through to `PDFToImage`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// `-format`, e.g. `png`; toolkit default is `jpg`
    pub format: Option<String>,
    /// `-dpi`
    pub dpi: Option<u32>,
}

impl ExtractOptions {
    fn push_args(&self, args: &mut Vec<OsString>) {
        if let Some(format) = &self.format {
            args.push("-format".into());
            args.push(format.into());
        }
        if let Some(dpi) = self.dpi {
            args.push("-dpi".into());
            args.push(dpi.to_string().into());
        }
    }
}

/// Final path component of `name` with its extension stripped, if it has a usable one
fn file_stem(name: &str) -> Option<String> {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Derive the output file prefix from a stem
fn output_prefix(stem: &str) -> String {
    format!("{stem}-")
}

/// Page number embedded after `prefix`, if the name follows the toolkit's pattern
fn page_number(file_name: &str, prefix: &str) -> Option<u64> {
    let rest = file_name.strip_prefix(prefix)?;
    PAGE_SUFFIX_REGEX
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Entries of `dir` whose names start with `prefix`, sorted by page number.
///
/// Names without a page number sort after numbered ones, by name.
fn matching_entries(dir: &Path, prefix: &str) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::io(format!("failed to list {}", dir.display()), e))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(format!("failed to list {}", dir.display()), e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) {
            matches.push((name, entry.path()));
        }
    }

    matches.sort_by(|(a, _), (b, _)| {
        let key = |name: &str| (page_number(name, prefix).unwrap_or(u64::MAX), name.to_string());
        key(a).cmp(&key(b))
    });
    Ok(matches)
}

impl ToolkitHandle {
    /// Render pages `range` of the PDF read from `input` and pass each image to `callback`.
    ///
    /// `callback` receives the source identity (`source_name`, or the temp
    /// input's base name when none is given), the image's path relative to
    /// the output directory, and a reader valid only for the duration of the
    /// call. Images are delivered in page order.
    ///
    /// Returns the number of images delivered.
    ///
    /// # Errors
    /// The first callback failure aborts the walk as [`Error::Callback`].
    /// Temp input and output directory are removed in every case.
    pub fn extract_page_images<F>(
        &self,
        cancel: &CancelToken,
        source_name: Option<&str>,
        input: &mut dyn Read,
        range: PageRange,
        options: &ExtractOptions,
        mut callback: F,
    ) -> Result<usize>
    where
        F: FnMut(&CancelToken, &str, &str, &mut dyn Read) -> std::result::Result<(), BoxError>,
    {
        let cancel = self.effective_token(cancel);
        let source_name = source_name.filter(|name| !name.is_empty());

        scratch::with_input_file(
            self.scratch_dir(),
            INPUT_PREFIX,
            ".pdf",
            input,
            &cancel,
            |input_path| {
                scratch::with_dir(self.scratch_dir(), OUTPUT_DIR_PREFIX, |output_dir| {
                    let temp_name = input_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let temp_stem = file_stem(&temp_name).unwrap_or(temp_name);
                    let identity = match source_name {
                        Some(name) => name.to_string(),
                        None => temp_stem.clone(),
                    };
                    // Only a bare stem may land in the prefix; it is joined onto the output dir
                    let stem = source_name.and_then(file_stem).unwrap_or(temp_stem);
                    let prefix = output_prefix(&stem);
                    let abs_prefix = output_dir.join(&prefix);

                    let mut args: Vec<OsString> = vec![
                        "-startPage".into(),
                        range.start.to_string().into(),
                        "-endPage".into(),
                        range.end.to_string().into(),
                        "-outputPrefix".into(),
                        abs_prefix.into_os_string(),
                    ];
                    options.push_args(&mut args);
                    args.push(input_path.as_os_str().to_os_string());

                    self.execute(&cancel, PDF_TO_IMAGE, &args)?;

                    let entries = matching_entries(output_dir, &prefix)?;
                    log::debug!("🖼️  {} produced {} image(s)", PDF_TO_IMAGE, entries.len());

                    for (relative_path, path) in &entries {
                        cancel.check()?;
                        let file = File::open(path).map_err(|e| {
                            Error::io(format!("failed to open '{relative_path}'"), e)
                        })?;
                        let mut reader = BufReader::new(file);
                        callback(&cancel, &identity, relative_path, &mut reader).map_err(
                            |source| Error::Callback {
                                relative_path: relative_path.clone(),
                                source,
                            },
                        )?;
                    }
                    Ok(entries.len())
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_strips_extension_and_directories() {
        assert_eq!(file_stem("report.pdf").as_deref(), Some("report"));
        assert_eq!(file_stem("pdfbox-images.a1B2c3.pdf").as_deref(), Some("pdfbox-images.a1B2c3"));
        assert_eq!(file_stem("scans/archive.v2.pdf").as_deref(), Some("archive.v2"));
        assert_eq!(file_stem("noext").as_deref(), Some("noext"));
        assert_eq!(output_prefix("report"), "report-");
    }

    #[test]
    fn test_file_stem_rejects_names_without_one() {
        assert_eq!(file_stem("/"), None);
        assert_eq!(file_stem(".."), None);
        assert_eq!(file_stem(""), None);
    }

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number("report-3.jpg", "report-"), Some(3));
        assert_eq!(page_number("report-12.png", "report-"), Some(12));
        assert_eq!(page_number("report-12", "report-"), Some(12));
        assert_eq!(page_number("report-cover.jpg", "report-"), None);
        assert_eq!(page_number("other-1.jpg", "report-"), None);
    }

    #[test]
    fn test_entries_sorted_by_page_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc-10.jpg", "doc-2.jpg", "doc-1.jpg", "notes.txt", "doc-cover.jpg"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let names: Vec<String> = matching_entries(dir.path(), "doc-")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names, vec!["doc-1.jpg", "doc-2.jpg", "doc-10.jpg", "doc-cover.jpg"]);
    }

    #[test]
    fn test_options_args() {
        let mut args = Vec::new();
        ExtractOptions::default().push_args(&mut args);
        assert!(args.is_empty());

        let options = ExtractOptions {
            format: Some("png".to_string()),
            dpi: Some(300),
        };
        options.push_args(&mut args);
        assert_eq!(args, vec!["-format", "png", "-dpi", "300"]);
    }
}
