//! Archive Manager - locate or download the pinned PDFBox jar
//!
//! Looks for `pdfbox-app-2.0.26.jar` in the usual places and, on request,
//! downloads it from Maven Central into the user's data directory so later
//! invocations find it there.

use anyhow::{anyhow, bail, Context, Result};
use pdfbox_core::{ToolkitConfig, ARCHIVE_NAME};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Maven Central location of the pinned archive
const MAVEN_BASE: &str = "https://repo1.maven.org/maven2/org/apache/pdfbox/pdfbox-app";
const ARCHIVE_VERSION: &str = "2.0.26";

/// Manages the PDFBox jar for the CLI
pub struct ArchiveManager {
    /// Base directory for pdfbox data (e.g., ~/.local/share/pdfbox)
    data_dir: PathBuf,
}

impl ArchiveManager {
    /// Create a new ArchiveManager using the default data directory
    pub fn new() -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        Ok(Self { data_dir })
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// ~/.local/share/pdfbox on Unix, the local app data dir on Windows
    fn default_data_dir() -> Result<PathBuf> {
        #[cfg(windows)]
        {
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
            Ok(base.join("pdfbox"))
        }

        #[cfg(not(windows))]
        {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
            Ok(home.join(".local").join("share").join("pdfbox"))
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where a downloaded archive is stored
    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(ARCHIVE_NAME)
    }

    pub fn download_url() -> String {
        format!("{MAVEN_BASE}/{ARCHIVE_VERSION}/pdfbox-app-{ARCHIVE_VERSION}.jar")
    }

    /// Locations searched for the archive, in priority order
    fn candidates(&self, config: &ToolkitConfig) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(dir) = &config.archive_dir {
            candidates.push(dir.join(ARCHIVE_NAME));
        }
        // Installed alongside binary
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            candidates.push(dir.join(ARCHIVE_NAME));
        }
        candidates.push(PathBuf::from("jars").join(ARCHIVE_NAME));
        candidates.push(self.archive_path());
        candidates
    }

    /// Find the archive to run.
    ///
    /// An explicit `archive_path` wins and must exist; otherwise the first
    /// existing candidate location is used.
    pub fn find_archive_path(&self, config: &ToolkitConfig) -> Result<PathBuf> {
        if let Some(explicit) = &config.archive_path {
            if explicit.is_file() {
                return Ok(explicit.clone());
            }
            bail!("Archive not found at: {}", explicit.display());
        }

        let candidates = self.candidates(config);
        if let Some(found) = candidates.iter().find(|c| c.is_file()) {
            return Ok(found.clone());
        }

        let searched: Vec<String> = candidates
            .iter()
            .map(|c| format!("  - {}", c.display()))
            .collect();
        Err(anyhow!(
            "Could not find {ARCHIVE_NAME}.\nSearched in:\n{}\n\
             Run `pdfbox fetch-archive` to download it, or pass --jar <path>",
            searched.join("\n")
        ))
    }

    /// Check if a valid archive is already in the data directory
    pub fn is_archive_installed(&self) -> bool {
        let path = self.archive_path();
        path.is_file() && verify_archive(&path).is_ok()
    }

    /// Ensure the archive is in the data directory, downloading if necessary
    pub fn ensure_archive(&self) -> Result<PathBuf> {
        let path = self.archive_path();

        if self.is_archive_installed() {
            println!("✅ Archive found at: {}", path.display());
            return Ok(path);
        }

        println!("📦 Archive not found, downloading PDFBox {ARCHIVE_VERSION}...");
        self.download_and_install()?;

        Ok(path)
    }

    fn download_and_install(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir.display()
            )
        })?;

        let url = Self::download_url();
        println!("   URL: {}", url);

        let temp_path = self.data_dir.join(format!("{ARCHIVE_NAME}.download"));
        self.download_file(&url, &temp_path)?;

        if let Err(e) = verify_archive(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.context("Downloaded file is not a usable jar"));
        }

        let path = self.archive_path();
        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        println!("✅ Archive installed at: {}", path.display());
        Ok(())
    }

    /// Download a file with progress indication
    fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        let response = ureq::get(url)
            .call()
            .with_context(|| format!("Failed to download from {}", url))?;

        let total_size = response
            .header("Content-Length")
            .and_then(|s| s.parse::<u64>().ok());

        let mut reader = response.into_reader();
        let mut file = File::create(dest)
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];
        let mut last_progress = 0;

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])?;
            downloaded += bytes_read as u64;

            // Print progress every 10%
            if let Some(total) = total_size.filter(|t| *t > 0) {
                let progress = ((downloaded * 100) / total) as usize;
                if progress >= last_progress + 10 {
                    print!(
                        "\r   Downloading: {}% ({:.1} MB)",
                        progress,
                        downloaded as f64 / 1_000_000.0
                    );
                    io::stdout().flush()?;
                    last_progress = progress;
                }
            }
        }
        file.flush()?;

        if total_size.is_some() {
            println!("\r   Downloading: 100%                    ");
        }

        Ok(())
    }
}

/// Check that `path` is a jar: a zip archive carrying a manifest
pub fn verify_archive(path: &Path) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Not a zip archive: {}", path.display()))?;
    archive
        .by_name("META-INF/MANIFEST.MF")
        .with_context(|| format!("No META-INF/MANIFEST.MF in {}", path.display()))?;
    Ok(())
}
