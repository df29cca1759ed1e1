// On-disk artifact layout for a survey run

use cartograph_engine::aggregate::RunResult;
use cartograph_engine::artifact::{safe_name, ArtifactSink};
use cartograph_engine::Summary;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes run artifacts under a single output directory:
///
/// ```text
/// <output>/
///   00-summary.json
///   01-auth.json
///   02-pages.json
///   03-exchanges.json
///   04-forms.json
///   05-buttons.json
///   06-navigation.json
///   07-css-classes.json
///   08-errors.json
///   html/<page>.html
///   screenshots/<page>.png
/// ```
pub struct FsArtifactWriter {
    root: PathBuf,
}

impl FsArtifactWriter {
    /// Create the output directory tree. Fails if the filesystem refuses.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("html"))?;
        fs::create_dir_all(root.join("screenshots"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_json<T: Serialize>(&self, file: &str, value: &T) -> io::Result<()> {
        let path = self.root.join(file);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        debug!(file = %path.display(), "artifact written");
        Ok(())
    }

    /// Persist the full numbered artifact set for a finished run.
    pub fn persist_run(&self, result: &RunResult, summary: &Summary) -> io::Result<()> {
        self.write_json("00-summary.json", summary)?;
        self.write_json("01-auth.json", &result.session)?;
        self.write_json("02-pages.json", &result.pages)?;
        self.write_json("03-exchanges.json", &result.exchanges)?;
        self.write_json("04-forms.json", &result.forms)?;
        self.write_json("05-buttons.json", &result.buttons)?;
        self.write_json("06-navigation.json", &result.navigation)?;
        self.write_json("07-css-classes.json", &result.css_classes)?;
        self.write_json("08-errors.json", &result.errors)?;
        Ok(())
    }
}

impl ArtifactSink for FsArtifactWriter {
    fn write_html(&self, name: &str, html: &str) -> io::Result<()> {
        let path = self.root.join("html").join(format!("{}.html", safe_name(name)));
        fs::write(path, html)
    }

    fn write_screenshot(&self, name: &str, png: Option<&[u8]>) -> io::Result<()> {
        let Some(bytes) = png else {
            return Ok(());
        };
        let path = self
            .root
            .join("screenshots")
            .join(format!("{}.png", safe_name(name)));
        fs::write(path, bytes)
    }
}
