use std::io;

/// Destination for per-page artifacts. Implemented by the on-disk writer
/// in the core crate; the engine only knows the contract.
pub trait ArtifactSink {
    fn write_html(&self, name: &str, html: &str) -> io::Result<()>;

    /// Screenshot slot. Engines without a rendering surface pass `None`
    /// and the writer skips the file.
    fn write_screenshot(&self, name: &str, png: Option<&[u8]>) -> io::Result<()>;
}

/// Discards everything. Used in tests and dry runs.
pub struct NullSink;

impl ArtifactSink for NullSink {
    fn write_html(&self, _name: &str, _html: &str) -> io::Result<()> {
        Ok(())
    }

    fn write_screenshot(&self, _name: &str, _png: Option<&[u8]>) -> io::Result<()> {
        Ok(())
    }
}

/// Filesystem-safe version of a page name: anything outside
/// `[A-Za-z0-9-]` becomes `-`.
pub fn safe_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    if safe.is_empty() { "page".to_string() } else { safe }
}
