//! File system helpers for building test document roots

use std::fs;
use std::io;
use std::path::Path;

pub struct FileSystemHelper;

impl FileSystemHelper {
    /// Create a minimal HTML page in the served directory.
    pub fn create_html_file(dir: &Path, name: &str, title: &str, body: &str) -> io::Result<()> {
        let content = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
            title, body
        );
        fs::write(dir.join(name), content)
    }

    /// Create a plain text file in the served directory.
    pub fn create_text_file(dir: &Path, name: &str, content: &str) -> io::Result<()> {
        fs::write(dir.join(name), content)
    }
}
