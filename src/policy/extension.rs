//! Extension check: cheap pre-fetch filter for non-HTML resources

use std::collections::HashSet;

/// Binary, media, document and archive suffixes never worth fetching
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "ppsx", "png", "tif", "tiff", "mid", "mp2",
    "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps",
    "eps", "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe",
    "bz2", "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1",
    "thmx", "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar",
    "gz",
];

/// Set of lowercase suffixes rejected by the extension check
#[derive(Debug, Clone)]
pub struct ExtensionBlocklist {
    extensions: HashSet<String>,
}

impl ExtensionBlocklist {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Returns the blocked suffix of `path`, if any
    pub fn blocked_extension(&self, path: &str) -> Option<String> {
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = last_segment.rsplit_once('.')?;
        let ext = ext.to_lowercase();

        self.extensions.contains(&ext).then_some(ext)
    }
}

impl Default for ExtensionBlocklist {
    fn default() -> Self {
        Self::new(BLOCKED_EXTENSIONS)
    }
}
