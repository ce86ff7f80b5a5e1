use std::io::Write;
use tempfile::{NamedTempFile, TempPath};

pub fn create_file(contents: &str) -> TempPath {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", contents).unwrap();
    file.into_temp_path()
}

/// A request descriptor file for `url`, with the rest of the JSON spliced in.
pub fn request_file(url: &str, rest: &str) -> TempPath {
    let separator = if rest.trim().is_empty() { "" } else { "," };
    create_file(&format!(
        r#"{{"url": "{url}"{separator} {rest}}}"#,
        url = url,
        separator = separator,
        rest = rest
    ))
}
