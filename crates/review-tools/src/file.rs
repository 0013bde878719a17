use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileToolError {
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

pub fn read_file(path: &str) -> Result<String, FileToolError> {
    if !Path::new(path).is_file() {
        return Err(FileToolError::NotAFile(path.to_string()));
    }
    std::fs::read_to_string(path).map_err(|source| FileToolError::Io { path: path.to_string(), source })
}

/// Lists files (not directories) directly under `path` matching `pattern`
/// (default `*`), sorted by name, newline-joined.
pub fn list_directory(path: &str, pattern: Option<&str>) -> Result<String, FileToolError> {
    let dir = Path::new(path);
    if !dir.is_dir() {
        return Err(FileToolError::NotADirectory(path.to_string()));
    }
    let pattern = pattern.unwrap_or("*");
    let glob_pattern = format!("{}/{}", path.trim_end_matches('/'), pattern);
    let mut names: Vec<String> = glob::glob(&glob_pattern)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::File::create(&path).unwrap().write_all(b"hello").unwrap();
        let content = read_file(path.to_str().unwrap()).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn missing_file_errors() {
        assert!(matches!(read_file("/no/such/file"), Err(FileToolError::NotAFile(_))));
    }

    #[test]
    fn lists_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("b.txt")).unwrap();
        std::fs::File::create(dir.path().join("a.txt")).unwrap();
        let listing = list_directory(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(listing, "a.txt\nb.txt");
    }
}
