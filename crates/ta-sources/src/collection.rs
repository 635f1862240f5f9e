//! Input discovery for batch runs

use std::path::{Path, PathBuf};

use ta_core::{Error, Result};

use crate::handler::ExtractorRegistry;

/// Every file under `dir` some extractor supports, sorted.
///
/// `pattern` further filters on the file name (`INC*.pdf`).
pub fn collect_files(
    dir: &Path,
    registry: &ExtractorRegistry,
    pattern: Option<&str>,
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    let pattern = pattern
        .map(glob::Pattern::new)
        .transpose()
        .map_err(|e| Error::Other(e.into()))?;

    let mut walker = walkdir::WalkDir::new(dir).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| Error::Other(e.into()))?;
        if !entry.file_type().is_file() || !registry.supports(entry.path()) {
            continue;
        }
        let name_matches = pattern.as_ref().is_none_or(|p| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| p.matches(name))
        });
        if name_matches {
            files.push(entry.into_path());
        }
    }

    // Sort for determinism
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("INC0002.txt"), "b").unwrap();
        std::fs::write(dir.path().join("INC0001.pdf"), "a").unwrap();
        std::fs::write(dir.path().join("notes.docx"), "c").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        std::fs::write(dir.path().join("archive").join("INC0003.md"), "d").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_collect_recursive() {
        let dir = fixture();
        let registry = ExtractorRegistry::default();
        let files = collect_files(dir.path(), &registry, None, true).unwrap();
        assert_eq!(files.len(), 3);
        assert!(names(&files).contains(&"INC0003.md".to_string()));
        assert!(!names(&files).contains(&"notes.docx".to_string()));
    }

    #[test]
    fn test_collect_flat_with_pattern() {
        let dir = fixture();
        let registry = ExtractorRegistry::default();
        let files = collect_files(dir.path(), &registry, Some("INC*.pdf"), false).unwrap();
        assert_eq!(names(&files), vec!["INC0001.pdf".to_string()]);
    }

    #[test]
    fn test_collect_missing_dir() {
        let registry = ExtractorRegistry::default();
        assert!(collect_files(Path::new("/no/such/dir"), &registry, None, true).is_err());
    }
}
