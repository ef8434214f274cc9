//! Class-file discovery.
//!
//! Collects `(identifier, bytes)` pairs from a file, a jar, or a directory
//! tree. Jar entries use `archive!entry` identifiers so parse diagnostics
//! point at the exact input.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "war"];

/// Collects every class-file buffer under `root`.
///
/// `root` may be a single `.class` file, a jar/war archive, or a directory
/// that is walked recursively (respecting `.gitignore`).
///
/// # Errors
///
/// Returns an error when `root` does not exist or an input cannot be read.
/// Malformed class bytes are not detected here; the importer decides what
/// to do with them.
pub fn collect(root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut sources = Vec::new();
    if root.is_file() {
        collect_file(root, &mut sources)?;
    } else {
        collect_tree(root, &mut sources)?;
    }
    debug!(inputs = sources.len(), path = %root.display(), "collected class sources");
    Ok(sources)
}

fn collect_tree(root: &Path, sources: &mut Vec<(String, Vec<u8>)>) -> Result<()> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true);

    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            collect_file(path, sources)?;
        }
    }
    Ok(())
}

fn collect_file(path: &Path, sources: &mut Vec<(String, Vec<u8>)>) -> Result<()> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if extension == "class" {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push((path.display().to_string(), bytes));
    } else if ARCHIVE_EXTENSIONS.contains(&extension) {
        collect_archive(path, sources)?;
    }
    Ok(())
}

fn collect_archive(path: &Path, sources: &mut Vec<(String, Vec<u8>)>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {}", path.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read entry {index} of {}", path.display()))?;
        let name = entry.name().to_owned();
        // module-info describes the module system, not a class.
        if !name.ends_with(".class") || name.ends_with("module-info.class") {
            continue;
        }
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {} from {}", name, path.display()))?;
        sources.push((format!("{}!{name}", path.display()), bytes));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
        let file = File::create(path)?;
        let mut jar = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in entries {
            jar.start_file(*name, options)?;
            jar.write_all(content)?;
        }
        jar.finish()?;
        Ok(())
    }

    #[test]
    fn collects_class_files_from_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("A.class"), [0xCA, 0xFE])?;
        std::fs::write(dir.path().join("notes.txt"), b"ignored")?;
        std::fs::create_dir(dir.path().join("sub"))?;
        std::fs::write(dir.path().join("sub/B.class"), [0xBA, 0xBE])?;

        let mut sources = collect(dir.path())?;
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(sources.len(), 2);
        assert!(sources[0].0.ends_with("A.class"));
        assert!(sources[1].0.ends_with("B.class"));
        Ok(())
    }

    #[test]
    fn collects_class_entries_from_jar() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let jar = dir.path().join("app.jar");
        write_jar(
            &jar,
            &[
                ("com/example/A.class", &[0xCA, 0xFE][..]),
                ("module-info.class", &[0xCA, 0xFE][..]),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
            ],
        )?;

        let sources = collect(&jar)?;
        assert_eq!(sources.len(), 1);
        assert!(sources[0].0.ends_with("app.jar!com/example/A.class"));
        Ok(())
    }

    #[test]
    fn single_class_file_is_collected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let class = dir.path().join("Solo.class");
        std::fs::write(&class, [0xCA, 0xFE, 0xBA, 0xBE])?;

        let sources = collect(&class)?;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].1, vec![0xCA, 0xFE, 0xBA, 0xBE]);
        Ok(())
    }
}
