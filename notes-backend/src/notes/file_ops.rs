//! File operations for the notes workspace
//!
//! Handles reading/writing note JSON files, slugification and file naming.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SLUG_MAX_CHARS: usize = 40;
const FALLBACK_SLUG: &str = "note";
pub const NOTE_EXTENSION: &str = ".json";

/// Slugify a title for use in a filename (e.g. "Weekly Plan: Q3" -> "weekly-plan-q3")
///
/// Characters that are unsafe in filenames are dropped rather than replaced,
/// whitespace runs become a single dash and the result is capped at 40 chars.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>'))
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    let slug: String = slug.chars().take(SLUG_MAX_CHARS).collect();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// File name for a note: `{slug}-{id}.json`
pub fn note_file_name(title: &str, id: &str) -> String {
    format!("{}-{}{}", slugify(title), id, NOTE_EXTENSION)
}

/// Write a note file, replacing any previous content
pub fn write_note(path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}

pub fn read_note(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// List the `.json` regular files directly inside `dir`, sorted by name.
///
/// Only failing to open `dir` is an error. Entries that cannot be read are
/// logged and skipped, so the rest of the listing survives.
pub fn list_note_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)?.map(|entry| -> io::Result<(PathBuf, bool)> {
        let entry = entry?;
        let is_file = entry.file_type()?.is_file();
        Ok((entry.path(), is_file))
    });
    Ok(collect_note_paths(dir, entries))
}

/// Keep the note files among `(path, is_regular_file)` entries
fn collect_note_paths<I>(dir: &Path, entries: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = io::Result<(PathBuf, bool)>>,
{
    let mut files = Vec::new();
    for entry in entries {
        let (path, is_file) = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("[WORKSPACE] Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let is_note = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(NOTE_EXTENSION))
            .unwrap_or(false);
        if is_file && is_note {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Remove a single file entry from `dir`
pub fn delete_note_file(dir: &Path, name: &str) -> io::Result<()> {
    fs::remove_file(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  multiple   spaces  "), "-multiple-spaces-");
        assert_eq!(slugify("a: b/c?"), "a-bc");
        assert_eq!(slugify("dash -- run"), "dash-run");
        assert_eq!(slugify("CamelCase"), "camelcase");
        assert_eq!(slugify("x402 Payment!"), "x402-payment!");
    }

    #[test]
    fn test_slugify_fallbacks() {
        assert_eq!(slugify(""), "note");
        assert_eq!(slugify("<>|*"), "note");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 40);
        let accented = "é".repeat(50);
        assert_eq!(slugify(&accented).chars().count(), 40);
    }

    #[test]
    fn test_note_file_name() {
        assert_eq!(note_file_name("My Note", "abc123"), "my-note-abc123.json");
        assert_eq!(note_file_name("", "abc123"), "note-abc123.json");
    }

    #[test]
    fn test_write_and_read_note() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test-note.json");

        write_note(&path, "{\"id\": \"1\"}").unwrap();
        write_note(&path, "{\"id\": \"2\"}").unwrap();
        let content = read_note(&path).unwrap();
        assert_eq!(content, "{\"id\": \"2\"}");
    }

    #[test]
    fn test_list_note_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("b.json"), "{}").unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("readme.md"), "# hi").unwrap();
        // Directories are skipped even with a matching name, and never descended into
        fs::create_dir(root.join("nested.json")).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/c.json"), "{}").unwrap();

        let files = list_note_files(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_unreadable_entry_keeps_the_rest() {
        let dir = Path::new("/notes");
        let entries = vec![
            Ok((dir.join("b-2.json"), true)),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            Ok((dir.join("a-1.json"), true)),
            Ok((dir.join("folder.json"), false)),
            Ok((dir.join("readme.md"), true)),
        ];

        let files = collect_note_paths(dir, entries);
        assert_eq!(files, vec![dir.join("a-1.json"), dir.join("b-2.json")]);
    }

    #[test]
    fn test_delete_note_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gone.json"), "{}").unwrap();
        delete_note_file(dir.path(), "gone.json").unwrap();
        assert!(!dir.path().join("gone.json").exists());
        assert!(delete_note_file(dir.path(), "gone.json").is_err());
    }
}
