use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use log::{error, info};

/// Names of the `.md` files directly inside `dir`, sorted. `index.md` is a
/// section page, not an entry, and is excluded from listings.
pub(crate) fn list_markdown(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name != "index.md" {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Writes the listing of `dir` as pretty JSON into the directory itself.
/// The index file is named `<dirname>.json` unless overridden. Returns the
/// number of listed files.
pub(crate) fn update_index(dir: &Path, index_filename: Option<&str>) -> anyhow::Result<usize> {
    let names = list_markdown(dir).with_context(|| format!("while listing {:?}", dir))?;
    if names.is_empty() {
        bail!("no .md files found in {:?}", dir);
    }

    let index_filename = match index_filename {
        Some(name) => name.to_string(),
        None => format!(
            "{}.json",
            dir.file_name().unwrap_or_default().to_string_lossy()
        ),
    };

    let index_path = dir.join(index_filename);
    let fd = File::create(&index_path).with_context(|| format!("while creating {:?}", index_path))?;
    let mut writer = BufWriter::new(fd);
    serde_json::to_writer_pretty(&mut writer, &names)
        .with_context(|| format!("while writing {:?}", index_path))?;
    // dropping the writer would swallow flush errors
    writer
        .flush()
        .with_context(|| format!("while writing {:?}", index_path))?;

    Ok(names.len())
}

/// Regenerates the index of every immediate subdirectory of `content_root`
/// that holds Markdown files. A failing directory is logged and skipped; the
/// sweep only reports failure at the end.
pub(crate) fn rebuild_all(content_root: &Path) -> anyhow::Result<()> {
    if !content_root.is_dir() {
        bail!("content root {:?} does not exist", content_root);
    }

    let dirs = find_content_dirs(content_root)?;
    if dirs.is_empty() {
        bail!("no content directories under {:?}", content_root);
    }

    let mut updated = 0;
    for dir in &dirs {
        match update_index(dir, None) {
            Ok(count) => {
                info!("updated index of {:?}: {} files", dir, count);
                updated += 1;
            }
            Err(e) => {
                error!("failed to update index of {:?}: {:#}", dir, e);
            }
        }
    }

    println!("updated {updated}/{} index files", dirs.len());
    if updated != dirs.len() {
        bail!("{} index files failed to update", dirs.len() - updated);
    }
    Ok(())
}

/// Immediate subdirectories of `content_root` containing at least one
/// listable `.md` file, sorted for deterministic processing order.
fn find_content_dirs(content_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut dirs = vec![];
    for entry in fs::read_dir(content_root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && !list_markdown(&path)?.is_empty() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, "stub\n").unwrap();
    }

    #[test]
    fn listing_is_sorted_and_excludes_index_md() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("b.md"));
        touch(&dir.path().join("a.md"));
        touch(&dir.path().join("index.md"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("nested"))?;

        assert_eq!(list_markdown(dir.path())?, vec!["a.md", "b.md"]);
        Ok(())
    }

    #[test]
    fn update_index_writes_pretty_json_named_after_the_directory() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("news");
        fs::create_dir(&dir)?;
        touch(&dir.join("2024-01-01-hello.md"));
        touch(&dir.join("2024-02-01-world.md"));

        assert_eq!(update_index(&dir, None)?, 2);

        let written = fs::read_to_string(dir.join("news.json"))?;
        assert_eq!(
            written,
            "[\n  \"2024-01-01-hello.md\",\n  \"2024-02-01-world.md\"\n]"
        );
        Ok(())
    }

    #[test]
    fn update_index_honors_an_explicit_filename() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("messages");
        fs::create_dir(&dir)?;
        touch(&dir.join("m.md"));

        update_index(&dir, Some("listing.json"))?;
        let names: Vec<String> = serde_json::from_str(&fs::read_to_string(dir.join("listing.json"))?)?;
        assert_eq!(names, vec!["m.md"]);
        Ok(())
    }

    #[test]
    fn update_index_fails_on_a_directory_without_markdown() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("empty");
        fs::create_dir(&dir)?;

        assert!(update_index(&dir, None).is_err());
        Ok(())
    }

    #[test]
    fn rebuild_all_updates_only_directories_holding_markdown() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let news = root.path().join("news");
        let faq = root.path().join("faq");
        let assets = root.path().join("assets");
        fs::create_dir_all(&news)?;
        fs::create_dir_all(&faq)?;
        fs::create_dir_all(&assets)?;
        touch(&news.join("post.md"));
        touch(&faq.join("q.md"));
        touch(&assets.join("logo.svg"));
        touch(&root.path().join("stray.md"));

        rebuild_all(root.path())?;

        assert!(news.join("news.json").is_file());
        assert!(faq.join("faq.json").is_file());
        assert!(!assets.join("assets.json").exists());
        // files at the root itself are not indexed
        assert!(!root.path().join("stray.json").exists());
        Ok(())
    }

    #[test]
    fn rebuild_all_rejects_a_missing_root() {
        let root = tempfile::tempdir().unwrap();
        assert!(rebuild_all(&root.path().join("nope")).is_err());
    }

    #[test]
    fn rebuild_all_fails_when_no_content_directories_exist() -> anyhow::Result<()> {
        // an existing root without indexable subdirectories is an error, not
        // a silent success
        let root = tempfile::tempdir()?;
        assert!(rebuild_all(root.path()).is_err());

        fs::create_dir(root.path().join("assets"))?;
        touch(&root.path().join("stray.md"));
        assert!(rebuild_all(root.path()).is_err());
        Ok(())
    }
}
