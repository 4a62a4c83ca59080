use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{debug, error, info};
use regex::{Regex, RegexBuilder};

/// What happened to a single document.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The metadata block was parsed and the file was rewritten in place.
    Rewritten,
    /// No well-formed metadata block; the file was left untouched.
    NotModified,
}

/// Migrates the `published` flag of one document's metadata block:
/// `published: false` becomes `draft: true`, `published: true` is dropped
/// (publishing is the default, so the flag is redundant).
///
/// Documents without a leading `---` marker, or with an unterminated block,
/// are left untouched.
pub(crate) fn migrate_file(path: &Path) -> anyhow::Result<Outcome> {
    let content =
        fs::read_to_string(path).with_context(|| format!("while reading {:?}", path))?;

    match migrate_content(&content) {
        Some(new_content) => {
            fs::write(path, new_content).with_context(|| format!("while writing {:?}", path))?;
            Ok(Outcome::Rewritten)
        }
        None => Ok(Outcome::NotModified),
    }
}

/// Pure part of the migration. Returns the reassembled document whenever the
/// metadata block parses (even if nothing changed), `None` otherwise.
pub(crate) fn migrate_content(content: &str) -> Option<String> {
    if !content.starts_with("---") {
        return None;
    }

    // pandoc-style metadata block: everything up to the first closing marker,
    // the rest is the body and is carried through byte-for-byte
    let header_pattern = RegexBuilder::new(r"^---\s*\n(.*?)\n---\s*\n(.*)$")
        .dot_matches_new_line(true)
        .build()
        .unwrap();
    let caps = header_pattern.captures(content)?;
    let header = caps.get(1).unwrap().as_str();
    let body = caps.get(2).unwrap().as_str();

    let published_pattern = Regex::new(r"^\s*published\s*:").unwrap();

    let mut new_lines: Vec<&str> = vec![];
    let mut has_draft = false;
    for line in header.split('\n') {
        if published_pattern.is_match(line) {
            // Loose substring check, kept as the original behaves: any value
            // merely containing "false" (any case) counts as unpublished.
            if line.to_ascii_lowercase().contains("false") {
                // at most one draft flag per document
                if !has_draft {
                    new_lines.push("draft: true");
                    has_draft = true;
                }
            }
            // true-like (or anything else): the line is dropped entirely
            continue;
        }
        new_lines.push(line);
    }

    Some(format!("---\n{}\n---\n{}", new_lines.join("\n"), body))
}

/// Runs the migrator over every `.md` file directly inside each given
/// directory and returns the number of rewritten files. Missing directories
/// are skipped; a failing file is logged and does not stop the batch.
pub(crate) fn migrate_dirs(dirs: &[PathBuf]) -> usize {
    let mut fixed = 0;

    for dir in dirs {
        if !dir.is_dir() {
            debug!("{dir:?} does not exist. skipping...");
            continue;
        }

        let mut files = match collect_markdown_files(dir) {
            Ok(files) => files,
            Err(e) => {
                error!("error listing {:?}: {:#}", dir, e);
                continue;
            }
        };
        // directory iteration order is filesystem-dependent
        files.sort();

        for path in files {
            match migrate_file(&path) {
                Ok(Outcome::Rewritten) => {
                    info!("fixed: {}", path.display());
                    fixed += 1;
                }
                Ok(Outcome::NotModified) => {
                    debug!("no metadata block: {}", path.display());
                }
                Err(e) => {
                    error!("error processing {}: {:#}", path.display(), e);
                }
            }
        }
    }

    fixed
}

fn collect_markdown_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    Ok(files)
}
