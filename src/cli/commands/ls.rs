use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use colored::*;
use humansize::{DECIMAL, format_size};
use serde_json::json;

use super::{Command, task_for_source};
use crate::archive::ReaderKind;
use crate::print_line;

/// List the entries of an import source
#[derive(Debug, Clone, Args)]
pub struct LsCommand {
    /// File, directory, or `-` for stdin
    pub source: String,

    /// Name for stdin content
    #[arg(long)]
    pub name: Option<String>,

    /// Show entry sizes
    #[arg(short, long)]
    pub long: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Resolved listing of one source
#[derive(Debug, Clone)]
pub struct Listing {
    pub archive: String,
    pub kind: ReaderKind,
    pub entries: Vec<(String, Option<u64>)>,
}

impl LsCommand {
    /// Resolve the source and collect its entries, sorted by name. Blocking.
    pub fn collect(&self) -> Result<Listing> {
        let mut task = task_for_source(&self.source, self.name.as_deref());
        let mut reader = task
            .get_reader()
            .with_context(|| format!("Cannot read {}", self.source))?;

        let mut names = reader.entries()?;
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let size = if self.long || self.json {
                Some(reader.entry_size(&name)?)
            } else {
                None
            };
            entries.push((name, size));
        }

        let listing = Listing {
            archive: reader.name().to_string(),
            kind: reader.kind(),
            entries,
        };
        reader.close();
        Ok(listing)
    }

    fn print(&self, listing: &Listing) -> Result<()> {
        if self.json {
            let document = json!({
                "archive": listing.archive,
                "kind": listing.kind.to_string(),
                "entries": listing
                    .entries
                    .iter()
                    .map(|(name, size)| json!({ "name": name, "size": size }))
                    .collect::<Vec<_>>(),
            });
            print_line!("{}", serde_json::to_string_pretty(&document)?);
            return Ok(());
        }

        if self.long {
            print_line!(
                "{} ({}, {} entries)",
                listing.archive.bold(),
                listing.kind.to_string().cyan(),
                listing.entries.len()
            );
        }

        for (name, size) in &listing.entries {
            match size {
                Some(size) => print_line!("{:>10}  {}", format_size(*size, DECIMAL), name),
                None => print_line!("{name}"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &str {
        "ls"
    }

    async fn execute(&self) -> Result<()> {
        let command = self.clone();
        let listing = tokio::task::spawn_blocking(move || command.collect()).await??;
        self.print(&listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn command(source: &str, long: bool) -> LsCommand {
        LsCommand {
            source: source.to_string(),
            name: None,
            long,
            json: false,
        }
    }

    #[test]
    fn test_collect_sorts_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.osu"), b"b").unwrap();
        fs::create_dir(dir.path().join("sb")).unwrap();
        fs::write(dir.path().join("sb").join("a.png"), b"aa").unwrap();
        fs::write(dir.path().join("a.mp3"), b"aaa").unwrap();

        let listing = command(dir.path().to_str().unwrap(), true).collect().unwrap();
        assert_eq!(listing.kind, ReaderKind::Directory);
        assert_eq!(
            listing.entries,
            vec![
                ("a.mp3".to_string(), Some(3)),
                ("b.osu".to_string(), Some(1)),
                ("sb/a.png".to_string(), Some(2)),
            ]
        );
    }

    #[test]
    fn test_collect_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.osz");
        let err = command(missing.to_str().unwrap(), false).collect().unwrap_err();
        assert!(err.to_string().starts_with("Cannot read"));
    }
}
