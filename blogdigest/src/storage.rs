use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat};
use common::{FileNaming, OutputConfig};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Longest slug used in a file name, in characters
const MAX_SLUG_CHARS: usize = 60;

/// Metadata header of a post, rendered as TOML between `+++` lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    /// RFC 3339 / ISO-8601 creation timestamp
    pub date: String,
    pub link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub draft: bool,
}

/// One post file: front matter plus summary body
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Post {
    /// Build a post for `link`. `title` falls back to the configured default title.
    pub fn new(
        output: &OutputConfig,
        title: Option<&str>,
        link: &str,
        summary: &str,
        created: DateTime<Local>,
    ) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&output.default_title)
            .to_string();

        Self {
            front_matter: FrontMatter {
                title,
                date: created.to_rfc3339_opts(SecondsFormat::Secs, false),
                link: link.to_string(),
                tags: output.tags.clone(),
                categories: output.categories.clone(),
                draft: output.draft,
            },
            body: format!("{}\n\nSource: {}", summary.trim(), link),
        }
    }

    /// Render the file contents.
    pub fn render(&self) -> Result<String> {
        let header = toml::to_string(&self.front_matter).context("failed to serialize front matter")?;
        Ok(format!("+++\n{}+++\n\n{}\n", header, self.body))
    }
}

/// Lowercase, dash-separated file name fragment.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    slug.trim_end_matches('-').to_string()
}

/// File name stem for a post: `YYYYMMDD_<random>` or `YYYYMMDD_<title-slug>`.
/// Title naming falls back to a random suffix when the title has no usable characters.
pub fn file_stem(naming: FileNaming, created: DateTime<Local>, title: &str) -> String {
    let date = created.format("%Y%m%d");
    let slug = match naming {
        FileNaming::Title => slugify(title),
        FileNaming::Random => String::new(),
    };
    if slug.is_empty() {
        format!("{}_{}", date, rand::random::<u32>())
    } else {
        format!("{}_{}", date, slug)
    }
}

/// Write `contents` to `<dir>/<stem>.md`, creating the directory if needed.
/// Existing files are never overwritten: `-2`, `-3`, ... is appended to the stem instead.
pub async fn write_post(dir: &Path, stem: &str, contents: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let mut attempt = 1u32;
    loop {
        let name = if attempt == 1 {
            format!("{}.md", stem)
        } else {
            format!("{}-{}.md", stem, attempt)
        };
        let path = dir.join(name);

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                write_or_remove(file, &path, contents).await?;
                info!(path = %path.display(), "saved post");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "post file exists, trying next name");
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create post: {}", path.display()));
            }
        }
    }
}

/// Write and flush `contents`; on failure the partially written file at `path` is removed,
/// so the name is free again for the next run.
async fn write_or_remove<W>(mut writer: W, path: &Path, contents: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(contents.as_bytes()).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %remove_err, "failed to remove partial post");
        }
        return Err(e).with_context(|| format!("failed to write post: {}", path.display()));
    }
    Ok(())
}
