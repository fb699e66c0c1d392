use anyhow::{Context, Result};
use common::SourceConfig;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

use crate::scraping::{self, Fetcher, HeaderProfile};

/// Resolve `href` against `base` (when given) and keep it only if it is an http(s) URL.
pub fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    match resolved {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        Ok(url) => {
            warn!(%url, "invalid URL scheme, skipping");
            None
        }
        Err(e) => {
            warn!(%href, error = %e, "unparseable URL, skipping");
            None
        }
    }
}

/// Article links on a listing page, in document order, resolved and deduplicated,
/// at most `max` of them.
pub fn extract_links(html: &str, base: &Url, selector: &Selector, max: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(Some(base), href))
        .filter(|url| seen.insert(url.clone()))
        .take(max)
        .collect()
}

/// Fetch the listing page and collect article links from it.
///
/// A 403 is retried once with the fallback header profile. Any other failure is an error:
/// without the listing there is nothing to process.
pub async fn discover_article_links(
    fetcher: &Fetcher,
    source: &SourceConfig,
    debug_dir: Option<&Path>,
) -> Result<Vec<String>> {
    let listing_url = source
        .listing_url
        .as_deref()
        .context("no source.listing_url configured and no URLs given")?;
    let base = Url::parse(listing_url).with_context(|| format!("invalid listing URL: {}", listing_url))?;
    let selector = scraping::parse_selector(&source.link_selector)?;

    fetcher.polite_pause().await;
    info!(url = %listing_url, "fetching listing page");

    let (mut status, mut body) = fetcher.send(listing_url, HeaderProfile::Primary).await?;
    if status == StatusCode::FORBIDDEN {
        warn!(url = %listing_url, "listing fetch forbidden, retrying with fallback headers");
        (status, body) = fetcher.send(listing_url, HeaderProfile::Fallback).await?;
    }

    if let Some(dir) = debug_dir {
        if let Err(e) = scraping::save_debug_html(dir, "debug_listing.html", &body).await {
            warn!(error = %e, "failed to save debug listing");
        }
    }

    if !status.is_success() {
        anyhow::bail!("listing fetch of {} failed with status: {}", listing_url, status);
    }

    let links = extract_links(&body, &base, &selector, source.max_articles);
    if links.is_empty() {
        let preview: String = body.chars().take(2000).collect();
        warn!(selector = %source.link_selector, "no article links found on listing page");
        debug!(page = %preview, "listing page preview");
    } else {
        info!(count = links.len(), "found article links");
    }
    Ok(links)
}

/// Read URLs from a text file, one per line; blank lines and `#` comments are skipped.
/// Relative entries are resolved against `base` when one is given.
pub async fn read_url_list(path: &Path, base: Option<&Url>) -> Result<Vec<String>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read URL list: {}", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| resolve_link(base, l))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="post-list-item"><a class="post-link" href="/blog/first">First</a></div>
          <div class="post-list-item"><a class="post-link" href="second">Second</a></div>
          <div class="post-list-item"><a class="post-link" href="https://other.example.org/x">X</a></div>
          <div class="post-list-item"><a class="post-link" href="/blog/first">Dup</a></div>
          <div class="post-list-item"><a class="post-link" href="mailto:someone@example.com">Mail</a></div>
          <div class="post-list-item"><a class="post-link">No href</a></div>
          <div class="sidebar"><a class="post-link" href="/blog/ignored">Ignored</a></div>
          <div class="post-list-item"><a class="post-link" href="/blog/last">Last</a></div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://example.com/blog/posts").unwrap()
    }

    #[test]
    fn links_are_resolved_filtered_and_deduplicated() {
        let selector = scraping::parse_selector("div.post-list-item a.post-link").unwrap();
        let links = extract_links(LISTING, &base(), &selector, 10);
        assert_eq!(
            links,
            vec![
                "https://example.com/blog/first",
                "https://example.com/blog/second",
                "https://other.example.org/x",
                "https://example.com/blog/last",
            ]
        );
    }

    #[test]
    fn link_count_is_capped() {
        let selector = scraping::parse_selector("div.post-list-item a.post-link").unwrap();
        let links = extract_links(LISTING, &base(), &selector, 2);
        assert_eq!(links.len(), 2);
        assert!(extract_links(LISTING, &base(), &selector, 0).is_empty());
    }

    #[test]
    fn resolve_without_base_requires_absolute_urls() {
        assert_eq!(
            resolve_link(None, " https://example.com/a "),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(resolve_link(None, "/relative"), None);
        assert_eq!(resolve_link(None, "ftp://example.com/file"), None);
        assert_eq!(resolve_link(None, ""), None);
    }

    #[tokio::test]
    async fn url_list_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "# articles\nhttps://example.com/a\n\n  /b  \njavascript:alert(1)\n").unwrap();

        let urls = read_url_list(&path, Some(&base())).await.unwrap();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);

        let urls = read_url_list(&path, None).await.unwrap();
        assert_eq!(urls, vec!["https://example.com/a"]);
    }
}
