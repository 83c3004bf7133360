use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CloneError;
use crate::file_manager::{FileManager, CONTENT_DIR};
use crate::html_parser::HtmlParser;
use crate::resolver::{extension, is_external, ResolutionContext};
use crate::rewriter::{rewrite_document, rewrite_stylesheet};
use crate::transport::{HttpTransport, Transport};

/// Original references and their local paths, index-aligned, in discovery
/// order. Only successfully fetched references have an entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameMapping {
    original_links: Vec<String>,
    local_names: Vec<String>,
}

impl NameMapping {
    pub fn push(&mut self, original: String, local: String) {
        self.original_links.push(original);
        self.local_names.push(local);
    }

    pub fn len(&self) -> usize {
        self.original_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_links.is_empty()
    }

    pub fn original_links(&self) -> &[String] {
        &self.original_links
    }

    pub fn local_names(&self) -> &[String] {
        &self.local_names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.original_links
            .iter()
            .zip(&self.local_names)
            .map(|(original, local)| (original.as_str(), local.as_str()))
    }
}

/// One successfully fetched resource, ready to be written.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Position in the discovered link list, not in the mapping.
    pub index: usize,
    pub reference: String,
    /// `content/content<index><ext>`
    pub local_name: String,
    pub body: Vec<u8>,
}

impl FetchedContent {
    pub fn is_stylesheet(&self) -> bool {
        extension(&self.local_name) == ".css"
    }
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub mapping: NameMapping,
    pub files: Vec<FetchedContent>,
}

/// Downloads content links with at most `max_concurrent` requests in flight.
pub struct ContentFetcher<'a, T: Transport> {
    transport: &'a T,
    context: &'a ResolutionContext,
    semaphore: Arc<Semaphore>,
}

impl<'a, T: Transport> ContentFetcher<'a, T> {
    pub fn new(transport: &'a T, context: &'a ResolutionContext, max_concurrent: usize) -> Self {
        Self {
            transport,
            context,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Fetch every link and build the name mapping.
    ///
    /// Results are collected per discovery index and compacted afterwards, so
    /// failed links leave no gap and the outcome does not depend on which
    /// request finishes first. Fetched stylesheets have their own references
    /// rewritten before they are returned.
    pub async fn fetch(&self, links: &[String]) -> FetchReport {
        let progress_bar = ProgressBar::new(links.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{bar:40} {pos}/{len} {msg}") {
            progress_bar.set_style(style);
        }

        let tasks = links.iter().enumerate().map(|(index, reference)| {
            let semaphore = self.semaphore.clone();
            let progress_bar = progress_bar.clone();
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                let fetched = self.fetch_one(index, reference).await;
                progress_bar.inc(1);
                fetched
            }
        });
        let table: Vec<Option<FetchedContent>> = join_all(tasks).await;

        progress_bar.finish_and_clear();

        let mut report = FetchReport::default();
        for fetched in table.into_iter().flatten() {
            report
                .mapping
                .push(fetched.reference.clone(), fetched.local_name.clone());
            report.files.push(fetched);
        }

        for file in report.files.iter_mut().filter(|f| f.is_stylesheet()) {
            debug!(file = %file.local_name, "Constructing CSS");
            file.body = rewrite_stylesheet(&file.body, &report.mapping);
        }

        info!(
            fetched = report.mapping.len(),
            skipped = links.len() - report.mapping.len(),
            "content fetch finished"
        );
        report
    }

    async fn fetch_one(&self, index: usize, reference: &str) -> Option<FetchedContent> {
        let url = match self.context.resolve(reference) {
            Ok(url) => url,
            Err(e) => {
                warn!(index, reference, error = %e, "skipping unresolvable link");
                return None;
            }
        };

        debug!(index, %url, "Getting content");
        match self.transport.get(&url).await {
            Ok(body) => {
                let local_name = local_name(index, &url);
                debug!(index, %url, local = %local_name, "Success");
                Some(FetchedContent {
                    index,
                    reference: reference.to_string(),
                    local_name,
                    body,
                })
            }
            Err(e) => {
                warn!(index, %url, error = %e, "failed to fetch content");
                None
            }
        }
    }
}

/// `content/content<index><ext>`, where `<ext>` comes from the last path
/// segment of the resolved URL.
pub fn local_name(index: usize, url: &Url) -> String {
    format!("{}/content{}{}", CONTENT_DIR, index, extension(url.path()))
}

/// Everything needed for one run.
#[derive(Debug, Clone)]
pub struct CloneConfig {
    pub url: String,
    pub form_url: Option<String>,
    pub output_dir: PathBuf,
    pub max_concurrent: usize,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            form_url: None,
            output_dir: PathBuf::from("."),
            max_concurrent: 4,
            timeout: Some(Duration::from_secs(30)),
            user_agent: "PageCloner/1.0".to_string(),
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ClonedPage {
    pub root: PathBuf,
    pub mapping: NameMapping,
    pub form_actions: Vec<String>,
}

impl ClonedPage {
    pub fn index_path(&self) -> PathBuf {
        self.root.join(crate::file_manager::INDEX_FILE)
    }
}

pub struct PageCloner<T: Transport = HttpTransport> {
    page_url: Url,
    form_url: Option<String>,
    output_dir: PathBuf,
    max_concurrent: usize,
    transport: T,
}

impl PageCloner<HttpTransport> {
    pub fn new(config: CloneConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout)
            .context("Failed to build HTTP client")?;
        Ok(Self::with_transport(config, transport)?)
    }
}

impl<T: Transport> PageCloner<T> {
    /// Validates the page URL; nothing touches the network here.
    pub fn with_transport(config: CloneConfig, transport: T) -> Result<Self, CloneError> {
        let page_url = parse_page_url(&config.url)?;

        Ok(Self {
            page_url,
            form_url: config.form_url.filter(|f| !f.is_empty()),
            output_dir: config.output_dir,
            max_concurrent: config.max_concurrent,
            transport,
        })
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn run(&self) -> Result<ClonedPage> {
        println!("🚀 Cloning page: {}", self.page_url.as_str().blue());

        let page = self
            .transport
            .get(&self.page_url)
            .await
            .map_err(|source| CloneError::RootFetch {
                url: self.page_url.to_string(),
                source,
            })?;
        // Lossy text is only scanned; the output is rewritten from the raw bytes.
        let html = String::from_utf8_lossy(&page);

        let files = FileManager::new(&self.output_dir, Local::now())?;
        info!(root = %files.root().display(), "created output directories");

        let context = ResolutionContext::new(&self.page_url);
        let parser = HtmlParser::new(context.clone());
        let links = parser.extract_links(&self.transport, &html).await;
        let references = links.references();

        let fetcher = ContentFetcher::new(&self.transport, &context, self.max_concurrent);
        let report = fetcher.fetch(&references).await;

        for file in &report.files {
            files
                .save_content(&file.local_name, &file.body)
                .with_context(|| format!("Failed to save {}", file.reference))?;
        }

        println!("🔧 Building page...");
        let document = rewrite_document(
            &page,
            &report.mapping,
            &links.form_actions,
            self.form_url.as_deref(),
        );
        files.save_index(&document)?;

        println!("📁 Site cloned to {}", files.root().display());
        Ok(ClonedPage {
            root: files.root().to_path_buf(),
            mapping: report.mapping,
            form_actions: links.form_actions,
        })
    }
}

/// Accepts only `http://` and `https://` pages; one trailing `/` is dropped.
pub fn parse_page_url(raw: &str) -> Result<Url, CloneError> {
    if !is_external(raw) {
        return Err(CloneError::UnsupportedScheme(raw.to_string()));
    }

    let trimmed = raw.strip_suffix('/').unwrap_or(raw);
    Url::parse(trimmed).map_err(|source| CloneError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::collections::HashMap;

    struct StaticTransport {
        pages: HashMap<String, Vec<u8>>,
    }

    impl StaticTransport {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.as_bytes().to_vec()))
                    .collect(),
            }
        }
    }

    impl Transport for StaticTransport {
        async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or(FetchError::Status(404))
        }
    }

    fn links(refs: &[&str]) -> Vec<String> {
        refs.iter().map(|r| r.to_string()).collect()
    }

    fn context() -> ResolutionContext {
        ResolutionContext::new(&Url::parse("https://example.com").unwrap())
    }

    #[test]
    fn test_local_name_uses_discovery_index_and_extension() {
        let url = Url::parse("https://example.com/img/logo.png?v=3").unwrap();
        assert_eq!(local_name(7, &url), "content/content7.png");

        let url = Url::parse("https://example.com/api/avatar").unwrap();
        assert_eq!(local_name(0, &url), "content/content0");
    }

    #[test]
    fn test_parse_page_url() {
        assert_eq!(parse_page_url("https://example.com/").unwrap().as_str(), "https://example.com/");
        assert_eq!(parse_page_url("http://example.com/blog/").unwrap().as_str(), "http://example.com/blog");
        assert!(matches!(parse_page_url("example.com"), Err(CloneError::UnsupportedScheme(_))));
        assert!(matches!(parse_page_url("ftp://example.com"), Err(CloneError::UnsupportedScheme(_))));
        assert!(matches!(parse_page_url("https://"), Err(CloneError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_failed_links_leave_no_gap() {
        let transport = StaticTransport::new(&[
            ("https://example.com/a.png", "A"),
            ("https://example.com/c.js", "C"),
        ]);
        let ctx = context();
        let fetcher = ContentFetcher::new(&transport, &ctx, 2);

        let report = fetcher.fetch(&links(&["/a.png", "/missing.gif", "c.js"])).await;

        assert_eq!(report.mapping.original_links(), &["/a.png", "c.js"]);
        assert_eq!(
            report.mapping.local_names(),
            &["content/content0.png", "content/content2.js"]
        );
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[1].index, 2);
    }

    #[tokio::test]
    async fn test_all_failures_give_empty_mapping() {
        let transport = StaticTransport::new(&[]);
        let ctx = context();
        let fetcher = ContentFetcher::new(&transport, &ctx, 4);

        let report = fetcher.fetch(&links(&["/a.png", "b.css", "../c.js"])).await;

        assert!(report.mapping.is_empty());
        assert_eq!(report.mapping.original_links().len(), report.mapping.local_names().len());
        assert!(report.files.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_get_distinct_names() {
        let transport = StaticTransport::new(&[("https://example.com/a.png", "A")]);
        let ctx = context();
        let fetcher = ContentFetcher::new(&transport, &ctx, 1);

        let report = fetcher.fetch(&links(&["/a.png", "/a.png"])).await;

        assert_eq!(
            report.mapping.local_names(),
            &["content/content0.png", "content/content1.png"]
        );
    }

    #[tokio::test]
    async fn test_stylesheet_body_is_rewritten() {
        let transport = StaticTransport::new(&[
            ("https://example.com/bg.png", "PNG"),
            ("https://example.com/s.css", "body { background: url(bg.png) }"),
        ]);
        let ctx = context();
        let fetcher = ContentFetcher::new(&transport, &ctx, 3);

        let report = fetcher.fetch(&links(&["bg.png", "./s.css"])).await;

        let css = report.files.iter().find(|f| f.is_stylesheet()).unwrap();
        assert_eq!(css.local_name, "content/content1.css");
        assert_eq!(css.body, b"body { background: url(content0.png) }");
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_mapping() {
        let transport = StaticTransport::new(&[
            ("https://example.com/1.png", "1"),
            ("https://example.com/2.png", "2"),
            ("https://example.com/4.png", "4"),
        ]);
        let ctx = context();
        let refs = links(&["1.png", "2.png", "3.png", "4.png"]);

        let sequential = ContentFetcher::new(&transport, &ctx, 1).fetch(&refs).await;
        let parallel = ContentFetcher::new(&transport, &ctx, 8).fetch(&refs).await;

        assert_eq!(sequential.mapping, parallel.mapping);
    }
}
