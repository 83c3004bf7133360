use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use tracing::debug;

use crate::css_parser::{extract_css_links, scan_css_links, StylesheetSource};
use crate::resolver::{extension, is_external, ResolutionContext};
use crate::transport::Transport;

/// A reference exactly as it appeared in the page, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub reference: String,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    JavaScript,
    /// A `<link href>` that is not a stylesheet (icons, manifests, ...).
    Link,
    CSS,
    /// A `url(...)` found in a `style` attribute, `<style>` block or linked stylesheet.
    StyleUrl,
}

/// Result of one pass over the token stream, before any stylesheet is fetched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentScan {
    pub content_links: Vec<ResourceLink>,
    pub form_actions: Vec<String>,
    /// `.css` links, resolved only once the stream is exhausted.
    pub stylesheets: Vec<String>,
}

/// Every local reference of a page, in discovery order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveredLinks {
    pub content_links: Vec<ResourceLink>,
    pub form_actions: Vec<String>,
}

impl DiscoveredLinks {
    pub fn references(&self) -> Vec<String> {
        self.content_links
            .iter()
            .map(|link| link.reference.clone())
            .collect()
    }
}

#[derive(Clone)]
pub struct HtmlParser {
    context: ResolutionContext,
}

impl HtmlParser {
    pub fn new(context: ResolutionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Discover content links and form actions. Linked stylesheets are
    /// fetched and scanned at the end; each contributes its own `url(...)`
    /// references followed by the stylesheet reference itself.
    pub async fn extract_links<T: Transport>(&self, transport: &T, html: &str) -> DiscoveredLinks {
        let scan = scan_document(html);
        let mut content_links = scan.content_links;

        for stylesheet in scan.stylesheets {
            let nested = extract_css_links(
                transport,
                &self.context,
                StylesheetSource::Linked(&stylesheet),
            )
            .await;
            content_links.extend(nested.into_iter().map(|reference| ResourceLink {
                reference,
                resource_type: ResourceType::StyleUrl,
            }));
            content_links.push(ResourceLink {
                reference: stylesheet,
                resource_type: ResourceType::CSS,
            });
        }

        debug!(
            content = content_links.len(),
            forms = scan.form_actions.len(),
            "discovered page links"
        );

        DiscoveredLinks {
            content_links,
            form_actions: scan.form_actions,
        }
    }
}

/// Tokenize a page and collect its references without touching the network.
pub fn scan_document(html: &str) -> DocumentScan {
    let mut queue = BufferQueue::new();
    queue.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(LinkSink::default(), TokenizerOpts::default());
    match tokenizer.feed(&mut queue) {
        TokenizerResult::Done => {}
        // LinkSink never hands back a script handle, so there is nothing to resume.
        TokenizerResult::Script(()) => {}
    }
    tokenizer.end();

    tokenizer.sink.finish()
}

#[derive(Default)]
struct LinkSink {
    scan: DocumentScan,
    style_text: Option<String>,
}

impl LinkSink {
    fn finish(mut self) -> DocumentScan {
        self.flush_style();
        self.scan
    }

    fn push(&mut self, reference: &str, resource_type: ResourceType) {
        self.scan.content_links.push(ResourceLink {
            reference: reference.to_string(),
            resource_type,
        });
    }

    fn push_style_urls(&mut self, css: &str) {
        for reference in scan_css_links(css) {
            self.push(&reference, ResourceType::StyleUrl);
        }
    }

    fn flush_style(&mut self) {
        if let Some(css) = self.style_text.take() {
            self.push_style_urls(&css);
        }
    }

    fn on_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;
        let attr = |key: &str| {
            tag.attrs
                .iter()
                .find(|a| &*a.name.local == key)
                .map(|a| &*a.value)
        };

        match name {
            "form" => {
                if let Some(action) = attr("action").filter(|v| is_local(v)) {
                    self.scan.form_actions.push(action.to_string());
                }
            }
            "img" | "script" => {
                if let Some(src) = attr("src").filter(|v| is_local(v)) {
                    let kind = if name == "img" {
                        ResourceType::Image
                    } else {
                        ResourceType::JavaScript
                    };
                    self.push(src, kind);
                }
            }
            "link" => {
                if let Some(href) = attr("href").filter(|v| is_local(v)) {
                    if extension(href) == ".css" {
                        self.scan.stylesheets.push(href.to_string());
                    } else {
                        self.push(href, ResourceType::Link);
                    }
                }
            }
            _ => {}
        }

        for a in tag.attrs.iter().filter(|a| &*a.name.local == "style") {
            self.push_style_urls(&a.value);
        }

        if tag.kind != TagKind::StartTag || tag.self_closing {
            return TokenSinkResult::Continue;
        }

        match name {
            "style" => {
                self.style_text = Some(String::new());
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
            _ => TokenSinkResult::Continue,
        }
    }
}

impl TokenSink for LinkSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                self.flush_style();
                return self.on_tag(tag);
            }
            Token::CharacterTokens(text) => {
                if let Some(css) = self.style_text.as_mut() {
                    css.push_str(&text);
                }
            }
            Token::EOFToken => self.flush_style(),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn is_local(reference: &&str) -> bool {
    !reference.is_empty() && !is_external(reference)
}
