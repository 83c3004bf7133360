use cssparser::{ParseError, Parser, ParserInput, Token};
use tracing::{debug, warn};

use crate::resolver::{is_external, ResolutionContext};
use crate::transport::Transport;

/// Where stylesheet text comes from.
#[derive(Debug, Clone, Copy)]
pub enum StylesheetSource<'a> {
    /// Text of a `style=""` attribute or a `<style>` block.
    Inline(&'a str),
    /// A stylesheet reference that has to be fetched first.
    Linked(&'a str),
}

/// Collect every `url(...)` reference from a stylesheet, fetching it first
/// when it is linked. A stylesheet that cannot be fetched yields nothing.
pub async fn extract_css_links<T: Transport>(
    transport: &T,
    context: &ResolutionContext,
    source: StylesheetSource<'_>,
) -> Vec<String> {
    match source {
        StylesheetSource::Inline(css) => scan_css_links(css),
        StylesheetSource::Linked(reference) => {
            let url = match context.resolve(reference) {
                Ok(url) => url,
                Err(e) => {
                    warn!(reference, error = %e, "skipping unresolvable stylesheet");
                    return Vec::new();
                }
            };

            match transport.get(&url).await {
                Ok(body) => {
                    let links = scan_css_links(&String::from_utf8_lossy(&body));
                    debug!(%url, found = links.len(), "scanned stylesheet");
                    links
                }
                Err(e) => {
                    warn!(%url, error = %e, "failed to fetch stylesheet");
                    Vec::new()
                }
            }
        }
    }
}

/// Tokenize CSS text and return the bare reference inside each `url(...)`,
/// exactly as written in the source.
///
/// Scanning stops at the first bad string or bad url token; whatever was
/// collected up to that point is returned. Empty and `http(s)://`
/// references are dropped.
pub fn scan_css_links(css: &str) -> Vec<String> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut found = Vec::new();

    scan_tokens(&mut parser, &mut found);

    found
        .into_iter()
        .filter(|link| !link.is_empty() && !is_external(link))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Exhausted,
    Halted,
}

fn scan_tokens<'i, 't>(parser: &mut Parser<'i, 't>, found: &mut Vec<String>) -> ScanState {
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return ScanState::Exhausted,
        };

        let state = match token {
            Token::UnquotedUrl(_) => {
                found.push(unwrap_url(parser.slice_from(start)).to_string());
                ScanState::Exhausted
            }
            Token::Function(ref name) if name.eq_ignore_ascii_case("url") => {
                let mut quoted = false;
                let state = scan_nested(parser, |nested| match nested.next() {
                    Ok(Token::QuotedString(_)) => {
                        quoted = true;
                        ScanState::Exhausted
                    }
                    Ok(Token::BadString(_)) => ScanState::Halted,
                    _ => ScanState::Exhausted,
                });
                if quoted {
                    found.push(unwrap_url(parser.slice_from(start)).to_string());
                }
                state
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => scan_nested(parser, |nested| scan_tokens(nested, found)),
            Token::BadUrl(_) | Token::BadString(_) => ScanState::Halted,
            _ => ScanState::Exhausted,
        };

        if state == ScanState::Halted {
            return ScanState::Halted;
        }
    }
}

fn scan_nested<'i, 't, F>(parser: &mut Parser<'i, 't>, scan: F) -> ScanState
where
    F: for<'tt> FnOnce(&mut Parser<'i, 'tt>) -> ScanState,
{
    let mut state = ScanState::Exhausted;
    // An error here only reports tokens left in the block after `scan`
    // returned; the block is skipped either way and `state` is already set.
    let _ = parser.parse_nested_block(|nested| {
        state = scan(nested);
        Ok::<(), ParseError<'i, ()>>(())
    });
    state
}

/// Source text of a `url(...)` token without the `url(`, the `)` and one
/// pair of surrounding quotes. Escapes are left as written.
fn unwrap_url(raw: &str) -> &str {
    let mut inner = raw.trim();
    if inner.get(..4).map_or(false, |prefix| prefix.eq_ignore_ascii_case("url(")) {
        inner = &inner[4..];
    }
    inner = inner.strip_suffix(')').unwrap_or(inner).trim();

    for quote in ['"', '\''] {
        if let Some(rest) = inner.strip_prefix(quote) {
            return rest.strip_suffix(quote).unwrap_or(rest);
        }
    }
    inner
}
