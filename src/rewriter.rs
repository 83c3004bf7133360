//! Plain byte substitution over fetched stylesheets and the page itself.
//!
//! Nothing is re-parsed or re-encoded: every literal occurrence of an original
//! reference is replaced, in table order, and all other bytes pass through
//! untouched. A reference that is a substring of unrelated text
//! (or of a later reference) is replaced there too.

use memchr::memmem;
use tracing::{debug, info};

use crate::downloader::NameMapping;
use crate::resolver::extension;

/// Point a stylesheet's `url(...)` references at their sibling files in `content/`.
///
/// Walks the mapping in order and stops at the first entry whose original
/// reference is itself a `.css` file, so only content discovered before the
/// first stylesheet in the table is substituted.
pub fn rewrite_stylesheet(css: &[u8], mapping: &NameMapping) -> Vec<u8> {
    let mut rewritten = css.to_vec();

    for (original, local) in mapping.iter() {
        if extension(original) == ".css" {
            break;
        }
        rewritten = replace_all(&rewritten, original.as_bytes(), file_name(local).as_bytes());
    }

    rewritten
}

/// Point the page at the downloaded copies, then redirect form actions to
/// `form_target` when both a target and at least one action are present.
pub fn rewrite_document(
    html: &[u8],
    mapping: &NameMapping,
    form_actions: &[String],
    form_target: Option<&str>,
) -> Vec<u8> {
    let mut rewritten = html.to_vec();

    for (original, local) in mapping.iter() {
        rewritten = replace_all(&rewritten, original.as_bytes(), local.as_bytes());
    }

    match form_target.filter(|target| !target.is_empty()) {
        Some(target) if !form_actions.is_empty() => {
            info!(form_target = target, "Performing form action substitution");
            let replacement = format!("action=\"{}\"", target);
            for action in form_actions {
                let quoted = format!("action=\"{}\"", action);
                let bare = format!("action={}", action);
                rewritten = replace_all(&rewritten, quoted.as_bytes(), replacement.as_bytes());
                rewritten = replace_all(&rewritten, bare.as_bytes(), replacement.as_bytes());
            }
        }
        _ => debug!("Skipping form action substitution"),
    }

    rewritten
}

/// Left-to-right, non-overlapping replacement, like `str::replace` on bytes.
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut last = 0;
    for found in memmem::find_iter(haystack, needle) {
        out.extend_from_slice(&haystack[last..found]);
        out.extend_from_slice(replacement);
        last = found + needle.len();
    }
    out.extend_from_slice(&haystack[last..]);
    out
}

fn file_name(local: &str) -> &str {
    local.rsplit('/').next().unwrap_or(local)
}
