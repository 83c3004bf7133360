use url::Url;

use crate::error::ResolveError;

/// How a reference relates to the page it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `http://` or `https://`, left pointing at the original host.
    External,
    /// Starts with `/`.
    RootRelative,
    /// Starts with `../`.
    ParentRelative,
    /// Starts with `./`.
    SameDirectory,
    /// Anything else, taken relative to the page.
    Relative,
}

impl ReferenceKind {
    pub fn of(reference: &str) -> Self {
        if is_external(reference) {
            ReferenceKind::External
        } else if reference.starts_with('/') {
            ReferenceKind::RootRelative
        } else if reference.starts_with("../") {
            ReferenceKind::ParentRelative
        } else if reference.starts_with("./") {
            ReferenceKind::SameDirectory
        } else {
            ReferenceKind::Relative
        }
    }
}

/// True for references that carry their own `http(s)://` scheme.
pub fn is_external(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Extension of the last path segment, dot included (`".css"`), or `""`.
///
/// Query strings and fragments are ignored, so `style.css?v=2` is `.css`.
pub fn extension(reference: &str) -> &str {
    let path = reference
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(reference);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(dot) => &segment[dot..],
        None => "",
    }
}

/// Everything a reference is resolved against, derived once from the page URL.
///
/// Root-relative references never change the context for later references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    origin: String,
    base: String,
}

impl ResolutionContext {
    pub fn new(page_url: &Url) -> Self {
        let origin = page_url.origin().ascii_serialization();

        let mut base_url = page_url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);
        let base = base_url.as_str().trim_end_matches('/').to_string();

        Self { origin, base }
    }

    /// `scheme://host[:port]` of the page.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The page URL without its trailing slash, query or fragment.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Turn a reference into a fetchable URL.
    ///
    /// `/` and `../` prefixes are stripped repeatedly and the rest is joined to
    /// the origin, so `../../x` lands at `scheme://host/x`. `./x` and plain
    /// `x` are joined to the page base with a `/`.
    pub fn resolve(&self, reference: &str) -> Result<Url, ResolveError> {
        let target = match ReferenceKind::of(reference) {
            ReferenceKind::External => reference.to_string(),
            ReferenceKind::RootRelative | ReferenceKind::ParentRelative => {
                format!("{}/{}", self.origin, strip_escapes(reference))
            }
            ReferenceKind::SameDirectory => format!("{}/{}", self.base, &reference[2..]),
            ReferenceKind::Relative => format!("{}/{}", self.base, reference),
        };

        Url::parse(&target).map_err(|source| ResolveError::Parse {
            url: target,
            source,
        })
    }
}

fn strip_escapes(mut reference: &str) -> &str {
    loop {
        if let Some(rest) = reference.strip_prefix("../") {
            reference = rest;
        } else if let Some(rest) = reference.strip_prefix('/') {
            reference = rest;
        } else {
            return reference;
        }
    }
}
