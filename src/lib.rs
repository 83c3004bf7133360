pub mod cli;
pub mod css_parser;
pub mod downloader;
pub mod error;
pub mod file_manager;
pub mod html_parser;
pub mod logging;
pub mod resolver;
pub mod rewriter;
pub mod transport;

// Re-export main types for convenience
pub use downloader::{CloneConfig, ClonedPage, ContentFetcher, NameMapping, PageCloner};
pub use error::{CloneError, FetchError, ResolveError};
pub use file_manager::FileManager;
pub use html_parser::{DiscoveredLinks, HtmlParser, ResourceLink, ResourceType};
pub use resolver::ResolutionContext;
pub use transport::{HttpTransport, Transport};
