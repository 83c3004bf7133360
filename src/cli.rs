use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::CloneConfig;

#[derive(Parser, Debug)]
#[command(
    name = "page-cloner",
    about = "A CLI utility to clone a single web page for offline use",
    version,
    long_about = "Downloads one page together with the images, scripts, stylesheets and CSS url() resources it references, and rewrites the page so every local reference points at the downloaded copy."
)]
pub struct CloneCommand {
    /// The URL of the page to clone (http:// or https://)
    #[arg(short, long, required = true)]
    pub url: String,

    /// URL to put into every form action of the cloned page
    #[arg(short, long)]
    pub form_url: Option<String>,

    /// Directory the cloned-<timestamp> folder is created in
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum concurrent downloads
    #[arg(short = 'c', long, default_value = "4", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrent: u64,

    /// Timeout for requests in seconds (0 = none)
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// User agent string to use for requests
    #[arg(long, default_value = "PageCloner/1.0")]
    pub user_agent: String,

    /// Log every request
    #[arg(short, long)]
    pub verbose: bool,
}

impl CloneCommand {
    pub fn into_config(self) -> CloneConfig {
        CloneConfig {
            url: self.url,
            form_url: self.form_url,
            output_dir: self.output_dir,
            max_concurrent: self.max_concurrent as usize,
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
            user_agent: self.user_agent,
        }
    }
}

pub fn print_banner() {
    let rule = "=".repeat(60);
    println!("{}", rule.bright_black());
    println!("{}", format!("{:^60}", "cloner").bold());
    println!("{}", rule.bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = CloneCommand::try_parse_from(&["page-cloner", "-u", "https://example.com"]).unwrap();

        assert_eq!(args.url, "https://example.com");
        assert_eq!(args.form_url, None);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.max_concurrent, 4);
        assert_eq!(args.timeout, 30);
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_all_args() {
        let args = CloneCommand::try_parse_from(&[
            "page-cloner",
            "--url", "https://example.com/login",
            "-f", "https://collector.example.net/submit",
            "-o", "./output",
            "-c", "1",
            "--timeout", "0",
            "--user-agent", "Test/2.0",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.form_url.as_deref(), Some("https://collector.example.net/submit"));
        assert_eq!(args.output_dir, PathBuf::from("./output"));
        assert_eq!(args.max_concurrent, 1);
        assert!(args.verbose);

        let config = args.into_config();
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.user_agent, "Test/2.0");
    }

    #[test]
    fn test_timeout_becomes_duration() {
        let args = CloneCommand::try_parse_from(&["page-cloner", "-u", "https://example.com", "--timeout", "5"]).unwrap();
        assert_eq!(args.into_config().timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_missing_url() {
        let result = CloneCommand::try_parse_from(&["page-cloner", "-o", "./output"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_concurrent() {
        let result = CloneCommand::try_parse_from(&["page-cloner", "-u", "https://example.com", "-c", "0"]);
        assert!(result.is_err());
    }
}
