use anyhow::Result;
use clap::Parser;

use page_cloner::cli::{print_banner, CloneCommand};
use page_cloner::logging::init_logging;
use page_cloner::PageCloner;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CloneCommand::parse();
    init_logging(args.verbose)?;
    print_banner();

    let cloner = PageCloner::new(args.into_config())?;
    let cloned = cloner.run().await?;

    println!(
        "✅ Page cloned: {} resources, index at {}",
        cloned.mapping.len(),
        cloned.index_path().display()
    );
    Ok(())
}
