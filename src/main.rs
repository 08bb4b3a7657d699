//! CLI entry point for cms-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cms_blog::site::Site;
use cms_blog::Blog;

#[derive(Parser)]
#[command(name = "cms-blog")]
#[command(author = "atsukiwi")]
#[command(version)]
#[command(about = "A static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Read content from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },

    /// Serve the site with incremental regeneration
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Read content from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List content from the CMS
    List {
        /// Type of content to list (post, category)
        #[arg(default_value = "post")]
        r#type: String,

        /// Read content from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "cms_blog=debug,info"
    } else {
        "cms_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Generate { fixture } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");
            let count = blog.generate(fixture.as_deref()).await?;
            println!("Generated {} files in {:?}", count, blog.public_dir);
        }

        Commands::Server {
            port,
            ip,
            fixture,
            open,
        } => {
            let blog = Blog::new(&base_dir)?;
            let site = Arc::new(Site::new(blog.source(fixture.as_deref())?, &blog.config)?);
            tracing::info!("Starting server at http://{}:{}", ip, port);
            cms_blog::server::start(site, &ip, port, open).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type, fixture } => {
            let blog = Blog::new(&base_dir)?;
            let source = blog.source(fixture.as_deref())?;
            cms_blog::commands::list::run(source, &r#type, blog.config.tz()).await?;
        }

        Commands::Version => {
            println!("cms-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
