mod commands;
mod tags;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use livegallery_core::manifest::DEFAULT_BASE_URL;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{add::AddOptions, RootArgs, ToolArgs};

#[derive(Parser)]
#[command(name = "livegallery")]
#[command(about = "Prepare Live Photo galleries: extract, copy and catalogue media", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import HEIC Live Photos or paired still+video folders into the gallery
    #[command(after_help = "Any other --<tag> flag (or --tag <TAG>) is recorded as a tag. \
        The first tag selects the category; without tags the item is tagged 'custom'.")]
    Import {
        /// HEIC/HEIF files or folders holding one still and one video
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        root: RootArgs,

        /// Base URL recorded when a new gallery config is created
        #[arg(long, env = "LIVEGALLERY_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Extract the embedded video (and optionally the still) from a single HEIC Live Photo
    Extract {
        /// HEIC Live Photo file
        input: PathBuf,

        /// Output name, without extension
        output_name: String,

        /// Output directory
        #[arg(short, long, default_value = "./videos")]
        output_dir: PathBuf,

        /// Also write the still image as <OUTPUT_NAME>.jpg
        #[arg(long)]
        still: bool,

        /// Directory for the extracted still
        #[arg(long, default_value = "./images")]
        still_dir: PathBuf,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Describe an image/video pair already under images/ and videos/
    Add {
        /// File name without extension
        name: String,

        /// Display title
        title: String,

        /// Category to add to
        #[arg(long, default_value = "nature")]
        category: String,

        /// Mark as premium content
        #[arg(long)]
        premium: bool,

        /// Write the entry into gallery-config.json
        #[arg(long)]
        auto: bool,

        #[command(flatten)]
        root: RootArgs,

        /// Base URL recorded when a new gallery config is created
        #[arg(long, env = "LIVEGALLERY_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Point every thumbnailURL at the item's imageURL
    SyncThumbnails {
        #[command(flatten)]
        root: RootArgs,
    },

    /// Point items at their HEIC still, dropping items without one
    #[command(after_help = "An item keeps images/<id>.HEIC when that file exists, otherwise the \
        .HEIC its imageURL already names. Items with neither are removed.")]
    RetargetHeic {
        #[command(flatten)]
        root: RootArgs,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "livegallery_cli=info,livegallery_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (argv, tags) = tags::split_tag_flags(std::env::args_os().collect(), &Cli::command());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Commands::Import {
            inputs,
            root,
            base_url,
            tools,
        } => {
            commands::import::execute(inputs, tags, root, base_url, tools)?;
        }
        Commands::Extract {
            input,
            output_name,
            output_dir,
            still,
            still_dir,
            tools,
        } => {
            let still_dir = still.then_some(still_dir);
            commands::extract::execute(input, output_name, output_dir, still_dir, tools)?;
        }
        Commands::Add {
            name,
            title,
            category,
            premium,
            auto,
            root,
            base_url,
            tools,
        } => {
            let options = AddOptions {
                name,
                title,
                category,
                premium,
                auto,
            };
            commands::add::execute(options, root, base_url, tools)?;
        }
        Commands::SyncThumbnails { root } => {
            commands::sync_thumbnails::execute(root)?;
        }
        Commands::RetargetHeic { root } => {
            commands::retarget::execute(root)?;
        }
    }

    Ok(())
}
