use std::collections::HashSet;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipshelf_client::{AlbumFilter, Shelf, StoreConfig, UNASSIGNED_KEY};
use satchel::rest::{RestConfig, RestStore};

/// Inspect and repair the clipshelf bookmark collections
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a user's albums with per-album bookmark counts
    Albums {
        /// User id to inspect
        #[arg(long)]
        user: String,
    },
    /// List a user's bookmarks under an album filter
    Bookmarks {
        /// User id to inspect
        #[arg(long)]
        user: String,
        /// Restrict to one album
        #[arg(long, conflicts_with = "unassigned")]
        album: Option<String>,
        /// Restrict to bookmarks with no album
        #[arg(long)]
        unassigned: bool,
    },
    /// Detect (and optionally remove) bookmarks whose video is gone
    Orphans {
        /// User id to inspect
        #[arg(long)]
        user: String,
        /// Restrict to one album
        #[arg(long, conflicts_with = "unassigned")]
        album: Option<String>,
        /// Restrict to bookmarks with no album
        #[arg(long)]
        unassigned: bool,
        /// Remove whichever orphans the acting key may delete
        #[arg(long)]
        clean: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let config = StoreConfig::from_env()?;
    let rest = RestConfig {
        endpoint: required_env("CLIPSHELF_ENDPOINT")?,
        project_id: required_env("CLIPSHELF_PROJECT_ID")?,
        api_key: required_env("CLIPSHELF_API_KEY")?,
    };
    let store = RestStore::new(rest, config.database_id.clone());
    let shelf = Shelf::new(store, config);

    match args.command {
        Command::Albums { user } => report_albums(&shelf, &user).await,
        Command::Bookmarks {
            user,
            album,
            unassigned,
        } => report_bookmarks(&shelf, &user, &filter_from(album, unassigned)).await,
        Command::Orphans {
            user,
            album,
            unassigned,
            clean,
        } => report_orphans(&shelf, &user, &filter_from(album, unassigned), clean).await,
    }
}

fn required_env(name: &'static str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} environment variable not set"))
}

fn filter_from(album: Option<String>, unassigned: bool) -> AlbumFilter {
    match album {
        Some(album) => AlbumFilter::Album(album),
        None if unassigned => AlbumFilter::Unassigned,
        None => AlbumFilter::All,
    }
}

fn describe(filter: &AlbumFilter) -> String {
    match filter {
        AlbumFilter::All => "all albums".to_string(),
        AlbumFilter::Unassigned => "unassigned only".to_string(),
        AlbumFilter::Album(id) => format!("album {id}"),
    }
}

async fn report_albums(shelf: &Shelf<RestStore>, user: &str) -> Result<()> {
    let albums = shelf.list_albums(user).await;
    let counts = shelf.count_bookmarks_per_album(user).await;
    let total: usize = counts.values().sum();

    println!("Albums for user {user}");
    println!("======================");
    println!();

    if albums.is_empty() {
        println!("  No albums found");
    } else {
        println!("  Total albums: {}", albums.len());
        println!();
        for album in &albums {
            let count = counts.get(album.id.as_str()).copied().unwrap_or(0);
            println!("  Album: {} ({})", album.name, album.id);
            if let Some(description) = &album.description {
                println!("    Description: {description}");
            }
            println!("    Bookmarks: {count}");
        }
    }

    println!();
    println!("Summary:");
    println!("--------");
    let unassigned = counts.get(UNASSIGNED_KEY).copied().unwrap_or(0);
    println!("  Unassigned bookmarks: {unassigned}");
    println!("  Total bookmarks: {total}");

    let known: HashSet<&str> = albums.iter().map(|album| album.id.as_str()).collect();
    for (key, count) in &counts {
        if key != UNASSIGNED_KEY && !known.contains(key.as_str()) {
            println!("  ⚠️  {count} bookmark(s) reference missing album {key}");
        }
    }
    Ok(())
}

async fn report_bookmarks(
    shelf: &Shelf<RestStore>,
    user: &str,
    filter: &AlbumFilter,
) -> Result<()> {
    let bookmarks = shelf.list_bookmarks_in_album(user, filter).await?;

    println!("Bookmarks for user {user}");
    println!("=========================");
    println!("Filter: {}", describe(filter));
    println!();

    if bookmarks.is_empty() {
        println!("  No bookmarks found");
        return Ok(());
    }

    println!("  Total bookmarks: {}", bookmarks.len());
    println!();
    for bookmark in &bookmarks {
        println!("  Bookmark: {}", bookmark.id);
        println!("    Video: {}", bookmark.video_id);
        match &bookmark.album_id {
            Some(album) => println!("    Album: {album}"),
            None => println!("    Album: (unassigned)"),
        }
        println!("    Saved: {}", bookmark.created_at);
    }
    Ok(())
}

async fn report_orphans(
    shelf: &Shelf<RestStore>,
    user: &str,
    filter: &AlbumFilter,
    clean: bool,
) -> Result<()> {
    let scan = shelf.scan_orphans(user, filter).await?;

    println!("Orphan scan for user {user}");
    println!("===========================");
    println!("Filter: {}", describe(filter));
    println!(
        "Considered {} bookmark(s), {} video(s) resolved",
        scan.bookmarks_considered, scan.videos_resolved
    );
    println!();

    if scan.orphans.is_empty() {
        println!("  ✅ No orphaned bookmarks");
        return Ok(());
    }

    for orphan in &scan.orphans {
        println!(
            "  ⚠️  Bookmark {} references missing video {}",
            orphan.id, orphan.video_id
        );
    }
    println!();

    if clean {
        let outcome = shelf.clean_orphans(&scan.orphans).await;
        println!("Cleanup: {}", outcome.summary());
        for failure in &outcome.failed {
            println!("  ❌ {}: {}", failure.id, failure.error);
        }
    } else {
        println!(
            "Run again with --clean to remove {} orphan(s)",
            scan.orphans.len()
        );
    }
    Ok(())
}
