//! Thin command-line front for the practice tracker: a dashboard over the
//! store plus backup export/import. Everything interesting lives in the
//! library; this file only parses a subcommand and prints results.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use repertoire::{Repertoire, SongStatus};

fn print_usage() {
    println!("repertoire - personal music practice tracker");
    println!();
    println!("Usage: repertoire [COMMAND]");
    println!();
    println!("Commands:");
    println!("  (none)           Show the practice dashboard");
    println!("  library          List every song in the repertoire");
    println!("  stats            Show the weekly chart and current streak");
    println!("  suggest          Pick one song to practice now");
    println!("  export <FILE>    Write a JSON backup of the whole library");
    println!("  import <FILE>    Merge a JSON backup into the library");
    println!("  help             Show this message");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => dashboard(),
        Some("library") => library(),
        Some("stats") => stats(),
        Some("suggest") => suggest(),
        Some("export") => match args.get(1) {
            Some(path) => export(path),
            None => {
                print_usage();
                Ok(())
            }
        },
        Some("import") => match args.get(1) {
            Some(path) => import(path),
            None => {
                print_usage();
                Ok(())
            }
        },
        Some("help") | Some("--help") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_usage();
            Ok(())
        }
    }
}

fn dashboard() -> Result<()> {
    let repo = Repertoire::open_default()?;
    let songs = repo.songs();

    let count_with = |status: SongStatus| songs.iter().filter(|s| s.status == status).count();
    println!(
        "Library: {} songs ({} learning, {} wishlist, {} learned)",
        songs.len(),
        count_with(SongStatus::Learning),
        count_with(SongStatus::WantToLearn),
        count_with(SongStatus::Learned),
    );

    println!();
    print_stats(&repo);

    if let Some(song) = repo.suggestion() {
        println!();
        println!("Why not practice: {} - {}", song.title, song.artist);
    }

    Ok(())
}

fn stats() -> Result<()> {
    let repo = Repertoire::open_default()?;
    print_stats(&repo);
    Ok(())
}

fn print_stats(repo: &Repertoire) {
    let stats = repo.practice_stats();
    println!("Last seven days:");
    for bucket in &stats.last_seven_days {
        let bar = "#".repeat((bucket.minutes / 5.0).round() as usize);
        println!("  {:<4} {:>6.1} min  {bar}", bucket.label, bucket.minutes);
    }
    println!();
    println!("Current streak: {} day(s)", stats.current_streak);
}

fn library() -> Result<()> {
    let repo = Repertoire::open_default()?;
    let songs = repo.songs();
    if songs.is_empty() {
        println!("Library is empty.");
        return Ok(());
    }

    for song in songs {
        println!(
            "{:<12} {:>3}%  {} - {}",
            song.status.as_str(),
            song.progress,
            song.title,
            song.artist
        );
    }
    Ok(())
}

fn suggest() -> Result<()> {
    let repo = Repertoire::open_default()?;
    match repo.suggestion() {
        Some(song) => println!("{} - {}", song.title, song.artist),
        None => println!("Library is empty; add a song first."),
    }
    Ok(())
}

fn export(path: &str) -> Result<()> {
    let repo = Repertoire::open_default()?;
    let json = repo.export_json()?;
    fs::write(path, json).with_context(|| format!("failed to write backup to {path}"))?;
    println!("Backup written to {path}");
    Ok(())
}

fn import(path: &str) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let mut repo = Repertoire::open_default()?;
    repo.import_json(&json)?;
    println!("Backup merged from {path}");
    Ok(())
}
