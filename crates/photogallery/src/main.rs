//! `photogal` - CLI for photogallery
//!
//! Drives the gallery from a desktop shell: captures are imported from image
//! files and positions come from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use photogallery::cli::{
    CaptureCommand, Cli, Command, ConfigCommand, DeleteCommand, SearchCommand, ShowCommand,
};
use photogallery::detail::{DetailView, Navigation};
use photogallery::providers::desktop::{ConsoleNotifier, FileCamera, FixedLocation, GrantAll};
use photogallery::record::PhotoRecord;
use photogallery::{
    init_logging, CaptureOutcome, CaptureWorkflow, Config, DetailRoute, Error, Gallery,
    PhotoStore, Providers, SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::List(cmd) => {
            let gallery = open_gallery(&config)?;
            print_records(&gallery.visible(), cmd.json)
        }
        Command::Search(cmd) => handle_search(&config, &cmd),
        Command::Show(cmd) => handle_show(&config, &cmd),
        Command::Delete(cmd) => handle_delete(&config, &cmd),
        Command::Capture(cmd) => handle_capture(&config, cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_gallery(config: &Config) -> anyhow::Result<Gallery> {
    let path = config.database_path();
    let kv = SqliteStore::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    let mut gallery = Gallery::new(
        PhotoStore::with_key(kv, config.storage.photos_key.clone()),
        config.theme(),
    );
    gallery.mount();
    Ok(gallery)
}

fn print_records(records: &[&PhotoRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No photos.");
        return Ok(());
    }

    for record in records {
        match record.coordinates() {
            Some(coords) => println!("{}  {}  ({})", record.captured_at(), record.uri(), coords),
            None => println!("{}  {}", record.captured_at(), record.uri()),
        }
    }
    Ok(())
}

fn detail_for(gallery: &Gallery, uri: &str) -> photogallery::Result<DetailView> {
    gallery
        .open_detail(uri)
        .ok_or_else(|| Error::record_not_found(uri))
}

fn handle_search(config: &Config, cmd: &SearchCommand) -> anyhow::Result<()> {
    let mut gallery = open_gallery(config)?;
    gallery.set_search(cmd.text.clone());
    print_records(&gallery.visible(), cmd.json)
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    let gallery = open_gallery(config)?;
    let view = detail_for(&gallery, &cmd.uri)?;

    if cmd.json {
        let route: &DetailRoute = view.route();
        println!("{}", serde_json::to_string_pretty(route)?);
    } else {
        println!("{}", view.uri());
        for line in view.info_lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let mut gallery = open_gallery(config)?;
    let view = detail_for(&gallery, &cmd.uri)?;

    let prompt = view.request_delete();
    println!("{}", prompt.title);
    println!("{}", prompt.message);

    if !cmd.yes {
        println!("Use --yes to confirm.");
        let _ = view.cancel_delete();
        return Ok(());
    }

    if view.confirm_delete() == Navigation::Back {
        gallery.process_detail_events();
    }
    println!("Deleted {}", cmd.uri);
    Ok(())
}

async fn handle_capture(config: &Config, cmd: CaptureCommand) -> anyhow::Result<()> {
    let mut settings = config.capture_settings();
    settings.camera.camera_type = cmd.camera_type(settings.camera.camera_type);

    let providers = Providers {
        permissions: Arc::new(GrantAll),
        location: Arc::new(FixedLocation::new(cmd.coordinates())),
        camera: Arc::new(FileCamera::new(cmd.file, Some(config.library_dir()))),
        notifier: Arc::new(ConsoleNotifier),
    };
    let workflow = CaptureWorkflow::new(providers, settings);

    let mut gallery = open_gallery(config)?;
    let outcome = gallery.capture(&workflow).await?;

    match outcome {
        CaptureOutcome::Captured { uri, coordinates } => match coordinates {
            Some(coords) => println!("Captured {uri} at {coords}"),
            None => println!("Captured {uri}"),
        },
        CaptureOutcome::Cancelled => println!("Capture cancelled."),
        CaptureOutcome::PermissionDenied => println!("Camera permission denied."),
        CaptureOutcome::NoAsset => println!("The camera returned no photo."),
        CaptureOutcome::Failed { code, message } => {
            bail!("camera error {code}: {message}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Photos key:         {}", config.storage.photos_key);
                println!("  Library:            {}", config.library_dir().display());
                println!();
                println!("[Capture]");
                println!("  Platform:           {}", config.platform());
                println!("  Camera:             {:?}", config.capture.camera_type);
                println!("  Save to photos:     {}", config.capture.save_to_photos);
                println!();
                println!("[Location]");
                println!("  Enabled:            {}", config.location.enabled);
                println!("  High accuracy:      {}", config.location.high_accuracy);
                println!("  Timeout (ms):       {}", config.location.timeout_ms);
                println!("  Maximum age (ms):   {}", config.location.maximum_age_ms);
                println!();
                println!("[Appearance]");
                println!("  Theme:              {:?}", config.theme());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_file(&path) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
