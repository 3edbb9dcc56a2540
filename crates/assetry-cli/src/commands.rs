use std::path::Path;

use anyhow::Context;
use assetry_pipeline::{AssetService, IngestedAsset, IngestionMode, UploadRequest, FILE_FIELD_NAME};
use assetry_server::{AssetServer, ServerConfig};
use assetry_types::{AssignedName, MediaType};
use colored::Colorize;
use image::ImageFormat;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Put(args) => cmd_put(config, args, &cli.format).await,
        Command::Get(args) => cmd_get(config, args).await,
        Command::Thumbnail(args) => cmd_thumbnail(config, args).await,
        Command::Rm(args) => cmd_rm(config, args).await,
        Command::Config => cmd_config(&config),
    }
}

/// File, then environment, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env()?;
    if let Some(root) = &cli.files_root {
        config.files_root = root.clone();
    }
    Ok(config)
}

async fn open_service(config: &ServerConfig) -> anyhow::Result<AssetService> {
    AssetService::open(config.asset_config())
        .await
        .with_context(|| format!("opening files root {}", config.files_root.display()))
}

/// Media type from the file extension, for the formats the image decoder
/// knows. Everything else is stored as an octet stream.
fn guess_media_type(path: &Path) -> MediaType {
    ImageFormat::from_path(path)
        .ok()
        .and_then(|f| MediaType::new(f.to_mime_type()).ok())
        .unwrap_or_else(MediaType::octet_stream)
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    println!(
        "Assetry server on {} (root: {})",
        config.bind_addr.to_string().bold(),
        config.files_root.display()
    );
    AssetServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_put(config: ServerConfig, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let service = open_service(&config).await?;
    let media_type = match &args.mime {
        Some(mime) => MediaType::new(mime)?,
        None => guess_media_type(&args.path),
    };
    let file = tokio::fs::File::open(&args.path)
        .await
        .with_context(|| format!("opening {}", args.path.display()))?;
    let size = file.metadata().await?.len();
    let original_name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let upload = UploadRequest::new(FILE_FIELD_NAME, original_name, media_type, Box::new(file))
        .with_declared_size(size);
    let asset = service
        .ingest(IngestionMode::WithBlob, Some(upload))
        .await?
        .context("ingestion produced no blob")?;
    print_asset(&asset, format)
}

fn print_asset(asset: &IngestedAsset, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(asset)?),
        OutputFormat::Text => {
            println!("{} Stored {}", "✓".green().bold(), asset.original_name.bold());
            println!("  Name: {}", asset.name.as_str().yellow());
            println!("  Type: {}", asset.media_type.as_str().cyan());
            println!("  Size: {} bytes", asset.size);
        }
    }
    Ok(())
}

async fn cmd_get(config: ServerConfig, args: GetArgs) -> anyhow::Result<()> {
    let service = open_service(&config).await?;
    let name = AssignedName::parse(&args.name)?;
    let mut reader = service.open_blob(&name).await?;
    match &args.out {
        Some(out) => {
            let mut file = tokio::fs::File::create(out)
                .await
                .with_context(|| format!("creating {}", out.display()))?;
            let copied = tokio::io::copy(&mut reader, &mut file).await?;
            eprintln!("{} Wrote {} bytes to {}", "✓".green(), copied, out.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            tokio::io::AsyncWriteExt::flush(&mut stdout).await?;
        }
    }
    Ok(())
}

async fn cmd_thumbnail(config: ServerConfig, args: ThumbnailArgs) -> anyhow::Result<()> {
    let service = open_service(&config).await?;
    let name = AssignedName::parse(&args.name)?;
    let media_type = MediaType::new(&args.mime)?;
    let mut thumb = service.thumbnail(&name, &media_type).await?;
    let mut out = tokio::fs::File::create(&args.out)
        .await
        .with_context(|| format!("creating {}", args.out.display()))?;
    tokio::io::copy(&mut thumb.file, &mut out).await?;

    let state = if thumb.derived { "derived" } else { "cached" };
    println!(
        "{} Thumbnail of {} ({}, {} bytes) → {}",
        "✓".green().bold(),
        name.short().yellow(),
        state.cyan(),
        thumb.size,
        args.out.display()
    );
    Ok(())
}

async fn cmd_rm(config: ServerConfig, args: RmArgs) -> anyhow::Result<()> {
    let service = open_service(&config).await?;
    let name = AssignedName::parse(&args.name)?;
    service.delete_asset(&name).await?;
    println!("Deleted {}", name.as_str().yellow());
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn guesses_image_types_from_extension() {
        assert_eq!(guess_media_type(Path::new("a.png")).as_str(), "image/png");
        assert_eq!(guess_media_type(Path::new("b.JPG")).as_str(), "image/jpeg");
        assert_eq!(
            guess_media_type(Path::new("notes.txt")).as_str(),
            "application/octet-stream"
        );
        assert_eq!(
            guess_media_type(Path::new("no_extension")).as_str(),
            "application/octet-stream"
        );
    }

    #[test]
    fn files_root_flag_wins() {
        let cli = Cli::try_parse_from(["assetry", "config", "--files-root", "/tmp/assets"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.files_root, std::path::PathBuf::from("/tmp/assets"));
    }

    #[tokio::test]
    async fn put_get_rm_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            files_root: dir.path().join("files"),
            ..ServerConfig::default()
        };
        let src = dir.path().join("hello.txt");
        std::fs::write(&src, b"hello assetry").unwrap();

        cmd_put(
            config.clone(),
            PutArgs { path: src, mime: Some("text/plain".into()) },
            &OutputFormat::Json,
        )
        .await
        .unwrap();

        let blobs: Vec<_> = std::fs::read_dir(dir.path().join("files").join("blobs"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(blobs.len(), 1);
        let name = blobs[0].clone();

        let out = dir.path().join("copy.txt");
        cmd_get(config.clone(), GetArgs { name: name.clone(), out: Some(out.clone()) })
            .await
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"hello assetry");

        cmd_rm(config.clone(), RmArgs { name: name.clone() }).await.unwrap();
        assert!(cmd_get(config, GetArgs { name, out: Some(out) }).await.is_err());
    }

    #[tokio::test]
    async fn get_rejects_malformed_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            files_root: dir.path().join("files"),
            ..ServerConfig::default()
        };
        let err = cmd_get(config, GetArgs { name: "../etc/passwd".into(), out: None })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }
}
