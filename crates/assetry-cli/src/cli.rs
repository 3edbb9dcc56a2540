use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "assetry",
    about = "Assetry — file asset storage with on-demand thumbnails",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the files root directory
    #[arg(long, global = true)]
    pub files_root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Store a local file as a new blob
    Put(PutArgs),
    /// Read a blob back
    Get(GetArgs),
    /// Produce (or reuse) the thumbnail of an image blob
    Thumbnail(ThumbnailArgs),
    /// Delete a blob
    Rm(RmArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct PutArgs {
    pub path: PathBuf,
    /// Media type; guessed from the file extension when omitted
    #[arg(long)]
    pub mime: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    /// Assigned name of the blob
    pub name: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ThumbnailArgs {
    /// Assigned name of the source blob
    pub name: String,
    /// Media type the source was stored with
    #[arg(long)]
    pub mime: String,
    /// Where to copy the JPEG thumbnail
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct RmArgs {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_put_with_mime() {
        let cli = Cli::try_parse_from(["assetry", "put", "cat.png", "--mime", "image/png"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("cat.png"));
            assert_eq!(args.mime.as_deref(), Some("image/png"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get_to_file() {
        let cli = Cli::try_parse_from(["assetry", "get", "abc", "-o", "out.bin"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.name, "abc");
            assert_eq!(args.out, Some(PathBuf::from("out.bin")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn thumbnail_requires_mime_and_out() {
        assert!(Cli::try_parse_from(["assetry", "thumbnail", "abc"]).is_err());
        let cli = Cli::try_parse_from([
            "assetry", "thumbnail", "abc", "--mime", "image/png", "--out", "t.jpg",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Thumbnail(_)));
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["assetry", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "assetry", "rm", "abc", "--config", "assetry.toml", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("assetry.toml")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["assetry", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config));
    }
}
