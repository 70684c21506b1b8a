// bucketdrive-cli: command-line host for the storage drive.
// Argument parsing, config loading, and plain-text output around
// bucketdrive-core. No adapter semantics live here.

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bucketdrive_core::{
    CreateOptions, Drive, DriveConfig, DrivePath, Entry, EntryContent, EntryFormat, EntryType,
    SaveOptions,
};

#[derive(Parser)]
#[command(name = "bucketdrive", about = "Browse and edit an object-storage bucket as a filesystem")]
struct Cli {
    /// TOML config file with base_url and download_url_prefix.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL (overrides the config file).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Public download-link prefix (overrides the config file).
    #[arg(long, global = true)]
    download_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory.
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print a file's content.
    Cat { path: String },
    /// Save content to a path (from a file, or stdin when omitted).
    Save {
        path: String,
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long, default_value = "text/plain")]
        mimetype: String,
    },
    /// Delete a file or directory.
    Rm { path: String },
    /// Rename (move) a file or directory.
    Mv { old: String, new: String },
    /// Copy a file into a directory.
    Cp { path: String, to_dir: String },
    /// Create an untitled file or directory.
    New {
        #[arg(default_value = "")]
        path: String,
        #[arg(long)]
        dir: bool,
        #[arg(long)]
        ext: Option<String>,
    },
    /// Print the public download link for a path.
    Url { path: String },
}

fn load_config(cli: &Cli) -> Result<DriveConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => DriveConfig::from_toml(&std::fs::read_to_string(path)?)?,
        None => {
            let (Some(base_url), Some(prefix)) = (&cli.base_url, &cli.download_prefix) else {
                return Err("pass --config, or both --base-url and --download-prefix".into());
            };
            DriveConfig::new(base_url.as_str(), prefix.as_str())
        }
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(prefix) = &cli.download_prefix {
        config.download_url_prefix = prefix.clone();
    }
    Ok(config)
}

fn print_listing(entry: &Entry) {
    if let Some(EntryContent::Listing(children)) = &entry.content {
        for child in children {
            let marker = match child.entry_type {
                EntryType::Directory => "d",
                EntryType::File => "-",
            };
            let writable = if child.writable { "w" } else { "-" };
            println!("{marker}{writable} {}", child.name);
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let drive = Drive::new(load_config(&cli)?)?;
    match cli.command {
        Command::Ls { path } => {
            let entry = drive.fetch(&DrivePath::new(&path)?).await?;
            print_listing(&entry);
        }
        Command::Cat { path } => {
            let entry = drive.fetch(&DrivePath::new(&path)?).await?;
            match entry.content {
                Some(EntryContent::Text(text)) => print!("{text}"),
                _ => return Err(format!("'{path}' is not a file with content").into()),
            }
        }
        Command::Save { path, from, mimetype } => {
            let content = match from {
                Some(file) => std::fs::read_to_string(file)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let target = DrivePath::new(&path)?;
            let options = SaveOptions {
                format: EntryFormat::Text,
                content: Some(content),
                mime_type: Some(mimetype),
                created_at: None,
                last_modified: None,
            };
            let entry = drive.save(&target, &options).await?;
            log::info!("saved {}", entry.path);
        }
        Command::Rm { path } => {
            drive.delete(&DrivePath::new(&path)?).await?;
        }
        Command::Mv { old, new } => {
            let entry = drive
                .rename(&DrivePath::new(&old)?, &DrivePath::new(&new)?)
                .await?;
            println!("{}", entry.path);
        }
        Command::Cp { path, to_dir } => {
            let entry = drive
                .copy(&DrivePath::new(&path)?, &DrivePath::new(&to_dir)?)
                .await?;
            println!("{}", entry.path);
        }
        Command::New { path, dir, ext } => {
            let options = CreateOptions {
                path: DrivePath::new(&path)?,
                entry_type: if dir {
                    EntryType::Directory
                } else {
                    EntryType::File
                },
                ext,
                name: None,
            };
            let entry = drive.new_untitled(&options).await?;
            println!("{}", entry.path);
        }
        Command::Url { path } => {
            println!("{}", drive.download_url(&DrivePath::new(&path)?)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"https://host/api/storage\"\ndownload_url_prefix = \"https://dl/\""
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "bucketdrive",
            "--config",
            file.path().to_str().unwrap(),
            "--base-url",
            "https://other/api",
            "ls",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "https://other/api");
        assert_eq!(config.download_url_prefix, "https://dl/");
    }

    #[test]
    fn test_flags_alone_are_enough() {
        let cli = Cli::try_parse_from([
            "bucketdrive",
            "--base-url",
            "https://host/api",
            "--download-prefix",
            "https://dl/",
            "url",
            "a/b.txt",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "https://host/api");
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let cli = Cli::try_parse_from(["bucketdrive", "ls"]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
