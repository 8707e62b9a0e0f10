//! treeclone command line interface

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use treeclone::{digest_file, dir_copy, CopyMode};

#[derive(Parser)]
#[command(name = "treeclone")]
#[command(about = "directory tree replication for container layers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// replicate a directory tree
    Copy {
        /// source directory
        source: PathBuf,

        /// destination directory
        destination: PathBuf,

        /// hardlink regular files to the source instead of copying
        #[arg(long)]
        hardlink: bool,

        /// skip extended attributes
        #[arg(long)]
        no_xattrs: bool,
    },

    /// print the content digest of a file
    Digest {
        /// file to digest
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> treeclone::Result<()> {
    match cli.command {
        Commands::Copy {
            source,
            destination,
            hardlink,
            no_xattrs,
        } => {
            let mode = if hardlink {
                CopyMode::Hardlink
            } else {
                CopyMode::Content
            };
            dir_copy(&source, &destination, mode, !no_xattrs)?;
            println!("copied {} to {}", source.display(), destination.display());
        }

        Commands::Digest { file } => {
            println!("{}", digest_file(&file)?);
        }
    }

    Ok(())
}
