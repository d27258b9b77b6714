//! CLI definitions for sandbox
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sandbox",
    version,
    about = "Build Apptainer images and publish them to ECR Public",
    long_about = "Welcome to the Sandbox CLI!\n\nMore information can be shown for each command listed below by running it with the --help option."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save the credentials used by the apptainer subcommand
    SetConfig {
        /// The access key id used by the apptainer subcommand
        #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
        aws_access_key_id: String,

        /// The secret access key used by the apptainer subcommand
        #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
        aws_secret_access_key: String,

        /// The public registry to use
        #[arg(long, env = "AWS_ECR_PUBLIC_REGISTRY")]
        aws_ecr_public_registry: String,
    },

    /// Show the current config
    ShowConfig,

    /// Remove the saved config
    ClearConfig,

    /// Commands to interact with apptainer
    #[command(subcommand)]
    Apptainer(ApptainerCommands),
}

#[derive(Subcommand)]
pub enum ApptainerCommands {
    /// Build an apptainer .sif file from a Dockerfile
    Build {
        /// Name of the image; a random friendly name is used when omitted
        #[arg(long)]
        image_name: Option<String>,

        /// Dockerfile path, or any image reference apptainer understands
        #[arg(long, default_value = "./Dockerfile")]
        image_source: String,

        /// Directory the .sif file is written to (default: current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Publish an apptainer .sif image to public ECR
    Publish {
        /// The path to the apptainer image (.sif) that is being published
        #[arg(long, required = true)]
        image_path: PathBuf,

        /// The tag to use for the image
        #[arg(long, default_value = "latest")]
        image_tag: String,
    },
}
