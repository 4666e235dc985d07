//! Command-line interface for revoice
//!
//! Provides argument parsing using clap derive macros.

use crate::synth::voice::{Gender, Language};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Real-time voice relay
#[derive(Parser, Debug)]
#[command(
    name = "revoice",
    version,
    about = "Re-voices microphone speech through a synthesizer"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Audio input device name
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Audio output device name (default: prefer a virtual cable)
    #[arg(long, value_name = "DEVICE")]
    pub output_device: Option<String>,

    /// Recognition and synthesis language
    #[arg(long, value_enum, value_name = "LANG")]
    pub language: Option<Language>,

    /// Synthesized voice gender
    #[arg(long, value_enum, value_name = "GENDER")]
    pub gender: Option<Gender>,

    /// Directory holding the recognition models
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Synthesizer binary (default: espeak-ng next to the executable, then PATH)
    #[arg(long, value_name = "PATH")]
    pub synth_bin: Option<PathBuf>,

    /// Record the converted recognizer input to a WAV file for diagnosis
    #[arg(long)]
    pub debug_dump: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay until stdin closes (default command)
    Run,

    /// List available audio devices
    Devices,
}
