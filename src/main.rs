use anyhow::Result;
use clap::Parser;
use revoice::cli::{Cli, Commands};
#[cfg(feature = "cpal-audio")]
use revoice::config::Config;
#[cfg(feature = "cpal-audio")]
use revoice::pipeline::{RelayBackend, RelayController, RelayOptions};
#[cfg(feature = "cpal-audio")]
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => run_relay(cli)?,
        Some(Commands::Devices) => list_audio_devices()?,
    }

    Ok(())
}

#[cfg(feature = "cpal-audio")]
fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_or_default(path),
        None => Config::load_or_default(&Config::default_path()),
    }
    .with_env_overrides()
}

/// Merge config and CLI into session options. CLI wins.
#[cfg(feature = "cpal-audio")]
fn resolve_options(cli: &Cli, config: Config) -> RelayOptions {
    RelayOptions {
        input_device: cli.device.clone().or(config.audio.input_device),
        output_device: cli.output_device.clone().or(config.audio.output_device),
        models_dir: cli
            .models_dir
            .clone()
            .unwrap_or(config.recognition.models_dir),
        language: cli.language.unwrap_or(config.recognition.language),
        gender: cli.gender.unwrap_or(config.synthesis.gender),
        synth_binary: cli.synth_bin.clone().or(config.synthesis.binary),
        debug_dump: cli.debug_dump || config.audio.debug_dump,
    }
}

#[cfg(feature = "cpal-audio")]
fn run_relay(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());
    let options = resolve_options(&cli, config);

    let mut controller = RelayController::new(options, RelayBackend::system());
    controller.enable()?;

    // Relay until the user presses Enter or stdin closes.
    eprintln!("revoice: relaying; press Enter to stop");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    controller.disable();
    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn run_relay(_cli: Cli) -> Result<()> {
    anyhow::bail!("Built without audio support (enable the `cpal-audio` feature)")
}

#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let inputs = revoice::audio::capture::list_input_devices()?;
    println!("Input devices:");
    if inputs.is_empty() {
        println!("  (none found)");
    }
    for name in inputs {
        println!("  {}", name);
    }

    let outputs = revoice::audio::capture::list_output_devices()?;
    println!("Output devices:");
    if outputs.is_empty() {
        println!("  (none found)");
    }
    for name in outputs {
        println!("  {}", name);
    }
    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    anyhow::bail!("Built without audio support (enable the `cpal-audio` feature)")
}
