use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use keysynth::app::{self, PlayOptions, SynthApp};
use keysynth::core::VoiceKind;
use keysynth::render::{self, RenderRequest};
use keysynth::settings::AppSettings;

#[derive(Parser)]
#[command(name = "keysynth", version)]
#[command(about = "Monophonic synthesizer played from the computer keyboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    play: PlayArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Play live from the keyboard (the default)
    Play(PlayArgs),
    /// List audio output devices
    Devices,
    /// Render one note to a WAV file
    Render {
        /// Instrument voice
        #[arg(long, value_enum, default_value_t = VoiceKind::Harmonica)]
        voice: VoiceKind,
        /// Note index in the 16-key layout (0 = 110 Hz)
        #[arg(long, default_value_t = 0)]
        note: usize,
        /// Seconds the key is held
        #[arg(long, default_value_t = 1.0)]
        hold: f64,
        /// Seconds rendered after the key is released
        #[arg(long, default_value_t = 1.0)]
        tail: f64,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long)]
        volume: Option<f64>,
        /// Output WAV path
        #[arg(long, short)]
        out: PathBuf,
    },
}

#[derive(Args, Clone, Default)]
struct PlayArgs {
    /// Instrument voice, overrides the settings file
    #[arg(long, value_enum)]
    voice: Option<VoiceKind>,
    /// Master volume between 0 and 1
    #[arg(long)]
    volume: Option<f64>,
    /// Output device name as listed by `keysynth devices`
    #[arg(long)]
    device: Option<String>,
    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        None => play(AppSettings::load()?, cli.play),
        Some(Commands::Play(args)) => play(AppSettings::load()?, args),
        Some(Commands::Devices) => {
            for (name, is_default) in app::list_output_devices()? {
                let marker = if is_default { " (default)" } else { "" };
                println!("Found output device: {}{}", name, marker);
            }
            Ok(())
        },
        Some(Commands::Render { voice, note, hold, tail, sample_rate, volume, out }) => {
            let volume = match volume {
                Some(volume) => volume,
                None => AppSettings::load()?.master_volume,
            };
            render::render_to_file(&RenderRequest {
                voice,
                note,
                hold,
                tail,
                sample_rate,
                volume,
                output: out,
            })
        },
    }
}

fn play(mut settings: AppSettings, args: PlayArgs) -> Result<()> {
    if let Some(voice) = args.voice {
        settings.voice = voice;
    }
    if let Some(volume) = args.volume {
        settings.master_volume = volume;
    }
    if args.device.is_some() {
        settings.output_device = args.device;
    }
    if args.save_settings {
        let path = settings.save()?;
        info!("Saved settings to {}", path.display());
    }

    let options = PlayOptions {
        voice: settings.voice,
        master_volume: settings.master_volume,
        output_device: settings.output_device.clone(),
        release_timeout: Duration::from_millis(settings.release_timeout_ms),
    };
    SynthApp::new(&options)?.run()
}
