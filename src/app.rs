use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, Stream};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use crate::core::{SynthesisContext, Voice, VoiceKind};
use crate::input::{KeyboardInput, KEYBOARD_DIAGRAM};
use crate::messaging::{BusStatus, MessageBus, SynthMessage};

const MESSAGES_PER_WAKE: usize = 64;
const WAKE_INTERVAL: Duration = Duration::from_millis(20);

/// Options the live synth is started with
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub voice: VoiceKind,
    pub master_volume: f64,
    pub output_device: Option<String>,
    pub release_timeout: Duration,
}

/// Live synth: an output stream, the shared context, and the control loop
pub struct SynthApp {
    context: Arc<SynthesisContext>,
    message_bus: MessageBus,
    input_sender: Sender<SynthMessage>,
    _stream: Stream,
    release_timeout: Duration,
}

impl SynthApp {
    pub fn new(options: &PlayOptions) -> Result<Self> {
        let host = cpal::default_host();
        info!("Using audio host: {}", host.id().name());

        let device = select_output_device(&host, options.output_device.as_deref())?;
        info!("Using output device: {}", device.name().unwrap_or_else(|_| "<unnamed>".into()));

        let config = device.default_output_config()
            .context("Failed to get default output config")?;
        info!("Device config: {:?}", config);

        let sample_format = config.sample_format();
        let config = cpal::StreamConfig::from(config);
        let sample_rate = config.sample_rate.0;

        // Create the shared state first, the stream and the bus both hold it
        let context = Arc::new(SynthesisContext::new(Voice::new(options.voice)));
        context.set_volume(options.master_volume);
        let (message_bus, input_sender) = MessageBus::new(Arc::clone(&context));

        let stream = match sample_format {
            SampleFormat::F32 => create_stream::<f32>(&device, &config, Arc::clone(&context)),
            SampleFormat::I16 => create_stream::<i16>(&device, &config, Arc::clone(&context)),
            SampleFormat::U16 => create_stream::<u16>(&device, &config, Arc::clone(&context)),
            other => anyhow::bail!("Unsupported sample format {:?}", other),
        }?;

        stream.play().context("Failed to start audio stream")?;
        info!("Audio stream started at {} Hz with the {:?} voice", sample_rate, options.voice);

        Ok(SynthApp {
            context,
            message_bus,
            input_sender,
            _stream: stream,
            release_timeout: options.release_timeout,
        })
    }

    /// Read the keyboard and play until the user quits or the keyboard thread stops
    pub fn run(self) -> Result<()> {
        let SynthApp { context, mut message_bus, input_sender, _stream, release_timeout } = self;

        println!("{}", KEYBOARD_DIAGRAM);
        println!("Play with the keys above. +/- volume, space silences, Esc or q quits.");

        // The keyboard thread holds the only sender, so the bus quits when it exits
        let keyboard = KeyboardInput::spawn(input_sender, release_timeout)?;

        while message_bus.wait_and_process(WAKE_INTERVAL, MESSAGES_PER_WAKE) == BusStatus::Running {}

        keyboard.join()?;
        info!("Stopped at {:.2}s of playback", context.time());
        Ok(())
    }
}

fn select_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    if let Some(wanted) = name {
        let devices = host.output_devices().context("Failed to enumerate output devices")?;
        for device in devices {
            if device.name().map(|n| n == wanted).unwrap_or(false) {
                return Ok(device);
            }
        }
        warn!("Output device '{}' not found, using the default", wanted);
    }

    host.default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))
}

/// Names of every output device, with a flag for the host default
pub fn list_output_devices() -> Result<Vec<(String, bool)>> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut names = Vec::new();
    for device in host.output_devices().context("Failed to enumerate output devices")? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let is_default = default_name.as_deref() == Some(name.as_str());
        names.push((name, is_default));
    }
    Ok(names)
}

/// Build an output stream that renders one synth sample per frame.
///
/// The callback owns the sample counter that defines playback time.
fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    context: Arc<SynthesisContext>,
) -> Result<Stream>
where
    T: Sample + Send + 'static + cpal::SizedSample + cpal::FromSample<f32>,
{
    let config = config.clone();
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0 as f64;
    let err_fn = |err| error!("An error occurred on the audio stream: {}", err);
    let mut frames_played: u64 = 0;

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_frames(data, channels, &mut frames_played, sample_rate, &context);
        },
        err_fn,
        None,
    )
    .context("Failed to build output stream")?;

    Ok(stream)
}

/// Fill an interleaved buffer, one synth sample per frame copied to every channel.
///
/// `frames_played` is the running frame count across buffers; frame `n` is
/// rendered at `n / sample_rate` seconds.
fn write_frames<T>(
    data: &mut [T],
    channels: usize,
    frames_played: &mut u64,
    sample_rate: f64,
    context: &SynthesisContext,
)
where
    T: Sample + cpal::FromSample<f32>,
{
    for frame in data.chunks_mut(channels.max(1)) {
        let time = *frames_played as f64 / sample_rate;
        *frames_played += 1;

        let value = T::from_sample(context.render(time) as f32);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
