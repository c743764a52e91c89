mod settings;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use clap::{Args, Parser, Subcommand};
use crossbeam_channel::{unbounded, Sender};

use pitchplay_core::audio::domain::playback_options::{
    PlaybackOptions, Preset, MAX_PITCH_CENTS, MAX_RATE, MIN_PITCH_CENTS,
};
use pitchplay_core::audio::infrastructure::ffmpeg_source_reader::FfmpegSourceReader;
use pitchplay_core::audio::infrastructure::ffmpeg_wav_writer::FfmpegWavWriter;
use pitchplay_core::playback::completion_scheduler::CompletionScheduler;
use pitchplay_core::playback::domain::clock::SystemClock;
use pitchplay_core::playback::domain::play_state::PlayState;
use pitchplay_core::playback::domain::playback_delegate::PlaybackDelegate;
use pitchplay_core::playback::event_loop::{self, Command};
use pitchplay_core::playback::infrastructure::cpal_output_device::CpalOutputDevice;
use pitchplay_core::playback::playback_controller::PlaybackController;
use pitchplay_core::playback::playback_engine::PlaybackEngine;
use pitchplay_core::recording::domain::recorder::{Recorder, RecorderError};
use pitchplay_core::recording::infrastructure::cpal_recorder::CpalRecorder;

use settings::Settings;

/// Record your voice and play it back slow, fast, high, low, with echo or reverb.
#[derive(Parser)]
#[command(name = "pitchplay")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Play a clip through an effect chain.
    Play(PlayArgs),
    /// Record a clip from the default microphone.
    Record {
        /// Where to save the clip (defaults to the configured recording path).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output device to play the recording back on.
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Clip to play (defaults to the last recording).
    input: Option<PathBuf>,

    /// One-tap effect: slow, fast, high, low, echo or reverb.
    #[arg(long)]
    preset: Option<Preset>,

    /// Playback rate (overrides the preset).
    #[arg(long)]
    rate: Option<f32>,

    /// Pitch shift in cents (overrides the preset).
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<f32>,

    /// Add the multi-tap echo.
    #[arg(long)]
    echo: bool,

    /// Add the cathedral reverb.
    #[arg(long)]
    reverb: bool,

    /// Output device name to route to (substring match, remembered).
    #[arg(long)]
    device: Option<String>,

    /// Read presets from stdin instead of playing once.
    #[arg(long)]
    interactive: bool,
}

/// Prints state changes and alerts to the terminal.
struct ConsoleDelegate;

impl PlaybackDelegate for ConsoleDelegate {
    fn notify_state(&mut self, state: PlayState) {
        eprintln!("[{state}]");
    }

    fn notify_error(&mut self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load();

    match cli.command {
        CliCommand::Play(args) => {
            let input = args
                .input
                .clone()
                .unwrap_or_else(|| settings.recording_path.clone());
            validate(&args, &input)?;
            if let Some(device) = &args.device {
                if *device != settings.output_device {
                    settings.output_device = device.clone();
                    settings.save();
                }
            }
            let mut controller = open_controller(&input, &settings.output_device)?;

            if args.interactive {
                run_interactive(&mut controller);
            } else {
                play_once(&mut controller, build_options(&args))?;
            }
        }
        CliCommand::Record { output, device } => {
            let output = output.unwrap_or_else(|| settings.recording_path.clone());
            let path = record_clip(&output)?;
            let device = device.unwrap_or_else(|| settings.output_device.clone());
            let mut controller = open_controller(&path, &device)?;
            run_interactive(&mut controller);
        }
    }

    Ok(())
}

fn open_controller(
    input: &Path,
    device: &str,
) -> Result<PlaybackController, Box<dyn std::error::Error>> {
    let engine = PlaybackEngine::new(Box::new(CpalOutputDevice::new(device)));
    let scheduler = CompletionScheduler::new(Box::new(SystemClock));
    let controller = PlaybackController::new(
        &FfmpegSourceReader,
        input,
        engine,
        scheduler,
        Box::new(ConsoleDelegate),
    )?;
    log::info!(
        "Loaded {} ({:.2}s)",
        input.display(),
        controller.source().duration()
    );
    Ok(controller)
}

fn play_once(
    controller: &mut PlaybackController,
    options: PlaybackOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.play(options);
    if controller.state() != PlayState::Playing {
        return Err("Playback did not start".into());
    }
    // Keep the sender alive so the loop only ends on completion.
    let (_commands, receiver) = unbounded();
    event_loop::run(controller, &receiver, true);
    Ok(())
}

fn run_interactive(controller: &mut PlaybackController) {
    eprintln!(
        "Type a preset ({}), 'play', 'stop' or 'quit'.",
        Preset::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let (sender, receiver) = unbounded();
    spawn_stdin_reader(sender);
    event_loop::run(controller, &receiver, false);
}

fn spawn_stdin_reader(sender: Sender<Command>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(Ok(command)) => {
                    let shutdown = command == Command::Shutdown;
                    if sender.send(command).is_err() || shutdown {
                        break;
                    }
                }
                Some(Err(message)) => eprintln!("{message}"),
                None => {}
            }
        }
    });
}

/// Maps one line of terminal input to a command. Blank lines give `None`.
fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let word = line.trim().to_lowercase();
    let command = match word.as_str() {
        "" => return None,
        "stop" => Ok(Command::Stop),
        "quit" | "exit" => Ok(Command::Shutdown),
        "play" => Ok(Command::Play(PlaybackOptions::default())),
        other => other
            .parse::<Preset>()
            .map(|preset| Command::Play(preset.options()))
            .map_err(|e| e.to_string()),
    };
    Some(command)
}

fn record_clip(output: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut recorder = CpalRecorder::new(output, Box::new(FfmpegWavWriter));

    let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
    recorder.initialize(Box::new(move |result: Result<(), RecorderError>| {
        let _ = ready_tx.send(result);
    }));
    ready_rx.recv()?.map_err(alert)?;

    recorder.record().map_err(alert)?;
    eprintln!("Recording... press Enter to stop.");
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    let path = recorder.stop_recording().map_err(alert)?;
    eprintln!("Saved recording to {}", path.display());
    Ok(path)
}

fn alert(error: RecorderError) -> RecorderError {
    let (title, message) = error.alert();
    eprintln!("{title}: {message}");
    error
}

fn build_options(args: &PlayArgs) -> PlaybackOptions {
    let mut options = args.preset.map(Preset::options).unwrap_or_default();
    if let Some(rate) = args.rate {
        options = options.with_rate(rate);
    }
    if let Some(cents) = args.pitch {
        options = options.with_pitch_cents(cents);
    }
    if args.echo {
        options = options.with_echo();
    }
    if args.reverb {
        options = options.with_reverb();
    }
    options
}

fn validate(args: &PlayArgs, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if let Some(rate) = args.rate {
        if !(rate > 0.0 && rate <= MAX_RATE) {
            return Err(format!("Rate must be in (0, {MAX_RATE}], got {rate}").into());
        }
    }
    if let Some(cents) = args.pitch {
        if !(MIN_PITCH_CENTS..=MAX_PITCH_CENTS).contains(&cents) {
            return Err(format!(
                "Pitch must be between {MIN_PITCH_CENTS} and {MAX_PITCH_CENTS} cents, got {cents}"
            )
            .into());
        }
    }
    if args.interactive && (args.preset.is_some() || args.rate.is_some() || args.pitch.is_some())
    {
        return Err("--interactive takes effects from stdin; drop --preset/--rate/--pitch".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn play_args(argv: &[&str]) -> PlayArgs {
        let mut full = vec!["pitchplay", "play"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            CliCommand::Play(args) => args,
            CliCommand::Record { .. } => panic!("expected play"),
        }
    }

    #[rstest]
    #[case::stop("stop", Some(Command::Stop))]
    #[case::quit(" QUIT ", Some(Command::Shutdown))]
    #[case::plain("play", Some(Command::Play(PlaybackOptions::default())))]
    #[case::preset("reverb", Some(Command::Play(Preset::Reverb.options())))]
    #[case::blank("   ", None)]
    fn test_parse_command(#[case] line: &str, #[case] expected: Option<Command>) {
        let parsed = parse_command(line).map(|r| r.unwrap());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_command_rejects_unknown_word() {
        let parsed = parse_command("louder");
        assert!(matches!(parsed, Some(Err(_))));
    }

    #[test]
    fn test_explicit_flags_override_preset() {
        let args = play_args(&["clip.wav", "--preset", "slow", "--rate", "0.75", "--echo"]);
        let options = build_options(&args);
        assert_eq!(options.rate, Some(0.75));
        assert!(options.echo);
        assert!(!options.reverb);
    }

    #[rstest]
    #[case::slow("slow", Some(0.5), None)]
    #[case::fast("fast", Some(1.5), None)]
    #[case::high("high", None, Some(1000.0))]
    #[case::low("low", None, Some(-1000.0))]
    fn test_presets_use_fixed_values(
        #[case] preset: &str,
        #[case] rate: Option<f32>,
        #[case] pitch: Option<f32>,
    ) {
        let options = build_options(&play_args(&["clip.wav", "--preset", preset]));
        assert_eq!(options.rate, rate);
        assert_eq!(options.pitch_cents, pitch);
    }

    #[test]
    fn test_negative_pitch_parses() {
        let args = play_args(&["clip.wav", "--pitch", "-1000"]);
        assert_eq!(args.pitch, Some(-1000.0));
    }

    #[test]
    fn test_unknown_preset_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["pitchplay", "play", "--preset", "robot"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let args = play_args(&[]);
        assert!(validate(&args, Path::new("/nonexistent/clip.wav")).is_err());
    }

    #[rstest]
    #[case::zero_rate(&["--rate", "0"])]
    #[case::huge_rate(&["--rate", "40"])]
    #[case::huge_pitch(&["--pitch", "3000"])]
    #[case::interactive_with_preset(&["--interactive", "--preset", "fast"])]
    fn test_validate_rejects_bad_arguments(#[case] argv: &[&str]) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = play_args(argv);
        assert!(validate(&args, file.path()).is_err());
    }

    #[test]
    fn test_validate_accepts_good_arguments() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = play_args(&["--rate", "1.5", "--pitch", "-1000", "--reverb"]);
        assert!(validate(&args, file.path()).is_ok());
    }
}
