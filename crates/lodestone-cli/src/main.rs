//! lodestone — command-line access to krystallium sample card readers.
//!
//! Reads, writes and generates samples, renames readers and watches card
//! activity. Without `--device` the controller discovers readers by
//! scanning the serial ports; with it, the command pins one port and skips
//! the scan.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use lodestone_core::constants::{DEFAULT_BAUD_RATE, SEND_TICK_INTERVAL_MS};
use lodestone_core::{CardId, DeviceName, DevicePath};
use lodestone_driver::{ControllerConfig, DeviceSession, ReaderController, ReaderHandler};
use lodestone_samples::{
    Action, BloodSample, Purity, RawSample, RefinedSample, Sample, Strength, Target,
    generate_blood, generate_raw, generate_refined,
};

/// How often commands poll session state while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Command-line access to krystallium sample card readers.
#[derive(Parser, Debug)]
#[command(name = "lodestone", version, about, long_about = None)]
struct Cli {
    /// Serial port of a specific reader, e.g. /dev/ttyUSB0. Without it,
    /// readers are discovered by scanning and the first ready one is used.
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Baud rate of the serial link.
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Seconds to wait for a reader (and its replies) before giving up.
    #[arg(long, global = true, default_value_t = 10.0, value_parser = parse_timeout)]
    timeout: f64,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Wait for a card and print the sample stored on it.
    Read,
    /// Write a sample to the card on the reader.
    Write {
        #[command(subcommand)]
        sample: WriteKind,
    },
    /// Print the reader's name, or give it a new one.
    Name {
        /// New name for the reader.
        #[arg(long)]
        set: Option<String>,
    },
    /// Roll a random sample and print it. Needs no reader.
    Generate {
        #[command(subcommand)]
        sample: GenerateKind,
    },
    /// Print card activity from every reader until Ctrl-C.
    Watch,
}

/// Sample to write, attribute by attribute. Attributes parse
/// case-insensitively, so `write blood increasing krystal weak` works.
#[derive(Subcommand, Debug)]
enum WriteKind {
    /// Raw krystallium: a positive and a negative action/target pair.
    Raw {
        positive_action: Action,
        positive_target: Target,
        negative_action: Action,
        negative_target: Target,
        /// Mark the sample as already depleted.
        #[arg(long)]
        depleted: bool,
    },
    /// Refined krystallium: two action/target pairs and a purity grade.
    Refined {
        primary_action: Action,
        primary_target: Target,
        secondary_action: Action,
        secondary_target: Target,
        purity: Purity,
    },
    /// Encased blood: one action/target pair and a strength grade.
    Blood {
        action: Action,
        target: Target,
        strength: Strength,
    },
}

#[derive(Subcommand, Debug)]
enum GenerateKind {
    /// A raw sample attributed to one origin.
    Raw { origin: String },
    /// A refined sample combined from two origins.
    Refined {
        first_origin: String,
        second_origin: String,
    },
    /// A blood sample attributed to one origin.
    Blood { origin: String },
}

fn parse_timeout(raw: &str) -> Result<f64, String> {
    let seconds: f64 = raw.parse().map_err(|err| format!("{err}"))?;
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err("must be a non-negative number of seconds".into())
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let opts = ReaderOptions {
        device: cli.device,
        baud_rate: cli.baud_rate,
        wait: Duration::from_secs_f64(cli.timeout),
    };

    match cli.command {
        CliCommand::Read => read_card(opts).await,
        CliCommand::Write { sample } => write_card(opts, build_sample(sample)).await,
        CliCommand::Name { set } => name_reader(opts, set).await,
        CliCommand::Generate { sample } => generate(sample),
        CliCommand::Watch => watch(opts).await,
    }
}

/// How a command reaches its reader.
struct ReaderOptions {
    device: Option<String>,
    baud_rate: u32,
    wait: Duration,
}

/// Ignores callbacks; commands that use this poll session state instead.
struct SilentHandler;

impl ReaderHandler for SilentHandler {}

/// Prints one block per callback, prefixed with the reader's name.
struct PrintHandler;

impl ReaderHandler for PrintHandler {
    fn card_detected(&self, reader: &DeviceName, card: &CardId) {
        println!("[{reader}] card {card} detected");
    }

    fn card_lost(&self, reader: &DeviceName, card: &CardId) {
        println!("[{reader}] card {card} removed");
    }

    fn traits_detected(&self, reader: &DeviceName, traits: &[String]) {
        match Sample::from_args(traits) {
            Ok(sample) => {
                println!("[{reader}] {} sample:", sample.kind());
                print_indented(&sample);
            }
            Err(err) => {
                println!("[{reader}] unreadable sample ({err}): {}", traits.join(" "));
            }
        }
    }
}

/// Build a controller and, with `--device`, pin one attached session.
fn controller_for(
    opts: &ReaderOptions,
    handler: Arc<dyn ReaderHandler>,
) -> Result<(Arc<ReaderController>, Option<Arc<DeviceSession>>)> {
    let config = ControllerConfig {
        baud_rate: opts.baud_rate,
        ..ControllerConfig::default()
    };
    let controller = ReaderController::new(config, handler);

    match &opts.device {
        Some(device) => {
            let path = DevicePath::new(device.clone())
                .with_context(|| format!("invalid device path {device:?}"))?;
            let session = controller.attach(path)?;
            Ok((controller, Some(session)))
        }
        None => {
            controller.start();
            Ok((controller, None))
        }
    }
}

/// Wait until the pinned session, or any discovered one, is ready.
async fn ready_session(
    controller: &ReaderController,
    pinned: Option<Arc<DeviceSession>>,
    wait: Duration,
) -> Result<Arc<DeviceSession>> {
    let deadline = Instant::now() + wait;
    loop {
        let candidate = match &pinned {
            Some(session) => Some(Arc::clone(session)),
            None => controller.devices().into_iter().find(|s| s.is_ready()),
        };
        if let Some(session) = candidate {
            if session.is_ready() {
                return Ok(session);
            }
        }
        if Instant::now() >= deadline {
            bail!("no reader became ready within {:.1}s", wait.as_secs_f64());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn read_card(opts: ReaderOptions) -> Result<()> {
    let (controller, pinned) = controller_for(&opts, Arc::new(SilentHandler))?;
    let session = ready_session(&controller, pinned, opts.wait).await?;

    println!("Waiting for a card on {}...", reader_label(&session));
    let card = loop {
        if let Some(card) = session.card_id() {
            break card;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };
    println!("Card {card} present.");

    // Traits echo shortly after the card lands; a blank card never sends any.
    let deadline = Instant::now() + opts.wait;
    let traits = loop {
        if let Some(traits) = session.traits() {
            break Some(traits);
        }
        if Instant::now() >= deadline {
            break None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    match traits {
        Some(tokens) => {
            let sample = Sample::from_args(&tokens)
                .with_context(|| format!("card {card} holds an unreadable sample"))?;
            println!("{} sample:", sample.kind());
            print_indented(&sample);
        }
        None => println!("No traits were read; the card may be blank."),
    }

    controller.stop().await;
    Ok(())
}

async fn write_card(opts: ReaderOptions, sample: Sample) -> Result<()> {
    let (controller, pinned) = controller_for(&opts, Arc::new(SilentHandler))?;
    let session = ready_session(&controller, pinned, opts.wait).await?;

    println!("Waiting for a card on {}...", reader_label(&session));
    loop {
        if session.card_id().is_some() {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    session.write_sample(sample.kind(), sample.wire_traits(), sample.depletion())?;
    println!("Writing {} sample...", sample.kind());

    let deadline = Instant::now() + opts.wait;
    while session.is_writing() {
        if Instant::now() >= deadline {
            bail!("the reader never confirmed the write");
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    // A disconnect also clears the writing flag; only a live link confirms.
    if !session.is_ready() {
        bail!("the connection dropped before the write was confirmed");
    }
    println!("Write complete.");

    controller.stop().await;
    Ok(())
}

async fn name_reader(opts: ReaderOptions, set: Option<String>) -> Result<()> {
    let (controller, pinned) = controller_for(&opts, Arc::new(SilentHandler))?;
    let session = ready_session(&controller, pinned, opts.wait).await?;

    match set {
        Some(new_name) => {
            let name = DeviceName::new(new_name.clone())
                .with_context(|| format!("invalid reader name {new_name:?}"))?;
            session.set_name(name.clone())?;
            // Let the queued command reach the wire before we hang up.
            tokio::time::sleep(Duration::from_millis(2 * SEND_TICK_INTERVAL_MS)).await;
            println!("Asked {} to rename itself to {name}.", reader_label(&session));
            println!("It answers to the old name until it reconnects.");
        }
        None => match session.name() {
            Some(name) => println!("{name}"),
            None => println!("The reader has not announced a name yet."),
        },
    }

    controller.stop().await;
    Ok(())
}

fn generate(kind: GenerateKind) -> Result<()> {
    let mut rng = rand::thread_rng();
    let sample = match kind {
        GenerateKind::Raw { origin } => Sample::Raw(generate_raw(&mut rng, &origin)?),
        GenerateKind::Refined {
            first_origin,
            second_origin,
        } => Sample::Refined(generate_refined(&mut rng, &first_origin, &second_origin)?),
        GenerateKind::Blood { origin } => Sample::Blood(generate_blood(&mut rng, &origin)?),
    };

    println!("{} sample:", sample.kind());
    print_indented(&sample);
    Ok(())
}

async fn watch(opts: ReaderOptions) -> Result<()> {
    let (controller, _pinned) = controller_for(&opts, Arc::new(PrintHandler))?;

    println!("Watching for card activity; press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;

    controller.stop().await;
    Ok(())
}

fn build_sample(kind: WriteKind) -> Sample {
    match kind {
        WriteKind::Raw {
            positive_action,
            positive_target,
            negative_action,
            negative_target,
            depleted,
        } => Sample::Raw(RawSample::new(
            positive_action,
            positive_target,
            negative_action,
            negative_target,
            "",
            0.0,
            depleted,
        )),
        WriteKind::Refined {
            primary_action,
            primary_target,
            secondary_action,
            secondary_target,
            purity,
        } => Sample::Refined(RefinedSample::new(
            primary_action,
            primary_target,
            secondary_action,
            secondary_target,
            purity,
            "",
            0.0,
        )),
        WriteKind::Blood {
            action,
            target,
            strength,
        } => Sample::Blood(BloodSample::new(action, target, strength, "")),
    }
}

fn reader_label(session: &DeviceSession) -> String {
    match session.name() {
        Some(name) => name.to_string(),
        None => session.path().to_string(),
    }
}

fn print_indented(sample: &Sample) {
    for line in sample.to_string().lines() {
        println!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_declaration_is_coherent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn write_blood_parses_attributes_case_insensitively() {
        let cli = Cli::parse_from([
            "lodestone",
            "write",
            "blood",
            "increasing",
            "krystal",
            "weak",
        ]);
        let CliCommand::Write { sample } = cli.command else {
            panic!("expected a write command");
        };
        let WriteKind::Blood {
            action,
            target,
            strength,
        } = sample
        else {
            panic!("expected a blood sample");
        };
        assert_eq!(action, Action::Increasing);
        assert_eq!(target, Target::Krystal);
        assert_eq!(strength, Strength::Weak);
    }

    #[test]
    fn global_flags_apply_after_the_subcommand() {
        let cli = Cli::parse_from([
            "lodestone",
            "read",
            "--device",
            "/dev/ttyUSB3",
            "--timeout",
            "2.5",
        ]);
        assert_eq!(cli.device.as_deref(), Some("/dev/ttyUSB3"));
        assert_eq!(cli.timeout, 2.5);
        assert_eq!(cli.baud_rate, DEFAULT_BAUD_RATE);
    }

    #[test]
    fn nonsense_timeouts_are_rejected() {
        assert!(Cli::try_parse_from(["lodestone", "read", "--timeout=-1"]).is_err());
        assert!(Cli::try_parse_from(["lodestone", "read", "--timeout=nan"]).is_err());
    }

    #[test]
    fn written_raw_samples_carry_the_depletion_marker() {
        let sample = build_sample(WriteKind::Raw {
            positive_action: Action::Creating,
            positive_target: Target::Krystal,
            negative_action: Action::Destroying,
            negative_target: Target::Energy,
            depleted: true,
        });
        assert_eq!(sample.wire_traits().len(), 4);
        assert_eq!(sample.depletion(), Some(lodestone_core::Depletion::Depleted));
    }
}
