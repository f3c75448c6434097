use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;
use fretlib::{
    core::{base::Void, config::EngineConfig},
    engine::Engine,
    listen,
    midi::output::MidiOutputSink,
};
use tracing_subscriber::{filter::LevelFilter, fmt::SubscriberBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Flag that specifies verbose logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Flag that suppresses all tracing output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Substring of the preferred capture device name (e.g. an interface brand, or "ASIO").
    #[arg(short, long)]
    device: Option<String>,

    /// Preferred MIDI output port name.
    #[arg(short, long, default_value = "loopMIDI Port")]
    port: String,
}

fn main() -> Void {
    let args = Args::parse();

    init_tracing(args.verbose, args.quiet);

    start(args)?;

    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    SubscriberBuilder::default()
        .with_ansi(true)
        .with_level(!quiet)
        .with_file(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_max_level(level_filter)
        .init();
}

fn start(args: Args) -> Void {
    let config = EngineConfig::default();
    let mut engine = Engine::new(config)?;

    // Device open failures are fatal; everything downstream degrades gracefully.
    let device = listen::find_input_device(args.device.as_deref())?;
    let stream = listen::start_capture(&device, engine.config(), engine.ring())?;

    let mut sink = MidiOutputSink::open(&args.port);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))?;
    }

    tracing::info!("Engine running; press Ctrl-C to stop.");

    engine.run(&mut sink, &shutdown)?;

    // Teardown order matters: stop the capture first so no new notes arrive, then release
    // anything still sounding, then close the port.
    drop(stream);
    engine.all_notes_off(&mut sink);
    sink.close();

    Ok(())
}
