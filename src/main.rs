pub(crate) mod binding;
pub(crate) mod channels;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod gcode;
pub(crate) mod intervaltimer;
pub(crate) mod lighthandler;
pub(crate) mod olaoutput;
pub(crate) mod pattern;
pub(crate) mod pwmsink;
pub(crate) mod status;

use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use crate::binding::{Bindings, Target};
use crate::channels::Channels;
use crate::config::Config;
use crate::olaoutput::OlaOutput;
use crate::pwmsink::{LogSink, PwmSink};
use crate::status::{PrinterState, PrinterStatus, StatusIndicator};

#[derive(Parser)]
struct Cli {
    /// TOML config file with colors, patterns and transition settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    /// The printer status to show, instead of deriving it from the printer state
    #[arg(short, long, value_enum)]
    status: Option<PrinterStatus>,

    /// The printer reports an error
    #[arg(long)]
    printer_error: bool,

    /// The printer is printing
    #[arg(long)]
    printing: bool,

    /// The print is paused
    #[arg(long)]
    paused: bool,

    /// Job progress in percent
    #[arg(long, value_name = "PERCENT", default_value_t = 0.0)]
    completion: f32,

    /// G-code line sent to the printer, in order (M150 colors, M109/M190 heating)
    #[arg(short, long, value_name = "LINE")]
    gcode: Vec<String>,

    /// The OLA OSC endpoint, overrides the config file
    #[arg(short, long, value_name = "ADDR")]
    ola_addr: Option<SocketAddr>,

    /// Log channel values instead of sending them anywhere
    #[arg(long)]
    dry_run: bool,

    /// Preview a #RRGGBB[WW] color instead of showing a printer status
    #[arg(long, value_name = "HEX")]
    preview: Option<String>,

    /// The pattern used for the preview
    #[arg(long, value_enum, default_value_t = PreviewPattern::Constant)]
    pattern: PreviewPattern,

    /// Period of a pulsing or blinking preview
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    period_ms: u32,

    /// Which side the preview goes to
    #[arg(long, value_enum, default_value_t = Target::Both)]
    target: Target,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PreviewPattern {
    Constant,
    Pulsing,
    OnOff,
}

fn create_sink(args: &Cli, config: &Config) -> Result<Box<dyn PwmSink>, error::Error> {
    if args.dry_run {
        return Ok(Box::new(LogSink));
    }

    let addr = args.ola_addr.unwrap_or(config.ola.address);
    log::info!("Sending frames to OLA at {addr}");
    Ok(Box::new(OlaOutput::new(addr, config.ola.start_slot)?))
}

fn show_preview(args: &Cli, bindings: &Bindings<Box<dyn PwmSink>>, hex: &str) -> bool {
    let color = match Channels::from_hex(hex) {
        Ok(color) => color,
        Err(err) => {
            log::error!("Cannot preview: {err}");
            return false;
        }
    };

    log::info!("Previewing {hex} on {:?}", args.target);
    match args.pattern {
        PreviewPattern::Constant => bindings.set_constant_color(args.target, color),
        PreviewPattern::Pulsing => bindings.set_pulsing_color(args.target, color, args.period_ms),
        PreviewPattern::OnOff => bindings.set_onoff_color(args.target, color, args.period_ms),
    }
}

fn show_printer(args: &Cli, config: &Config, bindings: &Bindings<Box<dyn PwmSink>>) -> bool {
    let printer = PrinterState {
        is_error: args.printer_error,
        is_printing: args.printing,
        is_paused: args.paused,
        completion: args.completion,
    };
    let mut indicator = StatusIndicator::new(config.statuses.clone(), config.lights_enabled);

    if !indicator.refresh(bindings, &printer) {
        return false;
    }
    args.gcode
        .iter()
        .all(|line| indicator.handle_gcode(bindings, &printer, line))
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let config = match args.config.as_deref() {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => panic!("Cannot load config: {}", err),
        },
        None => Config::default(),
    };

    let default_color = match config.default_color() {
        Ok(color) => color,
        Err(err) => panic!("Cannot use default color: {}", err),
    };

    let sink = match create_sink(&args, &config) {
        Ok(sink) => sink,
        Err(err) => panic!("Cannot set up output: {}", err),
    };

    let mut bindings: Bindings<Box<dyn PwmSink>> = Bindings::new();
    let transitions = config.transitions;
    if !bindings.initialize(
        default_color,
        transitions.enabled,
        transitions.refresh_interval_ms,
        transitions.transition_ms,
        sink,
    ) {
        panic!("Cannot initialize light handler");
    }
    if !bindings.start() {
        panic!("Cannot start light handler");
    }

    let describes_printer =
        args.printer_error || args.printing || args.paused || args.completion > 0.0;
    let shown = match (args.preview.as_deref(), args.status) {
        (Some(hex), _) => show_preview(&args, &bindings, hex),
        (None, Some(status)) => status::show_status(
            &bindings,
            &config.statuses,
            config.lights_enabled,
            status,
        ),
        (None, None) if describes_printer || !args.gcode.is_empty() => {
            show_printer(&args, &config, &bindings)
        }
        (None, None) => status::show_status(
            &bindings,
            &config.statuses,
            config.lights_enabled,
            PrinterStatus::Startup,
        ),
    };
    if !shown {
        panic!("Cannot show the requested lights");
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    }) {
        panic!("Cannot install Ctrl-C handler: {}", err);
    }

    let _ = shutdown_rx.recv();
    log::info!("Shutting down");
    status::lights_off(&bindings);
    // Let the fade to black finish before the loop goes away
    let fade_ms = transitions.transition_ms as u64 + transitions.refresh_interval_ms as u64;
    thread::sleep(Duration::from_millis(fade_ms));
    bindings.stop();
}
