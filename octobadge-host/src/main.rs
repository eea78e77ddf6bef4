//! Octobadge desktop runner
//!
//! Runs the badge runtime against a directory standing in for the badge
//! filesystem. Buttons are typed on stdin, one press per line (`a`, `up`,
//! `a+c`). `home` restarts into the app menu like the HOME button.
//!
//! A restart exits with [`RESTART_EXIT_CODE`]; run the binary in a shell
//! loop to come back up with the boot flag honoured.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use log::{info, warn};

use octobadge_core::app::AppRegistry;
use octobadge_core::config::RuntimeConfig;
use octobadge_core::runtime::{Board, Context, Platform, ResetPath, ResetSignal, Supervisor};
use octobadge_hal_std::{
    DirStorage, HomeLine, HostLink, KeyboardButtons, ProcessControl, SystemClock, UreqTransport,
    RESTART_EXIT_CODE,
};

/// Command line of the desktop runner
#[derive(Parser, Debug)]
#[command(name = "octobadge-host", about = "Run the Octobadge runtime on a desktop", version)]
struct Cli {
    /// Directory standing in for the badge filesystem
    #[arg(long, default_value = "badge-fs")]
    root: PathBuf,

    /// Frame period in milliseconds
    #[arg(long, default_value_t = 33)]
    frame_ms: u64,
}

/// Desktop peripherals from `octobadge-hal-std`
struct HostPlatform;

impl Platform for HostPlatform {
    type Storage = DirStorage;
    type Transport = UreqTransport;
    type Clock = SystemClock;
    type Buttons = KeyboardButtons;
    type Link = HostLink;
    type System = ProcessControl;
}

type HostResetPath = ResetPath<'static, HomeLine, DirStorage, ProcessControl, SystemClock>;

// Reached from the HOME handler, which takes no arguments
static SIGNAL: ResetSignal = ResetSignal::new();
static RESET_PATH: OnceLock<Mutex<HostResetPath>> = OnceLock::new();

/// HOME handler; runs on the keyboard thread, beside the frame loop
fn on_home() {
    match RESET_PATH.get() {
        Some(path) => path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_falling_edge(),
        None => warn!("HOME pressed before the reset path was installed"),
    }
}

/// Open the badge filesystem at `root` and gather the host peripherals
fn build_context(root: &Path, frame: Duration) -> anyhow::Result<Context<HostPlatform>> {
    let mut storage =
        DirStorage::open(root).with_context(|| format!("opening {}", root.display()))?;
    let config = RuntimeConfig::load(&mut storage);

    let board = Board {
        storage,
        transport: UreqTransport::with_timeout(Duration::from_millis(config.fetch.timeout_ms)),
        clock: SystemClock::new(),
        buttons: KeyboardButtons::new(frame),
        link: HostLink::default(),
        system: ProcessControl,
    };
    Ok(Context::new(board, config))
}

/// Reset path with its own handles onto the context's storage and clock
fn reset_path(
    signal: &'static ResetSignal,
    ctx: &Context<HostPlatform>,
) -> HostResetPath {
    ResetPath::new(
        signal,
        HomeLine,
        ctx.board.storage.clone(),
        ProcessControl,
        ctx.board.clock,
        ctx.config.reset.exit_grace_ms,
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let ctx = build_context(&cli.root, Duration::from_millis(cli.frame_ms))?;
    if RESET_PATH.set(Mutex::new(reset_path(&SIGNAL, &ctx))).is_err() {
        anyhow::bail!("reset path installed twice");
    }
    ctx.board
        .buttons
        .spawn_stdin_reader()
        .context("starting keyboard reader")?;
    info!(
        "Badge filesystem at {}, restarts exit with {}",
        cli.root.display(),
        RESTART_EXIT_CODE
    );

    Supervisor::boot(ctx, AppRegistry::with_builtin_apps(), &SIGNAL, on_home).run()
}
