//! App lifecycle supervisor
//!
//! Owns which app is current and performs load, init and teardown around
//! the frame scheduler.
//!
//! ```text
//! SelectingInitialApp --boot--> Running(app) --exit--> Transitioning
//!                                   ^                       |
//!                                   +-------- next ---------+
//! ```

use core::hint::spin_loop;

use log::{error, info, warn};
use octobadge_hal::{Buttons, HomeHandler};

use super::{BootFlag, Context, FrameExit, FrameScheduler, Platform, ResetSignal};
use crate::app::{AppPath, AppRegistry};

use super::context::AppListing;

/// Supervisor lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Before [`Supervisor::boot`]
    SelectingInitialApp,
    /// An app's frame loop is active
    Running,
    /// Between two apps
    Transitioning,
    /// The reset path took over; waiting for the restart
    Halted,
}

/// Which app runs, and which runs next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorState {
    pub current_app: AppPath,
    /// Pending target; `None` means the chooser
    pub next_app: Option<AppPath>,
    /// Whether the boot flag was found at startup
    pub boot_flag_present: bool,
}

/// Result of one app run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// The app at this path runs next
    Next(AppPath),
    /// The reset path interrupted the app
    Interrupted,
}

/// Runs exactly one app at a time, forever
pub struct Supervisor<'a, P: Platform> {
    ctx: Context<P>,
    registry: AppRegistry<P>,
    signal: &'a ResetSignal,
    scheduler: FrameScheduler,
    state: SupervisorState,
    phase: Phase,
    interrupt_armed: bool,
    transitions: u32,
}

impl<'a, P: Platform> Supervisor<'a, P> {
    /// Select the initial app and arm the HOME interrupt
    ///
    /// Consumes the boot flag: present means the chooser runs first,
    /// absent means the default app. `on_home` is bound to the HOME falling
    /// edge and is expected to run the board's [`super::ResetPath`].
    pub fn boot(
        mut ctx: Context<P>,
        registry: AppRegistry<P>,
        signal: &'a ResetSignal,
        on_home: HomeHandler,
    ) -> Self {
        info!("Octobadge runtime v{}", env!("CARGO_PKG_VERSION"));

        let boot_flag_present = BootFlag::consume(&mut ctx.board.storage);
        let current_app = if boot_flag_present {
            ctx.config.apps.chooser.clone()
        } else {
            ctx.config.apps.default.clone()
        };

        ctx.set_catalog(registry.listed().map(|entry| AppListing {
            path: entry.path,
            label: entry.label,
        }));
        info!(
            "{} apps registered, {} listed, starting {}",
            registry.len(),
            ctx.catalog().len(),
            current_app
        );

        let mut supervisor = Self {
            ctx,
            registry,
            signal,
            scheduler: FrameScheduler::new(),
            state: SupervisorState {
                current_app,
                next_app: None,
                boot_flag_present,
            },
            phase: Phase::SelectingInitialApp,
            interrupt_armed: false,
            transitions: 0,
        };
        supervisor.arm_interrupt(on_home);
        supervisor.phase = Phase::Transitioning;
        supervisor
    }

    fn arm_interrupt(&mut self, on_home: HomeHandler) {
        if !self.interrupt_armed {
            self.ctx.board.buttons.arm_home_interrupt(on_home);
            self.interrupt_armed = true;
        }
    }

    /// Run the current app from load to teardown
    ///
    /// Unknown paths and failing factories fall through to the chooser.
    /// Hook failures are logged and otherwise ignored.
    pub fn run_once(&mut self) -> Transition {
        if self.signal.is_exit_requested() {
            // No app is running, nothing to wind down
            self.signal.acknowledge_exit();
            self.halt();
            return Transition::Interrupted;
        }

        let path = self.state.current_app.clone();
        self.transitions += 1;
        info!("Launching {}", path);

        let mut app = match self.registry.resolve(&path).map(|entry| (entry.factory)()) {
            Some(Ok(app)) => app,
            Some(Err(e)) => {
                error!("Could not load {}: {:?}", path, e);
                return self.advance(None);
            }
            None => {
                warn!("No app at {}", path);
                return self.advance(None);
            }
        };

        if let Err(e) = app.init(&mut self.ctx) {
            warn!("{} init failed: {:?}", path, e);
        }

        let signal = self.signal;
        signal.set_pending_artifact(app.pending_artifact());

        self.phase = Phase::Running;
        let exit = self.scheduler.run(&mut self.ctx, signal, |ctx| {
            let next = app.update(ctx);
            // Published for a reset handler that preempts the next tick
            signal.set_pending_artifact(app.pending_artifact());
            next
        });
        self.phase = Phase::Transitioning;

        if let Err(e) = app.on_exit(&mut self.ctx) {
            warn!("{} on_exit failed: {:?}", path, e);
        }
        signal.set_pending_artifact(None);
        drop(app);

        match exit {
            FrameExit::Interrupted => {
                self.signal.acknowledge_exit();
                self.halt();
                Transition::Interrupted
            }
            FrameExit::Stopped => {
                self.ctx.wait_for_release();
                self.advance(None)
            }
            FrameExit::SwitchTo(next) => {
                self.ctx.wait_for_release();
                self.advance(Some(next))
            }
        }
    }

    fn advance(&mut self, next: Option<AppPath>) -> Transition {
        self.state.next_app = next;
        let target = self
            .state
            .next_app
            .take()
            .unwrap_or_else(|| self.ctx.config.apps.chooser.clone());
        self.state.current_app = target.clone();
        Transition::Next(target)
    }

    fn halt(&mut self) {
        if self.phase != Phase::Halted {
            info!("Runtime halted for reset");
        }
        self.phase = Phase::Halted;
    }

    /// Run apps forever
    ///
    /// After an interrupt the loop parks until the reset path restarts
    /// the device.
    pub fn run(mut self) -> ! {
        loop {
            if let Transition::Interrupted = self.run_once() {
                loop {
                    spin_loop();
                }
            }
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Apps launched since boot
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn context(&self) -> &Context<P> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context<P> {
        &mut self.ctx
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}
