//! Tick orchestrator: the single thread that owns and mutates the game
//!
//! Producers (input threads, network sessions, script replays) only hold a
//! [`CommandSender`] for the bounded queue. Everything else happens here, one
//! tick at a time:
//!
//! 1. advance every piece's physics to `now`
//! 2. re-apply presentation for promoted queens that still need it
//! 3. rebuild the occupancy index
//! 4. drain the commands queued at drain time without blocking, feeding them
//!    to the pipeline in arrival order
//! 5. rebuild the occupancy index again and resolve collisions
//! 6. re-check promotions for every surviving pawn
//! 7. check the win condition (fewer than two kings left)
//!
//! # Lifecycle
//!
//! ```text
//! Running (GameOverState::Playing) → Ended (any other GameOverState)
//! ```
//!
//! `GAME_STARTED` is published once when the loop starts. `GAME_ENDED` is
//! published exactly once: when a king falls, or on exit if no king fell.
//! Once ended, commands no longer reach the pieces but the loop keeps ticking
//! until an `exit` command arrives.

use crate::core::settings::GameSettings;
use crate::game::clock::GameClock;
use crate::game::collision::{resolve_collisions, Capture};
use crate::game::command::{Command, CommandKind};
use crate::game::context::GameContext;
use crate::game::events::Event;
use crate::game::pipeline::process_command;
use crate::game::promotion::check_all_promotions;
use crate::game::resources::GameOverState;
use crate::game::types::{Millis, PieceId, Side};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};

/// Producer handle for the bounded command queue
pub type CommandSender = Sender<Command>;

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub now: Millis,
    pub commands: usize,
    pub captures: Vec<Capture>,
    pub promotions: Vec<PieceId>,
}

pub struct Orchestrator<C: GameClock> {
    ctx: GameContext,
    clock: C,
    tick_interval_ms: Millis,
    sender: Sender<Command>,
    receiver: Receiver<Command>,
    state: GameOverState,
    started: bool,
    ended_published: bool,
    exit_requested: bool,
    ticks: u64,
}

impl<C: GameClock> Orchestrator<C> {
    pub fn new(ctx: GameContext, clock: C, settings: &GameSettings) -> Self {
        let (sender, receiver) = bounded(settings.input_queue_capacity.max(1));
        Self {
            ctx,
            clock,
            tick_interval_ms: settings.tick_interval_ms,
            sender,
            receiver,
            state: GameOverState::Playing,
            started: false,
            ended_published: false,
            exit_requested: false,
            ticks: 0,
        }
    }

    /// A new producer handle; producers may block when the queue is full
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn state(&self) -> GameOverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !self.state.is_game_over()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Reset piece clocks and announce the game; later calls do nothing
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let now = self.clock.now_ms();
        self.ctx.reset_clocks(now);
        self.ctx.rebuild_occupancy();
        info!(
            "[TICK] Game started with {} pieces at {}ms",
            self.ctx.len(),
            now
        );
        self.ctx.publish(&Event::game_started(now));
    }

    /// Run one tick
    pub fn tick(&mut self) -> TickReport {
        self.start();
        let now = self.clock.now_ms();

        self.ctx.update_all(now);
        self.ctx.apply_fixups();
        self.ctx.rebuild_occupancy();

        // Only what was queued at drain time; later sends wait for the next tick
        let pending = self.receiver.len();
        let drained: Vec<Command> = self.receiver.try_iter().take(pending).collect();
        for cmd in &drained {
            self.handle_command(cmd, now);
        }

        let captures = resolve_collisions(&mut self.ctx, now);
        let promotions = check_all_promotions(&mut self.ctx, now);
        if !promotions.is_empty() {
            self.ctx.rebuild_occupancy();
        }
        self.check_win(now);

        self.ticks += 1;
        TickReport {
            tick: self.ticks,
            now,
            commands: drained.len(),
            captures,
            promotions,
        }
    }

    /// Tick until exit, or until `max_ticks` ticks have run
    pub fn run(&mut self, max_ticks: Option<u64>) -> u64 {
        self.start();
        let first = self.ticks;
        loop {
            self.tick();
            if self.exit_requested {
                info!("[TICK] Exit requested after {} ticks", self.ticks);
                break;
            }
            if max_ticks.is_some_and(|max| self.ticks - first >= max) {
                info!("[TICK] Tick limit reached ({})", self.ticks - first);
                break;
            }
            self.clock.wait(self.tick_interval_ms);
        }
        self.ticks - first
    }

    fn handle_command(&mut self, cmd: &Command, now: Millis) {
        if self.exit_requested {
            debug!("[TICK] Exit pending, dropping {} for '{}'", cmd.kind, cmd.piece_id);
            return;
        }
        if cmd.kind == CommandKind::Exit {
            self.exit_requested = true;
            if self.state == GameOverState::Playing {
                self.state = GameOverState::Abandoned;
            }
            self.announce_end(now);
            return;
        }
        if self.state.is_game_over() {
            debug!(
                "[TICK] Game over, ignoring {} for '{}'",
                cmd.kind, cmd.piece_id
            );
            return;
        }
        process_command(&mut self.ctx, cmd, now);
    }

    fn check_win(&mut self, now: Millis) {
        if self.state.is_game_over() || self.ctx.king_count() >= 2 {
            return;
        }
        self.state = GameOverState::from_surviving_kings(
            self.ctx.king_alive(Side::White),
            self.ctx.king_alive(Side::Black),
        );
        info!("[TICK] {} Send exit to finish.", self.state.message());
        self.announce_end(now);
    }

    fn announce_end(&mut self, now: Millis) {
        if self.ended_published {
            return;
        }
        self.ended_published = true;
        self.ctx.publish(
            &Event::game_ended(self.state.winner(), now).with("result", self.state.message()),
        );
    }
}
