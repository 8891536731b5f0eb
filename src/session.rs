//! A match running on its own thread.
//!
//! The controller is owned by a dedicated thread that applies `MatchAction`s
//! received over a channel one at a time. After every action the thread
//! publishes a fresh `GameSnapshot` and appends the new events, so pollers
//! (network handlers, renderers) never touch the controller itself.
//!
//! Laser beams fired by an action are cleared `laser_display_ms` later, with
//! a fresh snapshot published at that point.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::board::{Command, PlayerId};
use crate::controller::{GameController, GameEvent};
use crate::protocol::GameSnapshot;
use crate::resolve::{CardSlot, StepError};

/// Errors returned to callers of a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("match thread has stopped")]
    Stopped,

    #[error("match thread panicked")]
    Panicked,

    #[error(transparent)]
    Step(#[from] StepError),
}

/// A driver request applied on the match thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAction {
    StartRound,
    MoveCard { source: CardSlot, target: CardSlot },
    FinishProgramming,
    Run,
    Step,
    Choose(Command),
    OpenShop,
    CloseShop,
    Buy { player: PlayerId, slot: usize },
    Toggle { player: PlayerId, index: usize },
    ClearLasers,
}

type Reply = Result<bool, StepError>;

/// Handle to a match thread.
pub struct MatchSession {
    name: String,
    actions: Option<Sender<(MatchAction, Sender<Reply>)>>,
    latest: Arc<RwLock<GameSnapshot>>,
    events: Arc<Mutex<Vec<GameEvent>>>,
    handle: Option<JoinHandle<GameController>>,
}

/// Publishes the controller's state and hands its new events to readers.
fn publish(gc: &mut GameController, latest: &RwLock<GameSnapshot>, events: &Mutex<Vec<GameEvent>>) {
    let snapshot = gc.snapshot();
    match latest.write() {
        Ok(mut slot) => *slot = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
    let new_events = gc.drain_events();
    match events.lock() {
        Ok(mut log) => log.extend(new_events),
        Err(poisoned) => poisoned.into_inner().extend(new_events),
    }
}

/// Applies one action. Returns whether the controller accepted it.
fn apply(gc: &mut GameController, action: MatchAction) -> Reply {
    let accepted = match action {
        MatchAction::StartRound => {
            gc.start_programming_phase();
            true
        }
        MatchAction::MoveCard { source, target } => gc.move_cards(source, target),
        MatchAction::FinishProgramming => gc.finish_programming_phase(),
        MatchAction::Run => gc.execute_programs().map(|_| true)?,
        MatchAction::Step => gc.execute_step().map(|_| true)?,
        MatchAction::Choose(command) => gc.make_choice(command),
        MatchAction::OpenShop => gc.open_upgrade_shop(),
        MatchAction::CloseShop => gc.close_upgrade_shop(),
        MatchAction::Buy { player, slot } => gc.buy_upgrade_for(player, slot),
        MatchAction::Toggle { player, index } => gc.toggle_upgrade(player, index).is_some(),
        MatchAction::ClearLasers => {
            gc.clear_lasers();
            true
        }
    };
    Ok(accepted)
}

impl MatchSession {
    /// Moves `gc` onto a new thread and starts serving actions.
    pub fn spawn(name: impl Into<String>, mut gc: GameController) -> Self {
        let name = name.into();
        let latest = Arc::new(RwLock::new(gc.snapshot()));
        let events = Arc::new(Mutex::new(gc.drain_events()));
        let (tx, rx) = mpsc::channel::<(MatchAction, Sender<Reply>)>();

        let thread_latest = Arc::clone(&latest);
        let thread_events = Arc::clone(&events);
        let thread_name = name.clone();
        let handle = thread::spawn(move || {
            tracing::info!(session = %thread_name, players = gc.players.len(), "match thread started");
            let display = Duration::from_millis(gc.config.laser_display_ms);
            let mut fade_at: Option<Instant> = None;
            loop {
                let received = match fade_at {
                    Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
                    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                let (action, reply) = match received {
                    Ok(request) => request,
                    Err(RecvTimeoutError::Timeout) => {
                        gc.clear_lasers();
                        fade_at = None;
                        publish(&mut gc, &thread_latest, &thread_events);
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                let lasers = gc.board.lasers.clone();
                let outcome = apply(&mut gc, action);
                tracing::debug!(session = %thread_name, ?action, ?outcome, "applied action");
                if gc.board.lasers.is_empty() || display.is_zero() {
                    fade_at = None;
                } else if gc.board.lasers != lasers {
                    fade_at = Some(Instant::now() + display);
                }

                publish(&mut gc, &thread_latest, &thread_events);
                // The caller may have given up waiting.
                let _ = reply.send(outcome);
            }
            tracing::info!(session = %thread_name, "match thread stopped");
            gc
        });

        MatchSession {
            name,
            actions: Some(tx),
            latest,
            events,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until `stop` is called or the thread dies.
    pub fn is_running(&self) -> bool {
        self.actions.is_some() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Sends an action and waits until the match thread has applied it.
    pub fn act(&self, action: MatchAction) -> Result<bool, SessionError> {
        let actions = self.actions.as_ref().ok_or(SessionError::Stopped)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        actions
            .send((action, reply_tx))
            .map_err(|_| SessionError::Stopped)?;
        let outcome = reply_rx.recv().map_err(|_| SessionError::Stopped)?;
        Ok(outcome?)
    }

    /// The state published after the latest action.
    pub fn snapshot(&self) -> GameSnapshot {
        match self.latest.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Takes the events recorded since the last call.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        match self.events.lock() {
            Ok(mut log) => std::mem::take(&mut *log),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Stops the thread after its current action and hands back the match.
    pub fn stop(&mut self) -> Result<GameController, SessionError> {
        self.actions = None;
        let handle = self.handle.take().ok_or(SessionError::Stopped)?;
        handle.join().map_err(|_| SessionError::Panicked)
    }
}

impl Drop for MatchSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.stop() {
                tracing::warn!(session = %self.name, %err, "match thread did not stop cleanly");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FieldAction, Heading, Phase, Pos, NO_REGISTERS};
    use crate::controller::tests::controller;

    fn session_with(laser_display_ms: u64) -> MatchSession {
        let mut gc = controller(6, 6);
        gc.config.laser_display_ms = laser_display_ms;
        gc.board.add_action(Pos::new(0, 0), FieldAction::Laser { heading: Heading::East, strength: 1 });
        gc.add_player("A", "red", Pos::new(1, 4), Heading::North).unwrap();
        gc.add_player("B", "blue", Pos::new(4, 4), Heading::North).unwrap();
        MatchSession::spawn("test", gc)
    }

    fn session() -> MatchSession {
        session_with(0)
    }

    /// Plays the first register, which fires the board laser.
    fn fire_first_register(s: &MatchSession) {
        s.act(MatchAction::StartRound).unwrap();
        program_all(s);
        assert!(s.act(MatchAction::FinishProgramming).unwrap());
        s.act(MatchAction::Step).unwrap();
        s.act(MatchAction::Step).unwrap();
        assert_eq!(s.snapshot().board.step, 1);
    }

    fn program_all(s: &MatchSession) {
        for player in 0..2 {
            for i in 0..NO_REGISTERS {
                let moved = s
                    .act(MatchAction::MoveCard {
                        source: CardSlot::hand(player, i),
                        target: CardSlot::register(player, i),
                    })
                    .unwrap();
                assert!(moved);
            }
        }
    }

    #[test]
    fn snapshot_follows_actions() {
        let mut s = session();
        assert_eq!(s.snapshot().board.phase, Phase::Setup);
        assert!(s.act(MatchAction::StartRound).unwrap());
        assert_eq!(s.snapshot().board.phase, Phase::Programming);
        assert!(!s.act(MatchAction::FinishProgramming).unwrap());

        program_all(&s);
        assert!(s.act(MatchAction::FinishProgramming).unwrap());
        assert_eq!(s.snapshot().board.phase, Phase::Activation);
        assert!(s
            .drain_events()
            .contains(&GameEvent::PhaseChanged { phase: Phase::Activation }));
        assert!(s.drain_events().is_empty());
        s.stop().unwrap();
    }

    #[test]
    fn lasers_fade_after_the_display_time() {
        let s = session_with(200);
        fire_first_register(&s);
        assert!(!s.snapshot().board.lasers.is_empty());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !s.snapshot().board.lasers.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(s.snapshot().board.lasers.is_empty());
        assert!(s.is_running());
    }

    #[test]
    fn zero_display_time_keeps_lasers() {
        let s = session_with(0);
        fire_first_register(&s);
        thread::sleep(Duration::from_millis(50));
        assert!(!s.snapshot().board.lasers.is_empty());
    }

    #[test]
    fn step_errors_are_reported() {
        let s = session();
        assert!(matches!(
            s.act(MatchAction::Step),
            Err(SessionError::Step(StepError::NotActivation(Phase::Setup)))
        ));
        assert!(s.is_running());
    }

    #[test]
    fn stop_returns_the_controller() {
        let mut s = session();
        s.act(MatchAction::StartRound).unwrap();
        let gc = s.stop().unwrap();
        assert_eq!(gc.board.phase, Phase::Programming);
        assert_eq!(gc.players.len(), 2);
        assert!(!s.is_running());
        assert!(matches!(s.act(MatchAction::StartRound), Err(SessionError::Stopped)));
        assert!(matches!(s.stop(), Err(SessionError::Stopped)));
    }

    #[test]
    fn concurrent_readers_see_published_state() {
        let s = Arc::new(session());
        s.act(MatchAction::StartRound).unwrap();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || s.snapshot().board.phase)
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), Phase::Programming);
        }
    }
}
