use smallvec::SmallVec;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// No round is in progress.
    #[default]
    Idle,
    Active,
    Won,
    Expired,
}

impl RoundState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Expired)
    }
}

/// Counters for the current round. Only the engine mutates them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub matched_pairs: PairCount,
    pub total_pairs: PairCount,
    pub click_count: u32,
    pub elapsed_secs: Seconds,
    pub time_limit_secs: Seconds,
    pub power_ups_used: u32,
}

impl RoundStats {
    fn new(total_pairs: PairCount, time_limit_secs: Seconds) -> Self {
        Self {
            total_pairs,
            time_limit_secs,
            ..Self::default()
        }
    }

    pub const fn pairs_left(&self) -> PairCount {
        self.total_pairs.saturating_sub(self.matched_pairs)
    }

    pub const fn secs_left(&self) -> Seconds {
        self.time_limit_secs.saturating_sub(self.elapsed_secs)
    }
}

/// Cards revealed in the current turn and not yet matched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct TurnState {
    revealed: SmallVec<[Position; 2]>,
    locked: bool,
}

impl TurnState {
    fn clear(&mut self) {
        self.revealed.clear();
        self.locked = false;
    }
}

/// Issued by [`MatchEngine::begin_setup`] while a board is being prepared
/// asynchronously.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupTicket(u32);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEngine {
    board: Board,
    state: RoundState,
    turn: TurnState,
    stats: RoundStats,
    timing: Timing,
    generation: Generation,
    setup_seq: u32,
    peeking: bool,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl MatchEngine {
    pub fn new(timing: Timing) -> Self {
        Self {
            board: Board::default(),
            state: RoundState::default(),
            turn: TurnState::default(),
            stats: RoundStats::default(),
            timing,
            generation: Generation::default(),
            setup_seq: 0,
            peeking: false,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn card_at(&self, position: Position) -> Result<&Card> {
        self.board.card_at(position)
    }

    pub fn is_locked(&self) -> bool {
        self.turn.locked
    }

    pub fn is_peeking(&self) -> bool {
        self.peeking
    }

    /// Positions revealed in the current turn, in flip order.
    pub fn revealed(&self) -> &[Position] {
        &self.turn.revealed
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn can_flip(&self, position: Position) -> bool {
        self.state.is_active()
            && !self.turn.locked
            && !self.peeking
            && self
                .board
                .card_at(position)
                .is_ok_and(|card| card.state() == CardState::Hidden)
    }

    pub fn can_power_up(&self) -> bool {
        self.state.is_active() && !self.turn.locked && !self.peeking
    }

    /// Reserves the next round start for a board that is still being prepared.
    pub fn begin_setup(&mut self) -> SetupTicket {
        self.setup_seq = self.setup_seq.wrapping_add(1);
        SetupTicket(self.setup_seq)
    }

    /// Starts the round prepared under `ticket`, unless another setup or round
    /// start happened since it was issued.
    pub fn start_prepared(
        &mut self,
        ticket: SetupTicket,
        board: Board,
        time_limit_secs: Seconds,
    ) -> Result<(Generation, Step)> {
        if ticket.0 != self.setup_seq {
            log::debug!("dropping stale setup {:?}, current {}", ticket, self.setup_seq);
            return Err(GameError::StaleSetup);
        }
        Ok(self.start_round(board, time_limit_secs))
    }

    /// Replaces the board and starts a fresh round.
    ///
    /// Every ticket issued before this call becomes stale, as does any pending
    /// [`SetupTicket`].
    pub fn start_round(&mut self, board: Board, time_limit_secs: Seconds) -> (Generation, Step) {
        self.board = board;
        self.board.hide_all();
        self.turn.clear();
        self.peeking = false;
        self.stats = RoundStats::new(self.board.total_pairs(), time_limit_secs);
        self.generation = self.generation.next();
        self.setup_seq = self.setup_seq.wrapping_add(1);
        self.state = RoundState::Active;
        log::debug!(
            "round {} started: {} pairs, {}s",
            self.generation.raw(),
            self.stats.total_pairs,
            time_limit_secs
        );

        let mut step = Step::none();
        step.emit(EngineEvent::RoundStarted {
            total_pairs: self.stats.total_pairs,
            time_limit_secs,
        });
        (self.generation, step)
    }

    /// Drops the current round while the next board is still being prepared.
    ///
    /// The engine goes back to `Idle` with an empty board, so nothing of the
    /// old round can be flipped, peeked at or expired. Every issued ticket
    /// becomes stale; setup tickets stay valid.
    pub fn abandon_round(&mut self) {
        if self.state == RoundState::Idle && self.board.is_empty() {
            return;
        }
        log::debug!("round {} abandoned ({:?})", self.generation.raw(), self.state);

        self.board = Board::default();
        self.turn.clear();
        self.peeking = false;
        self.stats = RoundStats::default();
        self.generation = self.generation.next();
        self.state = RoundState::Idle;
    }

    pub fn flip(&mut self, position: Position) -> Result<Step> {
        let position = self.board.validate_position(position)?;

        if !self.can_flip(position) {
            log::trace!("ignored flip at {} ({:?})", position, self.state);
            return Ok(Step::none());
        }

        let mut step = Step::none();
        self.board.set_state(position, CardState::Revealed);
        self.stats.click_count = self.stats.click_count.saturating_add(1);
        self.turn.revealed.push(position);
        step.emit(EngineEvent::CardRevealed {
            position,
            species: self.board[position].species(),
        });

        if let [first, second] = self.turn.revealed[..] {
            self.turn.locked = true;
            self.evaluate_pair(first, second, &mut step);
        }

        Ok(step)
    }

    fn evaluate_pair(&mut self, first: Position, second: Position, step: &mut Step) {
        if self.board[first].matches(&self.board[second]) {
            let species = self.board[first].species();
            self.board.set_state(first, CardState::Matched);
            self.board.set_state(second, CardState::Matched);
            self.stats.matched_pairs += 1;
            self.turn.clear();
            log::debug!("pair {} matched at {} and {}", species, first, second);
            step.emit(EngineEvent::PairMatched {
                first,
                second,
                species,
            });

            if self.stats.matched_pairs == self.stats.total_pairs {
                self.end_round(RoundState::Won, step);
            }
        } else {
            step.emit(EngineEvent::PairMismatched { first, second });
            step.schedule(self.scheduled(TaskKind::ResolveMismatch, self.timing.mismatch_delay));
        }
    }

    /// Begins the power-up peek, during which every face is shown and flips
    /// are ignored.
    pub fn power_up(&mut self) -> Step {
        if !self.can_power_up() {
            log::trace!("ignored power-up ({:?})", self.state);
            return Step::none();
        }

        self.peeking = true;
        self.stats.power_ups_used = self.stats.power_ups_used.saturating_add(1);
        log::debug!("power-up #{} started", self.stats.power_ups_used);

        let mut step = Step::none();
        step.emit(EngineEvent::PowerUpStarted);
        step.schedule(self.scheduled(TaskKind::EndPowerUp, self.timing.power_up_duration));
        step
    }

    /// Runs a task previously handed out in [`Step::scheduled`].
    pub fn fire(&mut self, ticket: Ticket) -> Step {
        let mut step = Step::none();

        if ticket.generation != self.generation {
            log::trace!(
                "stale {:?} from round {}, current {}",
                ticket.task,
                ticket.generation.raw(),
                self.generation.raw()
            );
            return step;
        }
        if !self.state.is_active() {
            log::trace!("{:?} after round ended", ticket.task);
            return step;
        }

        match ticket.task {
            TaskKind::ResolveMismatch => {
                if !self.turn.locked {
                    return step;
                }
                if let [first, second] = self.turn.revealed[..] {
                    self.board.set_state(first, CardState::Hidden);
                    self.board.set_state(second, CardState::Hidden);
                    self.turn.clear();
                    step.emit(EngineEvent::CardsConcealed { first, second });
                }
            }
            TaskKind::EndPowerUp => {
                if self.peeking {
                    self.peeking = false;
                    step.emit(EngineEvent::PowerUpEnded);
                }
            }
        }

        step
    }

    /// Records the time reported by the round clock and expires the round once
    /// the limit is reached.
    pub fn tick(&mut self, elapsed_secs: Seconds) -> Step {
        let mut step = Step::none();

        if !self.state.is_active() {
            return step;
        }

        self.stats.elapsed_secs = self.stats.elapsed_secs.max(elapsed_secs);
        if self.stats.elapsed_secs >= self.stats.time_limit_secs {
            self.end_round(RoundState::Expired, &mut step);
        }

        step
    }

    /// [`Self::tick`] for a clock started in round `generation`.
    pub fn tick_for(&mut self, generation: Generation, elapsed_secs: Seconds) -> Step {
        if generation != self.generation {
            log::trace!("stale tick from round {}", generation.raw());
            return Step::none();
        }
        self.tick(elapsed_secs)
    }

    fn end_round(&mut self, state: RoundState, step: &mut Step) {
        if self.state.is_finished() {
            return;
        }

        self.state = state;
        self.peeking = false;
        log::debug!("round {} ended: {:?}", self.generation.raw(), state);

        match state {
            RoundState::Won => step.emit(EngineEvent::RoundWon {
                click_count: self.stats.click_count,
                elapsed_secs: self.stats.elapsed_secs,
            }),
            RoundState::Expired => step.emit(EngineEvent::TimeExpired {
                matched_pairs: self.stats.matched_pairs,
            }),
            RoundState::Idle | RoundState::Active => {}
        }
    }

    fn scheduled(&self, task: TaskKind, delay: core::time::Duration) -> Scheduled {
        Scheduled {
            ticket: Ticket {
                generation: self.generation,
                task,
            },
            delay,
        }
    }
}
