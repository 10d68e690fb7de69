use crate::pokeapi::{OFFLINE_ART_BASE, PokeApiSource};
use crate::theme::Theme;
use crate::utils::*;
use clap::Args;
use futures_util::future::{AbortHandle, Abortable};
use gloo::dialogs::alert;
use gloo::timers::callback::{Interval, Timeout};
use pokeflip_core as game;
use web_time::Instant;
use yew::prelude::*;

const CARD_BACK: &str = "back.webp";
const WIN_ALERT_DELAY_MS: u32 = 1000;
const CLOCK_PERIOD_MS: u32 = 1000;

#[derive(Copy, Clone, Debug, PartialEq)]
enum ViewCardState {
    FaceDown,
    FaceUp,
    Matched,
}

impl ViewCardState {
    fn of(card: &game::Card, peeking: bool) -> Self {
        match card.state() {
            game::CardState::Matched => Self::Matched,
            game::CardState::Revealed => Self::FaceUp,
            game::CardState::Hidden if peeking => Self::FaceUp,
            game::CardState::Hidden => Self::FaceDown,
        }
    }

    fn classes(self) -> Classes {
        match self {
            Self::FaceDown => classes!("card"),
            Self::FaceUp => classes!("card", "flip"),
            Self::Matched => classes!("card", "flip", "matched"),
        }
    }
}

/// Text of the timer line under the header.
fn time_info(engine: &game::MatchEngine) -> String {
    let stats = engine.stats();
    match engine.state() {
        game::RoundState::Idle => String::new(),
        state => {
            let mut text = format!(
                "You got {} seconds. {} seconds passed!",
                stats.time_limit_secs, stats.elapsed_secs
            );
            if state == game::RoundState::Expired {
                text.push_str(" Game Over!");
            }
            text
        }
    }
}

pub(crate) enum Msg {
    SelectDifficulty(game::Difficulty),
    NewRound,
    BoardReady(game::SetupTicket, Result<game::Board, game::SupplyError>),
    SetupCancelled,
    Flip(game::Position),
    Fire(game::Ticket),
    Tick(game::Generation),
    PowerUp,
    ToggleTheme,
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    #[prop_or_default]
    pub seed: Option<u64>,

    /// Preselect a difficulty (easy, medium or hard)
    #[arg(short, long)]
    #[prop_or_default]
    pub difficulty: Option<game::Difficulty>,

    /// Use placeholder artwork instead of querying PokéAPI
    #[arg(long)]
    #[prop_or_default]
    pub offline: bool,
}

struct PendingSetup {
    ticket: game::SetupTicket,
    config: game::RoundConfig,
    abort: AbortHandle,
}

enum SetupOutcome {
    /// A newer setup replaced the one that produced this result.
    Stale,
    Failed(game::SupplyError),
    Ready(game::RoundConfig, game::Board),
}

/// Matches a finished board fetch against the setup still waiting for one.
fn settle_setup(
    pending: &mut Option<PendingSetup>,
    ticket: game::SetupTicket,
    result: Result<game::Board, game::SupplyError>,
) -> SetupOutcome {
    let Some(setup) = pending.take_if(|setup| setup.ticket == ticket) else {
        return SetupOutcome::Stale;
    };
    match result {
        Ok(board) => SetupOutcome::Ready(setup.config, board),
        Err(err) => SetupOutcome::Failed(err),
    }
}

/// Timer handles of the running round, at most one per scheduled task.
///
/// Dropping a handle cancels its callback.
struct RoundTimers<H = Timeout> {
    resolve_mismatch: Option<H>,
    end_power_up: Option<H>,
    win_alert: Option<H>,
}

impl<H> Default for RoundTimers<H> {
    fn default() -> Self {
        Self {
            resolve_mismatch: None,
            end_power_up: None,
            win_alert: None,
        }
    }
}

impl<H> RoundTimers<H> {
    fn schedule(&mut self, task: game::TaskKind, handle: H) {
        let slot = match task {
            game::TaskKind::ResolveMismatch => &mut self.resolve_mismatch,
            game::TaskKind::EndPowerUp => &mut self.end_power_up,
        };
        *slot = Some(handle);
    }

    fn win_alert(&mut self, handle: H) {
        self.win_alert = Some(handle);
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        [&self.resolve_mismatch, &self.end_power_up, &self.win_alert]
            .into_iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

struct Round {
    generation: game::Generation,
    clock: game::RoundClock,
    _interval: Option<Interval>,
}

pub(crate) struct GameView {
    engine: game::MatchEngine,
    difficulty: Option<game::Difficulty>,
    seed: Option<u64>,
    offline: bool,
    theme: Theme,
    setup: Option<PendingSetup>,
    round: Option<Round>,
    supply_error: Option<String>,
    timers: RoundTimers,
}

impl GameView {
    fn next_seed(&mut self) -> u64 {
        // a forced seed only applies to the first board
        self.seed.take().unwrap_or_else(js_random_seed)
    }

    fn begin_round(&mut self, ctx: &Context<Self>) -> bool {
        let Some(difficulty) = self.difficulty else {
            alert("Please select a difficulty first.");
            return false;
        };

        if let Some(previous) = self.setup.take() {
            log::debug!("aborting setup {:?}", previous.ticket);
            previous.abort.abort();
        }
        self.abandon_round();

        let config = game::RoundConfig::from(difficulty);
        let ticket = self.engine.begin_setup();
        let seed = self.next_seed();
        let offline = self.offline;
        let (abort, registration) = AbortHandle::new_pair();
        log::debug!("preparing {} board, seed {}", difficulty, seed);

        let prepare = async move {
            if offline {
                let source = game::MemorySource::placeholder(OFFLINE_ART_BASE);
                let mut supplier = game::CardSupplier::new(source, seed);
                supplier.prepare_board(config.pairs).await
            } else {
                let mut supplier = game::CardSupplier::new(PokeApiSource, seed);
                supplier.prepare_board(config.pairs).await
            }
        };
        ctx.link().send_future(async move {
            match Abortable::new(prepare, registration).await {
                Ok(result) => Msg::BoardReady(ticket, result),
                Err(_) => Msg::SetupCancelled,
            }
        });

        self.setup = Some(PendingSetup {
            ticket,
            config,
            abort,
        });
        true
    }

    /// Stops the current round so nothing of it runs behind the loading or
    /// error screen.
    fn abandon_round(&mut self) {
        self.engine.abandon_round();
        self.round = None;
        self.timers.clear();
        self.supply_error = None;
    }

    fn can_power_up(&self) -> bool {
        self.setup.is_none() && self.supply_error.is_none() && self.engine.can_power_up()
    }

    fn board_ready(
        &mut self,
        ctx: &Context<Self>,
        ticket: game::SetupTicket,
        result: Result<game::Board, game::SupplyError>,
    ) -> bool {
        let (config, board) = match settle_setup(&mut self.setup, ticket, result) {
            SetupOutcome::Ready(config, board) => (config, board),
            SetupOutcome::Stale => {
                log::debug!("ignoring board from setup {:?}", ticket);
                return false;
            }
            SetupOutcome::Failed(err) => {
                log::error!("could not prepare board: {}", err);
                self.supply_error = Some(err.to_string());
                return true;
            }
        };

        match self
            .engine
            .start_prepared(ticket, board, config.time_limit_secs)
        {
            Ok((generation, step)) => {
                self.timers.clear();
                let link = ctx.link().clone();
                self.round = Some(Round {
                    generation,
                    clock: game::RoundClock::start(),
                    _interval: Some(Interval::new(CLOCK_PERIOD_MS, move || {
                        link.send_message(Msg::Tick(generation))
                    })),
                });
                self.handle_step(ctx, step);
                true
            }
            Err(err) => {
                log::debug!("setup {:?} superseded: {}", ticket, err);
                false
            }
        }
    }

    fn handle_step(&mut self, ctx: &Context<Self>, step: game::Step) -> bool {
        use game::EngineEvent::*;

        let updated = step.has_update();
        for event in &step.events {
            log::debug!("{:?}", event);
            match event {
                RoundWon { .. } => {
                    self.stop_clock();
                    self.timers
                        .win_alert(Timeout::new(WIN_ALERT_DELAY_MS, || alert("You win!")));
                }
                TimeExpired { .. } => self.stop_clock(),
                _ => {}
            }
        }

        if let Some(scheduled) = step.scheduled {
            let link = ctx.link().clone();
            let ticket = scheduled.ticket;
            self.timers.schedule(
                ticket.task,
                Timeout::new(scheduled.delay_millis(), move || {
                    link.send_message(Msg::Fire(ticket))
                }),
            );
        }

        updated
    }

    fn stop_clock(&mut self) {
        if let Some(round) = self.round.as_mut() {
            round._interval = None;
        }
    }

    fn tick(&mut self, ctx: &Context<Self>, generation: game::Generation) -> bool {
        let Some(round) = self.round.as_ref().filter(|round| round.generation == generation) else {
            return false;
        };

        let before = self.engine.stats().elapsed_secs;
        let elapsed = round.clock.elapsed_secs(Instant::now());
        let step = self.engine.tick_for(generation, elapsed);
        let updated = self.handle_step(ctx, step);
        updated || self.engine.stats().elapsed_secs != before
    }

    fn view_controls(&self, ctx: &Context<Self>) -> Html {
        let buttons = game::Difficulty::ALL.map(|difficulty| {
            let class = classes!(
                "diff-btn",
                (self.difficulty == Some(difficulty)).then_some("active")
            );
            let onclick = ctx
                .link()
                .callback(move |_: MouseEvent| Msg::SelectDifficulty(difficulty));
            html! {
                <button {class} {onclick} data-diff={difficulty.name()}>
                    {format!("{} ({} pairs)", difficulty, difficulty.pairs())}
                </button>
            }
        });

        html! {
            <nav>
                <span class="difficulty">{ for buttons }</span>
                <button id="start-btn" onclick={ctx.link().callback(|_| Msg::NewRound)}>
                    {"Start"}
                </button>
                <button id="reset-btn" onclick={ctx.link().callback(|_| Msg::NewRound)}>
                    {"Reset"}
                </button>
                <button
                    id="power-up"
                    disabled={!self.can_power_up()}
                    onclick={ctx.link().callback(|_| Msg::PowerUp)}
                >
                    {"Power-Up"}
                </button>
                <button id="theme-toggle" onclick={ctx.link().callback(|_| Msg::ToggleTheme)}>
                    {match self.theme {
                        Theme::Light => "Dark mode",
                        Theme::Dark => "Light mode",
                    }}
                </button>
            </nav>
        }
    }

    fn view_stats(&self) -> Html {
        let stats = self.engine.stats();
        html! {
            <header>
                <aside>{"Total pairs: "}<span id="total-pairs">{stats.total_pairs}</span></aside>
                <aside>{"Matched: "}<span id="matched-count">{stats.matched_pairs}</span></aside>
                <aside>{"Pairs left: "}<span id="pairs-left">{stats.pairs_left()}</span></aside>
                <aside>{"Clicks: "}<span id="clicks">{stats.click_count}</span></aside>
                <p id="time-info">{time_info(&self.engine)}</p>
            </header>
        }
    }

    fn view_grid(&self, ctx: &Context<Self>) -> Html {
        if self.setup.is_some() {
            return html! { <p class="loading">{"Catching Pokémon…"}</p> };
        }
        if let Some(err) = &self.supply_error {
            return html! { <p class="error">{format!("Could not build the board: {err}")}</p> };
        }

        let peeking = self.engine.is_peeking();
        let class = classes!(self.difficulty.map(|difficulty| difficulty.name()));
        let cards = self.engine.board().cards().iter().map(|card| {
            let position = card.position();
            let class = ViewCardState::of(card, peeking).classes();
            let onclick = ctx.link().callback(move |_: MouseEvent| Msg::Flip(position));
            html! {
                <div {class} {onclick}>
                    <img class="front_face" src={card.token().image_url().to_owned()} alt="" />
                    <img class="back_face" src={CARD_BACK} alt="" />
                </div>
            }
        });

        html! {
            <div id="game_grid" {class}>{ for cards }</div>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        Self {
            engine: game::MatchEngine::default(),
            difficulty: props.difficulty,
            seed: props.seed,
            offline: props.offline,
            theme: Theme::init(),
            setup: None,
            round: None,
            supply_error: None,
            timers: RoundTimers::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            SelectDifficulty(difficulty) => {
                log::debug!("difficulty: {}", difficulty);
                self.difficulty.replace(difficulty) != Some(difficulty)
            }
            NewRound => self.begin_round(ctx),
            BoardReady(ticket, result) => self.board_ready(ctx, ticket, result),
            SetupCancelled => false,
            Flip(position) => match self.engine.flip(position) {
                Ok(step) => self.handle_step(ctx, step),
                Err(err) => {
                    log::error!("flip at {}: {}", position, err);
                    false
                }
            },
            Fire(ticket) => {
                let step = self.engine.fire(ticket);
                self.handle_step(ctx, step)
            }
            Tick(generation) => self.tick(ctx, generation),
            PowerUp => {
                if !self.can_power_up() {
                    return false;
                }
                alert("Power-Up activated! All cards will be shown for 1 second.");
                let step = self.engine.power_up();
                self.handle_step(ctx, step)
            }
            ToggleTheme => {
                self.theme = self.theme.toggled();
                self.theme.apply();
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="pokeflip">
                {self.view_controls(ctx)}
                {self.view_stats()}
                {self.view_grid(ctx)}
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_view() -> GameView {
        GameView {
            engine: game::MatchEngine::default(),
            difficulty: Some(game::Difficulty::Easy),
            seed: None,
            offline: true,
            theme: Theme::Light,
            setup: None,
            round: None,
            supply_error: None,
            timers: RoundTimers::default(),
        }
    }

    fn pending(engine: &mut game::MatchEngine) -> PendingSetup {
        PendingSetup {
            ticket: engine.begin_setup(),
            config: game::Difficulty::Easy.into(),
            abort: AbortHandle::new_pair().0,
        }
    }

    fn board() -> game::Board {
        game::Board::from_layout(vec![
            game::Token::new(1, "a.png"),
            game::Token::new(4, "b.png"),
            game::Token::new(1, "a.png"),
            game::Token::new(4, "b.png"),
        ])
        .unwrap()
    }

    #[test]
    fn timer_text_follows_round_state() {
        let mut engine = game::MatchEngine::default();
        assert_eq!(time_info(&engine), "");

        engine.start_round(board(), 100);
        engine.tick(42);
        assert_eq!(time_info(&engine), "You got 100 seconds. 42 seconds passed!");

        engine.tick(100);
        assert_eq!(
            time_info(&engine),
            "You got 100 seconds. 100 seconds passed! Game Over!"
        );
    }

    #[test]
    fn peek_shows_hidden_faces_only_in_the_view() {
        let mut engine = game::MatchEngine::default();
        engine.start_round(board(), 100);
        engine.flip(0).unwrap();
        engine.flip(2).unwrap();

        let view = |peeking| {
            engine
                .board()
                .cards()
                .iter()
                .map(|card| ViewCardState::of(card, peeking))
                .collect::<Vec<_>>()
        };

        use ViewCardState::*;
        assert_eq!(view(false), vec![Matched, FaceDown, Matched, FaceDown]);
        assert_eq!(view(true), vec![Matched, FaceUp, Matched, FaceUp]);
    }

    #[test]
    fn stale_board_leaves_newer_setup_waiting() {
        let mut engine = game::MatchEngine::default();
        let old = pending(&mut engine);
        let mut setup = Some(pending(&mut engine));

        let outcome = settle_setup(&mut setup, old.ticket, Ok(board()));

        assert!(matches!(outcome, SetupOutcome::Stale));
        assert!(setup.is_some());
    }

    #[test]
    fn failed_fetch_clears_the_setup() {
        let mut engine = game::MatchEngine::default();
        let current = pending(&mut engine);
        let ticket = current.ticket;
        let mut setup = Some(current);

        let outcome = settle_setup(&mut setup, ticket, Err(game::SupplyError::Source("offline".into())));

        assert!(matches!(outcome, SetupOutcome::Failed(game::SupplyError::Source(_))));
        assert!(setup.is_none());
    }

    #[test]
    fn ready_board_comes_with_its_config() {
        let mut engine = game::MatchEngine::default();
        let current = pending(&mut engine);
        let ticket = current.ticket;
        let mut setup = Some(current);

        let SetupOutcome::Ready(config, board) = settle_setup(&mut setup, ticket, Ok(board())) else {
            panic!("board should be accepted");
        };
        assert_eq!(config, game::RoundConfig::from(game::Difficulty::Easy));
        assert_eq!(board.len(), 4);
        assert!(engine.start_prepared(ticket, board, config.time_limit_secs).is_ok());
    }

    #[test]
    fn new_setup_stops_the_running_round() {
        let mut view = detached_view();
        view.engine.start_round(board(), 100);
        view.engine.tick(30);
        assert!(view.can_power_up());

        view.setup = Some(pending(&mut view.engine));
        assert!(!view.can_power_up());

        view.abandon_round();
        assert_eq!(view.engine.state(), game::RoundState::Idle);
        assert_eq!(time_info(&view.engine), "");
        assert!(view.engine.board().is_empty());

        view.setup = None;
        view.supply_error = Some("offline".into());
        assert!(!view.can_power_up());
    }

    #[test]
    fn timers_hold_one_handle_per_task() {
        let mut timers = RoundTimers::<u32>::default();
        for handle in 0..50 {
            timers.schedule(game::TaskKind::ResolveMismatch, handle);
        }
        timers.schedule(game::TaskKind::EndPowerUp, 0);
        timers.win_alert(0);

        assert_eq!(timers.len(), 3);
        assert_eq!(timers.resolve_mismatch, Some(49));

        timers.clear();
        assert_eq!(timers.len(), 0);
    }
}
