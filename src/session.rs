//! The lifecycle every game runs through.
//!
//! [`Session::run`] seats the host, runs whichever negotiation the game
//! declares, then drives the round loop:
//! render, await one round of input, apply it, repeat until the game is
//! terminal or a round goes unanswered. Seats are held by a [`SeatGuard`]
//! so they are released on every exit path.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use log::{info, warn};
use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    challenge::{Challenge, ChallengeOutcome},
    collector::{Collector, CollectorOptions},
    config::BotConfig,
    error::GameResult,
    events::Event,
    lobby::{Lobby, LobbyBounds, LobbyOutcome},
    participant::{Identity, Participant, PlayerId},
    seats::SeatGuard,
    surface::{Prompt, Status},
    table::Table,
};

/// How a game gathers its players before round play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Negotiation {
    Solo,
    Challenge(Identity),
    Lobby(LobbyBounds),
}

/// Result of awaiting one round of input.
#[derive(Debug)]
pub enum Round<I> {
    Input(I),
    /// Nobody acted before the round timed out.
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The host is already playing something in this chat.
    HostBusy,
    /// The challenge or lobby did not produce a game.
    SetupFailed,
    /// `initialize` ended the game before any round.
    EndedEarly,
    /// A round went unanswered.
    Inactive,
    Finished,
}

/// Time limits for the session's awaits.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub round: Duration,
    pub challenge: Duration,
    pub lobby: Duration,
}

impl Timing {
    pub fn new(round: Duration) -> Timing {
        let defaults = BotConfig::default();
        Timing {
            round,
            challenge: defaults.challenge_time_limit,
            lobby: defaults.lobby_time_limit,
        }
    }

    pub fn from_config(config: &BotConfig, round: Duration) -> Timing {
        Timing {
            round,
            challenge: config.challenge_time_limit,
            lobby: config.lobby_time_limit,
        }
    }
}

/// A concrete game plugged into the session.
#[async_trait]
pub trait Game: Send {
    type Input: Send;

    fn name(&self) -> &'static str;

    fn negotiation(&self) -> Negotiation;

    /// Seeds per-game state once the players are known. Calling
    /// [`Session::end`] here skips round play entirely.
    async fn initialize(&mut self, _session: &mut Session) -> GameResult<()> {
        Ok(())
    }

    /// Must depend on game state only.
    fn is_terminal(&self) -> bool;

    async fn render(&mut self, session: &mut Session) -> GameResult<()>;

    async fn await_round(&mut self, session: &mut Session) -> GameResult<Round<Self::Input>>;

    async fn apply(&mut self, session: &mut Session, input: Self::Input) -> GameResult<()>;

    /// Pause between rounds.
    fn intermediate(&self) -> Option<Duration> {
        None
    }

    async fn on_inactive(&mut self, session: &mut Session) -> GameResult<()> {
        let name = self.name();
        session.render_inactivity(name).await
    }

    /// Final render once the game is over.
    async fn finish(&mut self, _session: &mut Session) -> GameResult<()> {
        Ok(())
    }
}

pub struct Session {
    table: Table,
    host: Identity,
    players: BTreeMap<PlayerId, Participant>,
    time_limit: Duration,
    has_ended: bool,
    status: Status,
    message: Option<MessageId>,
}

impl Session {
    fn new(table: Table, host: Identity, roster: Vec<Identity>, time_limit: Duration) -> Session {
        let players = roster
            .into_iter()
            .zip(1..=u8::MAX)
            .map(|(identity, id)| (PlayerId(id), Participant::new(identity, PlayerId(id))))
            .collect();

        Session {
            table,
            host,
            players,
            time_limit,
            has_ended: false,
            status: Status::Primary,
            message: None,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.table.chat_id
    }

    pub fn host(&self) -> &Identity {
        &self.host
    }

    /// Players in turn order, host first.
    pub fn players(&self) -> impl Iterator<Item = &Participant> {
        self.players.values()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Participant> {
        self.players.get(&player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn find_player(&self, user_id: UserId) -> Option<&Participant> {
        self.players.values().find(|p| p.user_id() == user_id)
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended
    }

    /// Marks the game over. No further rounds are played.
    pub fn end(&mut self) {
        self.has_ended = true;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// The session's own message, once something has been rendered.
    pub fn message(&self) -> Option<MessageId> {
        self.message
    }

    /// Shows `prompt` in the session's message, posting it the first time.
    pub async fn render(&mut self, prompt: &Prompt) -> GameResult<MessageId> {
        let message = self.table.render(self.message, prompt).await?;
        self.message = Some(message);
        Ok(message)
    }

    pub async fn notify(&self, text: &str) -> GameResult<()> {
        self.table.notify(text).await
    }

    pub async fn render_inactivity(&mut self, game_name: &str) -> GameResult<()> {
        self.status = Status::Error;
        let text = format!("{} The game of {} has ended due to inactivity.", self.status, game_name);
        self.render(&Prompt::new(text)).await?;
        Ok(())
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions::new(self.time_limit)
    }

    /// A collector on this session's chat.
    pub fn collector<F>(&self, filter: F, options: CollectorOptions) -> Collector<F>
    where
        F: FnMut(&Event) -> bool,
    {
        Collector::new(&self.table.hub, self.table.chat_id, filter, options)
    }

    /// Runs `game` from seating to teardown in the table's chat.
    pub async fn run<G: Game>(table: Table, host: Identity, timing: Timing, game: &mut G) -> GameResult<SessionOutcome> {
        let mut guard = SeatGuard::new(table.seats.clone(), table.chat_id);
        if !guard.seat(host.user_id) {
            table
                .notify(&format!("{}, you are already in a game in this chat!", host.display_name()))
                .await?;
            return Ok(SessionOutcome::HostBusy);
        }

        info!("Starting {} for {} in chat {}", game.name(), host.username, table.chat_id);
        let result = Session::play(table, host, timing, game, &mut guard).await;
        match &result {
            Ok(outcome) => info!("{} ended: {:?}", game.name(), outcome),
            Err(err) => warn!("{} failed: {}", game.name(), err),
        }
        result
    }

    async fn play<G: Game>(
        table: Table,
        host: Identity,
        timing: Timing,
        game: &mut G,
        guard: &mut SeatGuard,
    ) -> GameResult<SessionOutcome> {
        let negotiation = game.negotiation();
        let Some(roster) = Session::negotiate(&table, &host, timing, negotiation, game.name(), guard).await? else {
            return Ok(SessionOutcome::SetupFailed);
        };

        let mut session = Session::new(table, host, roster, timing.round);
        game.initialize(&mut session).await?;
        if session.has_ended {
            return Ok(SessionOutcome::EndedEarly);
        }

        loop {
            if game.is_terminal() {
                session.has_ended = true;
                game.finish(&mut session).await?;
                return Ok(SessionOutcome::Finished);
            }

            game.render(&mut session).await?;
            match game.await_round(&mut session).await? {
                Round::Inactive => {
                    session.has_ended = true;
                    game.on_inactive(&mut session).await?;
                    return Ok(SessionOutcome::Inactive);
                }
                Round::Input(input) => {
                    game.apply(&mut session, input).await?;
                    if session.has_ended {
                        game.finish(&mut session).await?;
                        return Ok(SessionOutcome::Finished);
                    }
                    let pause = if game.is_terminal() { None } else { game.intermediate() };
                    if let Some(pause) = pause {
                        tokio::time::sleep(pause).await;
                    }
                }
            }
        }
    }

    // Returns the seated roster in turn order, or None if setup failed.
    async fn negotiate(
        table: &Table,
        host: &Identity,
        timing: Timing,
        negotiation: Negotiation,
        game_name: &'static str,
        guard: &mut SeatGuard,
    ) -> GameResult<Option<Vec<Identity>>> {
        match negotiation {
            Negotiation::Solo => Ok(Some(vec![host.clone()])),
            Negotiation::Challenge(opponent) => {
                if !opponent.is_same(host) && table.is_seated(opponent.user_id) {
                    table
                        .notify(&format!("{} is already in a game in this chat", opponent.display_name()))
                        .await?;
                    return Ok(None);
                }

                let challenge = Challenge::new(host.clone(), opponent, game_name, timing.challenge);
                let ChallengeOutcome::Accepted(opponent) = challenge.negotiate(table).await? else {
                    return Ok(None);
                };
                if !guard.seat(opponent.user_id) {
                    table
                        .notify(&format!("{} joined another game in the meantime", opponent.display_name()))
                        .await?;
                    return Ok(None);
                }
                Ok(Some(vec![host.clone(), opponent]))
            }
            // No lobby can satisfy these; `Game::initialize` reports them.
            Negotiation::Lobby(bounds) if !bounds.is_consistent() => Ok(Some(vec![host.clone()])),
            Negotiation::Lobby(bounds) => {
                let lobby = Lobby::new(host.clone(), bounds, game_name, timing.lobby);
                let LobbyOutcome::Started(players) = lobby.negotiate(table).await? else {
                    return Ok(None);
                };

                let mut roster = Vec::with_capacity(players.len());
                for player in players {
                    if player.is_same(host) || guard.seat(player.user_id) {
                        roster.push(player);
                    } else {
                        info!("Dropping {} from the lobby: seated elsewhere", player.username);
                    }
                }
                if roster.len() < bounds.min {
                    table
                        .notify(&format!("Not enough free players left to start {game_name}"))
                        .await?;
                    return Ok(None);
                }
                Ok(Some(roster))
            }
        }
    }
}
