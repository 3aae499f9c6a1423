//! Open multiplayer lobby run before a game starts.
//!
//! The host is seated first. Anyone may press Join or Leave; only the host
//! may Start (once the player count is within bounds) or End. The host also
//! gets text commands to invite, kick and unkick users, each with its own
//! cooldown.

use std::{collections::HashSet, time::Duration};

use log::info;
use teloxide::types::UserId;

use crate::{
    collector::{Collector, CollectorOptions},
    cooldown::CooldownHandler,
    error::GameResult,
    events::Event,
    participant::Identity,
    surface::{Control, Prompt, Status},
    table::Table,
};

pub const JOIN: &str = "lobby:join";
pub const LEAVE: &str = "lobby:leave";
pub const START: &str = "lobby:start";
pub const END: &str = "lobby:end";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LobbyBounds {
    pub min: usize,
    pub max: usize,
}

impl LobbyBounds {
    /// At least one player. A `max` below `min` is kept as given so the
    /// game can report it.
    pub fn new(min: usize, max: usize) -> LobbyBounds {
        LobbyBounds { min: min.max(1), max }
    }

    pub fn is_consistent(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCommand {
    Invite,
    Kick,
    Unkick,
    End,
}

impl HostCommand {
    const ALL: [HostCommand; 4] = [
        HostCommand::Invite,
        HostCommand::Kick,
        HostCommand::Unkick,
        HostCommand::End,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HostCommand::Invite => "invite",
            HostCommand::Kick => "kick",
            HostCommand::Unkick => "unkick",
            HostCommand::End => "end",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            HostCommand::Invite => &["inv", "add"],
            HostCommand::Kick => &["k", "remove", "blacklist"],
            HostCommand::Unkick => &["uk", "whitelist"],
            HostCommand::End => &["stop", "cancel"],
        }
    }

    fn description(self) -> &'static str {
        match self {
            HostCommand::Invite => "add a user to the lobby",
            HostCommand::Kick => "remove a user and keep them out",
            HostCommand::Unkick => "let a kicked user join again",
            HostCommand::End => "close the lobby",
        }
    }

    pub fn cooldown(self) -> Duration {
        match self {
            HostCommand::End => Duration::ZERO,
            _ => Duration::from_secs(10),
        }
    }

    /// Reads `/kick`, `/k@SomeBot` and the like from the start of a message.
    pub fn parse(text: &str) -> Option<HostCommand> {
        let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
        let word = word.split('@').next()?.to_lowercase();
        HostCommand::ALL
            .into_iter()
            .find(|cmd| cmd.name() == word || cmd.aliases().contains(&word.as_str()))
    }
}

/// What the driver should do after the lobby handled an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobbyStep {
    Ignore,
    Render,
    Start,
    End,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LobbyOutcome {
    /// Players in join order, host first.
    Started(Vec<Identity>),
    Ended,
    TimedOut,
}

pub struct Lobby {
    host: Identity,
    bounds: LobbyBounds,
    players: Vec<Identity>,
    kicked: HashSet<UserId>,
    game_name: &'static str,
    time_limit: Duration,
    log: String,
    cooldowns: CooldownHandler,
}

impl Lobby {
    pub fn new(host: Identity, bounds: LobbyBounds, game_name: &'static str, time_limit: Duration) -> Lobby {
        Lobby {
            players: vec![host.clone()],
            host,
            bounds,
            kicked: HashSet::new(),
            game_name,
            time_limit,
            log: String::new(),
            cooldowns: CooldownHandler::new(),
        }
    }

    pub fn players(&self) -> &[Identity] {
        &self.players
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host.user_id == user_id
    }

    pub fn is_seated(&self, user_id: UserId) -> bool {
        self.players.iter().any(|p| p.user_id == user_id)
    }

    pub fn is_kicked(&self, user_id: UserId) -> bool {
        self.kicked.contains(&user_id)
    }

    pub fn can_start(&self) -> bool {
        self.bounds.contains(self.players.len())
    }

    fn is_full(&self) -> bool {
        self.players.len() >= self.bounds.max
    }

    pub fn join(&mut self, user: &Identity) -> bool {
        if user.is_bot || self.is_kicked(user.user_id) || self.is_seated(user.user_id) || self.is_full() {
            return false;
        }
        self.players.push(user.clone());
        true
    }

    pub fn leave(&mut self, user_id: UserId) -> bool {
        if self.is_host(user_id) || !self.is_seated(user_id) {
            return false;
        }
        self.players.retain(|p| p.user_id != user_id);
        true
    }

    pub fn kick(&mut self, user_id: UserId) -> bool {
        if !self.leave(user_id) {
            return false;
        }
        self.kicked.insert(user_id);
        true
    }

    pub fn unkick(&mut self, user_id: UserId) -> bool {
        self.kicked.remove(&user_id)
    }

    // Host commands below set the log either way and return whether they
    // took effect.
    fn invite(&mut self, user: &Identity) -> bool {
        let name = user.display_name();
        if user.is_bot {
            self.log = format!("{name} is a bot and cannot play");
            return false;
        }
        if self.is_seated(user.user_id) {
            self.log = format!("{name} is already in the lobby");
            return false;
        }
        if self.is_full() {
            self.log = format!("Could not invite {name}: the lobby is full");
            return false;
        }
        // An explicit invite overrides an earlier kick.
        self.kicked.remove(&user.user_id);
        self.players.push(user.clone());
        self.log = format!("{name} was invited to the lobby");
        true
    }

    fn kick_command(&mut self, user: &Identity) -> bool {
        let name = user.display_name();
        if self.is_host(user.user_id) {
            self.log = String::from("The host cannot be kicked");
            return false;
        }
        if !self.kick(user.user_id) {
            self.log = format!("{name} is not in the lobby");
            return false;
        }
        self.log = format!("{name} was kicked from the lobby");
        true
    }

    fn unkick_command(&mut self, user: &Identity) -> bool {
        let name = user.display_name();
        if !self.unkick(user.user_id) {
            self.log = format!("{name} was not kicked");
            return false;
        }
        self.log = format!("{name} may join the lobby again");
        true
    }

    fn end(&mut self) -> LobbyStep {
        self.log = format!("{} has ended the lobby for {}", self.host.display_name(), self.game_name);
        LobbyStep::End
    }

    /// Applies one event to the lobby state.
    pub fn handle(&mut self, event: &Event) -> LobbyStep {
        match event {
            Event::Button { user, data, .. } => {
                if user.is_bot || self.is_kicked(user.user_id) {
                    return LobbyStep::Ignore;
                }
                match data.as_str() {
                    JOIN if self.join(user) => {
                        self.log = format!("{} joined the lobby", user.display_name());
                        LobbyStep::Render
                    }
                    LEAVE if self.leave(user.user_id) => {
                        self.log = format!("{} left the lobby", user.display_name());
                        LobbyStep::Render
                    }
                    START if self.is_host(user.user_id) && self.can_start() => LobbyStep::Start,
                    END if self.is_host(user.user_id) => self.end(),
                    _ => LobbyStep::Ignore,
                }
            }
            Event::Text { user, text, mentioned } => {
                if !self.is_host(user.user_id) {
                    return LobbyStep::Ignore;
                }
                match HostCommand::parse(text) {
                    Some(command) => self.handle_command(command, mentioned.first()),
                    None => LobbyStep::Ignore,
                }
            }
        }
    }

    fn handle_command(&mut self, command: HostCommand, target: Option<&Identity>) -> LobbyStep {
        let host = self.host.user_id;
        if let Some(left) = self.cooldowns.remaining(command.name(), host, command.cooldown()) {
            self.log = format!(
                "Please wait {:.1} more second(s) before reusing /{}",
                left.as_secs_f32(),
                command.name()
            );
            return LobbyStep::Render;
        }

        let Some(target) = target else {
            if command == HostCommand::End {
                return self.end();
            }
            self.log = format!(
                "Usage: /{} while replying to or mentioning a user",
                command.name()
            );
            return LobbyStep::Render;
        };

        let applied = match command {
            HostCommand::Invite => self.invite(target),
            HostCommand::Kick => self.kick_command(target),
            HostCommand::Unkick => self.unkick_command(target),
            HostCommand::End => return self.end(),
        };
        // Only a command that changed the lobby starts its cooldown.
        if applied {
            self.cooldowns.record(command.name(), host);
        }
        LobbyStep::Render
    }

    pub fn render(&self, open: bool) -> Prompt {
        let host = self.host.display_name();
        let mut lines = vec![
            format!("{} {} is hosting a game of {}!", Status::Primary, host, self.game_name),
            format!("Min players: {} | Max players: {}", self.bounds.min, self.bounds.max),
            if self.can_start() {
                format!("Can begin: ✅ {host}")
            } else {
                String::from("Can begin: ❌")
            },
            String::new(),
            format!("Current players ({}):", self.players.len()),
        ];
        for player in self.players.iter() {
            if self.is_host(player.user_id) {
                lines.push(format!("➼ {} 👑", player.display_name()));
            } else {
                lines.push(format!("➼ {}", player.display_name()));
            }
        }

        lines.push(String::new());
        lines.push(String::from("Host commands:"));
        for command in HostCommand::ALL {
            lines.push(format!(
                "/{} ({}): {}",
                command.name(),
                command.aliases().join(", "),
                command.description()
            ));
        }

        lines.push(String::new());
        lines.push(String::from("Logs:"));
        lines.push(if self.log.is_empty() { String::from("-") } else { self.log.clone() });

        if !open {
            return Prompt::new(lines.join("\n"));
        }

        lines.push(String::new());
        lines.push(format!("This lobby closes in {} seconds.", self.time_limit.as_secs()));

        let mut host_row = Vec::new();
        if self.can_start() {
            host_row.push(Control::new("Start", START));
        }
        host_row.push(Control::new("End", END));

        Prompt::new(lines.join("\n"))
            .with_row(vec![Control::new("Join", JOIN), Control::new("Leave", LEAVE)])
            .with_row(host_row)
    }

    // Users already seated in another game in this chat cannot be added.
    fn is_busy_elsewhere(&self, table: &Table, event: &Event) -> bool {
        match event {
            Event::Button { user, data, .. } if data == JOIN => table.is_seated(user.user_id),
            Event::Text { text, mentioned, .. } if HostCommand::parse(text) == Some(HostCommand::Invite) => mentioned
                .first()
                .map_or(false, |target| !self.is_seated(target.user_id) && table.is_seated(target.user_id)),
            _ => false,
        }
    }

    /// Runs the lobby until the host starts or ends it, or time runs out.
    pub async fn negotiate(mut self, table: &Table) -> GameResult<LobbyOutcome> {
        let message = table.render(None, &self.render(true)).await?;
        let host_id = self.host.user_id;
        let mut collector = Collector::new(
            &table.hub,
            table.chat_id,
            move |event: &Event| match event {
                Event::Button { .. } => event.is_on(message),
                Event::Text { user, .. } => user.user_id == host_id,
            },
            CollectorOptions::new(self.time_limit),
        );

        while let Some(event) = collector.next().await {
            if self.is_busy_elsewhere(table, &event) {
                continue;
            }
            match self.handle(&event) {
                LobbyStep::Ignore => {}
                LobbyStep::Render => {
                    table.render(Some(message), &self.render(true)).await?;
                }
                LobbyStep::Start => {
                    info!(
                        "Lobby for {} started by {} with {} player(s)",
                        self.game_name,
                        self.host.username,
                        self.players.len()
                    );
                    self.log = format!("Starting {}...", self.game_name);
                    table.render(Some(message), &self.render(false)).await?;
                    return Ok(LobbyOutcome::Started(self.players));
                }
                LobbyStep::End => {
                    info!("Lobby for {} ended by {}", self.game_name, self.host.username);
                    table.render(Some(message), &self.render(false)).await?;
                    return Ok(LobbyOutcome::Ended);
                }
            }
        }

        info!("Lobby for {} timed out", self.game_name);
        self.log = format!("The lobby for {} has closed due to inactivity...", self.game_name);
        table.render(Some(message), &self.render(false)).await?;
        Ok(LobbyOutcome::TimedOut)
    }
}
