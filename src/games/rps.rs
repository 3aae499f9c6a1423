use std::time::Duration;

use async_trait::async_trait;
use teloxide::types::UserId;

use crate::{
    collector::{CollectorOptions, Flow},
    error::GameResult,
    events::Event,
    participant::Identity,
    session::{Game, Negotiation, Round, Session},
    surface::{Control, Prompt, Status},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
    Lizard,
    Spock,
}

impl Choice {
    pub const ALL: [Choice; 5] = [Choice::Rock, Choice::Paper, Choice::Scissors, Choice::Lizard, Choice::Spock];

    pub fn data(self) -> &'static str {
        match self {
            Choice::Rock => "rps:rock",
            Choice::Paper => "rps:paper",
            Choice::Scissors => "rps:scissors",
            Choice::Lizard => "rps:lizard",
            Choice::Spock => "rps:spock",
        }
    }

    pub fn from_data(data: &str) -> Option<Choice> {
        Choice::ALL.into_iter().find(|choice| choice.data() == data)
    }

    pub fn label(self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
            Choice::Lizard => "lizard",
            Choice::Spock => "spock",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Choice::Rock => "✊",
            Choice::Paper => "✋",
            Choice::Scissors => "✌",
            Choice::Lizard => "🤏",
            Choice::Spock => "🖖",
        }
    }

    /// The verb describing how `self` beats `other`, if it does.
    pub fn beats(self, other: Choice) -> Option<&'static str> {
        use Choice::*;
        match (self, other) {
            (Rock, Scissors) | (Rock, Lizard) => Some("crushes"),
            (Paper, Rock) => Some("covers"),
            (Paper, Spock) => Some("disproves"),
            (Scissors, Paper) => Some("cuts"),
            (Scissors, Lizard) => Some("decapitates"),
            (Lizard, Spock) => Some("poisons"),
            (Lizard, Paper) => Some("eats"),
            (Spock, Scissors) => Some("smashes"),
            (Spock, Rock) => Some("vaporizes"),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RpsOptions {
    pub wins: u32,
    pub round_time: Duration,
    pub pause: Duration,
}

impl Default for RpsOptions {
    fn default() -> Self {
        RpsOptions {
            wins: 1,
            round_time: Duration::from_secs(20),
            pause: Duration::from_secs(5),
        }
    }
}

impl RpsOptions {
    /// Out of range values are clamped.
    pub fn new(wins: Option<u64>, round_secs: Option<u64>, pause_secs: Option<u64>) -> RpsOptions {
        let defaults = RpsOptions::default();
        RpsOptions {
            wins: wins.map_or(defaults.wins, |w| w.clamp(1, 7) as u32),
            round_time: round_secs.map_or(defaults.round_time, |s| Duration::from_secs(s.clamp(5, 60))),
            pause: pause_secs.map_or(defaults.pause, |s| Duration::from_secs(s.clamp(3, 15))),
        }
    }
}

struct Contestant {
    user_id: UserId,
    name: String,
    wins: u32,
    choice: Option<Choice>,
}

pub struct Rps {
    opponent: Identity,
    options: RpsOptions,
    contestants: Vec<Contestant>,
    log: String,
}

impl Rps {
    pub fn new(opponent: Identity, options: RpsOptions) -> Rps {
        Rps {
            opponent,
            options,
            contestants: Vec::new(),
            log: String::new(),
        }
    }

    fn scoreboard(&self, status: Status) -> String {
        let mut lines = vec![format!("{status} Scores"), String::new()];
        for contestant in self.contestants.iter() {
            lines.push(format!("{}: {}", contestant.name, contestant.wins));
        }
        if !self.log.is_empty() {
            lines.push(String::new());
            lines.push(self.log.clone());
        }
        lines.push(String::new());
        lines.push(format!(
            "First to {} win(s) | {} seconds per round",
            self.options.wins,
            self.options.round_time.as_secs()
        ));
        lines.join("\n")
    }

    fn winner(&self) -> Option<&Contestant> {
        self.contestants.iter().find(|c| c.wins >= self.options.wins)
    }
}

#[async_trait]
impl Game for Rps {
    type Input = (Choice, Choice);

    fn name(&self) -> &'static str {
        "Rock Paper Scissors"
    }

    fn negotiation(&self) -> Negotiation {
        Negotiation::Challenge(self.opponent.clone())
    }

    async fn initialize(&mut self, session: &mut Session) -> GameResult<()> {
        self.contestants = session
            .players()
            .map(|p| Contestant {
                user_id: p.user_id(),
                name: p.name().to_string(),
                wins: 0,
                choice: None,
            })
            .collect();
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.winner().is_some()
    }

    async fn render(&mut self, session: &mut Session) -> GameResult<()> {
        let buttons = Choice::ALL
            .into_iter()
            .map(|choice| Control::new(format!("{} {}", choice.emoji(), choice.label()), choice.data()))
            .collect();
        let prompt = Prompt::new(self.scoreboard(session.status())).with_row(buttons);
        session.render(&prompt).await?;
        Ok(())
    }

    async fn await_round(&mut self, session: &mut Session) -> GameResult<Round<(Choice, Choice)>> {
        let Some(message) = session.message() else {
            return Ok(Round::Inactive);
        };
        let ids: Vec<UserId> = self.contestants.iter().map(|c| c.user_id).collect();
        let collector = session.collector(
            move |event: &Event| {
                event.is_on(message)
                    && ids.contains(&event.user().user_id)
                    && event.button_data().and_then(Choice::from_data).is_some()
            },
            CollectorOptions::new(self.options.round_time),
        );

        let contestants = &mut self.contestants;
        collector
            .collect(|event| {
                let choice = event.button_data().and_then(Choice::from_data);
                if let Some(contestant) = contestants.iter_mut().find(|c| c.user_id == event.user().user_id) {
                    contestant.choice = choice;
                }
                if contestants.iter().all(|c| c.choice.is_some()) {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            })
            .await;

        let picks: Vec<Choice> = self.contestants.iter_mut().filter_map(|c| c.choice.take()).collect();
        match picks[..] {
            [host, opponent] => Ok(Round::Input((host, opponent))),
            _ => Ok(Round::Inactive),
        }
    }

    async fn apply(&mut self, session: &mut Session, picks: (Choice, Choice)) -> GameResult<()> {
        let (host, opponent) = picks;
        let (winner, loser, verb) = match (host.beats(opponent), opponent.beats(host)) {
            (Some(verb), _) => (0, 1, verb),
            (_, Some(verb)) => (1, 0, verb),
            _ => {
                self.log = format!("{} Both picked {}. It's a draw!", host.emoji(), host.label());
                let prompt = Prompt::new(self.scoreboard(session.status()));
                session.render(&prompt).await?;
                return Ok(());
            }
        };
        let picks = [host, opponent];

        self.contestants[winner].wins += 1;
        let round = format!(
            "{}'s {} {} {} {}'s {} {}",
            self.contestants[winner].name,
            picks[winner].label(),
            picks[winner].emoji(),
            verb,
            self.contestants[loser].name,
            picks[loser].label(),
            picks[loser].emoji()
        );
        self.log = if self.contestants[winner].wins >= self.options.wins {
            format!("{} has won the game!\n\n{}", self.contestants[winner].name, round)
        } else {
            format!("{} wins the round! {}", self.contestants[winner].name, round)
        };

        let prompt = Prompt::new(self.scoreboard(session.status()));
        session.render(&prompt).await?;
        Ok(())
    }

    fn intermediate(&self) -> Option<Duration> {
        Some(self.options.pause)
    }

    async fn on_inactive(&mut self, session: &mut Session) -> GameResult<()> {
        session.set_status(Status::Error);
        self.log = format!("The game of {} has ended due to player inactivity.", self.name());
        let prompt = Prompt::new(self.scoreboard(session.status()));
        session.render(&prompt).await?;
        Ok(())
    }

    async fn finish(&mut self, session: &mut Session) -> GameResult<()> {
        session.set_status(Status::Success);
        let prompt = Prompt::new(self.scoreboard(session.status()));
        session.render(&prompt).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        challenge::ACCEPT,
        seats::lock_seats,
        session::{SessionOutcome, Timing},
        testing::{button, identity, table, until_listening, until_rendered, RecordingSurface, CHAT},
    };

    #[test]
    fn every_choice_beats_exactly_two_others() {
        for choice in Choice::ALL {
            let beaten = Choice::ALL.into_iter().filter(|other| choice.beats(*other).is_some()).count();
            assert_eq!(beaten, 2, "{choice:?}");
            assert!(choice.beats(choice).is_none());
            for other in Choice::ALL {
                assert!(!(choice.beats(other).is_some() && other.beats(choice).is_some()));
            }
        }
        assert_eq!(Choice::Spock.beats(Choice::Rock), Some("vaporizes"));
        assert_eq!(Choice::Rock.beats(Choice::Paper), None);
    }

    #[test]
    fn options_are_clamped() {
        let options = RpsOptions::new(Some(20), Some(1), None);
        assert_eq!(options.wins, 7);
        assert_eq!(options.round_time, Duration::from_secs(5));
        assert_eq!(options.pause, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn plays_a_challenge_to_the_end() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move {
                let mut game = Rps::new(identity(2, "opp"), RpsOptions::default());
                Session::run(table, identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game).await
            }
        });
        until_listening(&hub, CHAT).await;
        hub.publish(CHAT, button(identity(2, "opp"), 1, ACCEPT));

        // Challenge prompt, its resolved form, then the first round.
        until_rendered(&surface, 3).await;
        until_listening(&hub, CHAT).await;
        let round = surface.renders()[2].message.0;
        hub.publish(CHAT, button(identity(3, "stranger"), round, Choice::Rock.data()));
        hub.publish(CHAT, button(identity(1, "host"), round, Choice::Paper.data()));
        hub.publish(CHAT, button(identity(1, "host"), round, Choice::Rock.data()));
        hub.publish(CHAT, button(identity(2, "opp"), round, Choice::Scissors.data()));

        assert_eq!(task.await.unwrap().unwrap(), SessionOutcome::Finished);
        let last = surface.last_text();
        assert!(last.contains("host has won the game!"));
        assert!(last.contains("host: 1"));
        assert_eq!(lock_seats(&table.seats).seated(CHAT), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_missing_pick_ends_the_game() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move {
                let mut game = Rps::new(identity(2, "opp"), RpsOptions::new(Some(3), None, None));
                Session::run(table, identity(1, "host"), Timing::new(Duration::from_secs(20)), &mut game).await
            }
        });
        until_listening(&hub, CHAT).await;
        hub.publish(CHAT, button(identity(2, "opp"), 1, ACCEPT));
        until_rendered(&surface, 3).await;
        until_listening(&hub, CHAT).await;
        hub.publish(CHAT, button(identity(1, "host"), surface.renders()[2].message.0, Choice::Spock.data()));

        assert_eq!(task.await.unwrap().unwrap(), SessionOutcome::Inactive);
        assert!(surface.last_text().contains("inactivity"));
    }
}
