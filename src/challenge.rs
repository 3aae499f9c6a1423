use std::time::Duration;

use log::{debug, info};

use crate::{
    collector::{Collector, CollectorOptions},
    error::GameResult,
    events::Event,
    participant::Identity,
    surface::{Control, Prompt, Status},
    table::Table,
};

pub const ACCEPT: &str = "challenge:accept";
pub const DECLINE: &str = "challenge:decline";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeRejection {
    Bot,
    Yourself,
}

impl ChallengeRejection {
    pub fn notice(self) -> &'static str {
        match self {
            ChallengeRejection::Bot => "You cannot challenge a bot!",
            ChallengeRejection::Yourself => "You cannot challenge yourself",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Accepted(Identity),
    Declined,
    TimedOut,
    Rejected(ChallengeRejection),
}

/// A host asking one named opponent to play.
pub struct Challenge {
    host: Identity,
    opponent: Identity,
    game_name: &'static str,
    time_limit: Duration,
}

impl Challenge {
    pub fn new(host: Identity, opponent: Identity, game_name: &'static str, time_limit: Duration) -> Challenge {
        Challenge {
            host,
            opponent,
            game_name,
            time_limit,
        }
    }

    pub fn check(&self) -> Result<(), ChallengeRejection> {
        if self.opponent.is_bot {
            Err(ChallengeRejection::Bot)
        } else if self.opponent.is_same(&self.host) {
            Err(ChallengeRejection::Yourself)
        } else {
            Ok(())
        }
    }

    fn render(&self, result: Option<&str>) -> Prompt {
        let title = format!(
            "{} {} has challenged {} in {}!",
            Status::Primary,
            self.host.display_name(),
            self.opponent.display_name(),
            self.game_name
        );

        match result {
            Some(result) => Prompt::new(format!("{title}\n\n{result}")),
            None => Prompt::new(format!(
                "{title}\n\n{} has {} seconds to respond.",
                self.opponent.display_name(),
                self.time_limit.as_secs()
            ))
            .with_row(vec![Control::new("Accept", ACCEPT), Control::new("Decline", DECLINE)]),
        }
    }

    /// Asks the opponent and waits for exactly one answer.
    pub async fn negotiate(self, table: &Table) -> GameResult<ChallengeOutcome> {
        if let Err(rejection) = self.check() {
            debug!("Challenge by {} rejected: {:?}", self.host.username, rejection);
            table.notify(rejection.notice()).await?;
            return Ok(ChallengeOutcome::Rejected(rejection));
        }

        let message = table.render(None, &self.render(None)).await?;
        let opponent_id = self.opponent.user_id;
        let mut collector = Collector::new(
            &table.hub,
            table.chat_id,
            move |event: &Event| {
                event.is_on(message)
                    && event.user().user_id == opponent_id
                    && matches!(event.button_data(), Some(ACCEPT) | Some(DECLINE))
            },
            CollectorOptions::new(self.time_limit).max(1),
        );

        let outcome = match collector.next().await {
            Some(event) if event.button_data() == Some(ACCEPT) => ChallengeOutcome::Accepted(self.opponent.clone()),
            Some(_) => ChallengeOutcome::Declined,
            None => ChallengeOutcome::TimedOut,
        };
        drop(collector);
        info!(
            "Challenge {} vs {} in {}: {:?}",
            self.host.username, self.opponent.username, self.game_name, outcome
        );

        let result = match outcome {
            ChallengeOutcome::Accepted(_) => format!("{} accepted the challenge!", self.opponent.display_name()),
            _ => format!(
                "{} has declined or did not accept the challenge in time",
                self.opponent.display_name()
            ),
        };
        table.render(Some(message), &self.render(Some(&result))).await?;
        if !matches!(outcome, ChallengeOutcome::Accepted(_)) {
            table.notify(&result).await?;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{button, identity, table, until_listening, RecordingSurface, CHAT};

    fn challenge(opponent: Identity) -> Challenge {
        Challenge::new(identity(1, "host"), opponent, "RPS", Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn bots_and_self_are_rejected_without_a_prompt() {
        let surface = RecordingSurface::new();
        let table = table(&surface);

        let outcome = challenge(identity(2, "robot").bot()).negotiate(&table).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Rejected(ChallengeRejection::Bot));

        let outcome = challenge(identity(1, "host")).negotiate(&table).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Rejected(ChallengeRejection::Yourself));

        assert!(surface.renders().is_empty());
        assert_eq!(surface.notices().len(), 2);
        assert_eq!(table.hub.subscriber_count(CHAT), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_opponent_can_answer() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move { challenge(identity(2, "opp")).negotiate(&table).await }
        });
        until_listening(&hub, CHAT).await;

        let message = surface.renders()[0].message.0;
        assert!(surface.renders()[0].prompt.has_control(ACCEPT));
        hub.publish(CHAT, button(identity(3, "stranger"), message, ACCEPT));
        hub.publish(CHAT, button(identity(2, "opp"), message, ACCEPT));

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, ChallengeOutcome::Accepted(identity(2, "opp")));

        let last = surface.renders().last().cloned().unwrap();
        assert!(last.edited);
        assert!(last.prompt.controls.is_empty());
        assert!(surface.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn decline_and_timeout_fail() {
        let surface = RecordingSurface::new();
        let table = table(&surface);
        let hub = table.hub.clone();

        let task = tokio::spawn({
            let table = table.clone();
            async move { challenge(identity(2, "opp")).negotiate(&table).await }
        });
        until_listening(&hub, CHAT).await;
        hub.publish(CHAT, button(identity(2, "opp"), 1, DECLINE));
        assert_eq!(task.await.unwrap().unwrap(), ChallengeOutcome::Declined);

        let outcome = challenge(identity(2, "opp")).negotiate(&table).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::TimedOut);
        assert_eq!(surface.notices().len(), 2);
    }
}
