use std::{env, time::Duration};

use teloxide::types::UserId;

use crate::error::{GameError, GameResult};

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Only this user may run `/refresh`. Unset disables the command.
    pub owner_id: Option<UserId>,
    pub seat_clear_period: Duration,
    pub challenge_time_limit: Duration,
    pub lobby_time_limit: Duration,
    pub page_time_limit: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            owner_id: None,
            seat_clear_period: Duration::from_secs(180),
            challenge_time_limit: Duration::from_secs(30),
            lobby_time_limit: Duration::from_secs(120),
            page_time_limit: Duration::from_secs(25),
        }
    }
}

impl BotConfig {
    /// Reads the bot settings from the environment, after `.env` has been loaded.
    pub fn from_env() -> GameResult<BotConfig> {
        let defaults = BotConfig::default();
        let owner_id = match env::var("OWNER_ID") {
            Ok(raw) => Some(UserId(parse_number("OWNER_ID", &raw)?)),
            Err(_) => None,
        };

        Ok(BotConfig {
            owner_id,
            seat_clear_period: seconds_var("SEAT_CLEAR_SECONDS", defaults.seat_clear_period)?,
            challenge_time_limit: seconds_var("CHALLENGE_SECONDS", defaults.challenge_time_limit)?,
            lobby_time_limit: seconds_var("LOBBY_SECONDS", defaults.lobby_time_limit)?,
            page_time_limit: seconds_var("PAGE_SECONDS", defaults.page_time_limit)?,
        })
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == Some(user_id)
    }
}

fn seconds_var(name: &str, default: Duration) -> GameResult<Duration> {
    match env::var(name) {
        Ok(raw) => {
            let secs = parse_number(name, &raw)?;
            if secs == 0 {
                return Err(GameError::Config(format!("{name} must be greater than zero")));
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

fn parse_number(name: &str, raw: &str) -> GameResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| GameError::Config(format!("{name} is not a number: {raw:?}")))
}
