use std::time::Duration;

use log::{error, warn};
use teloxide::{prelude::*, utils::command::BotCommands};

use super::{event_handler::mentioned_users, AsyncBotState};
use crate::{
    games::{
        mastermind::{Mastermind, MastermindOptions},
        rps::{Rps, RpsOptions},
        trivia::{BuiltinQuestions, Difficulty, Trivia, TriviaOptions},
    },
    participant::Identity,
    session::{Game, Session, Timing},
    table::Table,
};

const MASTERMIND_GUESS_TIME: Duration = Duration::from_secs(360);

pub fn get_game_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), teloxide::RequestError>,
    teloxide::dispatching::DpHandlerDescription,
> {
    dptree::entry()
        .filter_command::<GameCommand>()
        .endpoint(game_handler)
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Games")]
pub enum GameCommand {
    #[command(description = "reply to (or mention) someone to challenge them to rock paper scissors lizard spock. /rps [wins] [seconds] [pause]")]
    Rps(String),
    #[command(description = "guess the secret word. /mastermind [length] [turns]")]
    Mastermind(String),
    #[command(description = "open a trivia lobby. /trivia [easy|medium|hard] [rounds] [min] [max] [seconds] [pause]")]
    Trivia(String),
}

/// Numeric arguments in order. Mentions are skipped; anything else that is
/// not a number leaves a gap so later arguments keep their position.
fn numbers(args: &str) -> Vec<Option<u64>> {
    args.split_whitespace()
        .filter(|word| !word.starts_with('@'))
        .map(|word| word.parse().ok())
        .collect()
}

fn nth(args: &[Option<u64>], index: usize) -> Option<u64> {
    args.get(index).copied().flatten()
}

/// A difficulty word may appear anywhere; the numbers keep their order.
fn trivia_options(args: &str) -> TriviaOptions {
    let difficulty = args.split_whitespace().find_map(Difficulty::parse);
    let rest: Vec<&str> = args
        .split_whitespace()
        .filter(|word| Difficulty::parse(word).is_none())
        .collect();
    let args = numbers(&rest.join(" "));
    TriviaOptions::new(nth(&args, 0), nth(&args, 1), nth(&args, 2), nth(&args, 3), nth(&args, 4))
        .with_difficulty(difficulty)
}

fn spawn_session<G: Game + 'static>(table: Table, host: Identity, timing: Timing, mut game: G) {
    tokio::spawn(async move {
        if let Err(err) = Session::run(table.clone(), host, timing, &mut game).await {
            error!("{} failed in chat {}: {}", game.name(), table.chat_id, err);
            let notice = format!("Something went wrong while running {}. The game has been stopped.", game.name());
            if let Err(err) = table.notify(&notice).await {
                warn!("Could not report the failure to chat {}: {}", table.chat_id, err);
            }
        }
    });
}

async fn game_handler(
    bot_state: AsyncBotState,
    bot: Bot,
    msg: Message,
    cmd: GameCommand,
) -> Result<(), teloxide::RequestError> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let host = Identity::from(user);
    let table = bot_state.table(msg.chat.id);
    let config = &bot_state.config;

    match cmd {
        GameCommand::Rps(args) => {
            let Some(opponent) = mentioned_users(&msg).into_iter().next() else {
                bot.send_message(msg.chat.id, "Reply to your opponent's message to challenge them.")
                    .await?;
                return Ok(());
            };
            let args = numbers(&args);
            let options = RpsOptions::new(nth(&args, 0), nth(&args, 1), nth(&args, 2));
            let timing = Timing::from_config(config, options.round_time);
            spawn_session(table, host, timing, Rps::new(opponent, options));
        }
        GameCommand::Mastermind(args) => {
            let args = numbers(&args);
            let options = MastermindOptions::new(nth(&args, 0), nth(&args, 1));
            let timing = Timing::from_config(config, MASTERMIND_GUESS_TIME);
            spawn_session(table, host, timing, Mastermind::new(options));
        }
        GameCommand::Trivia(args) => {
            let options = trivia_options(&args);
            let timing = Timing::from_config(config, options.round_time);
            spawn_session(table, host, timing, Trivia::new(options, Box::new(BuiltinQuestions)));
        }
    }

    Ok(())
}
