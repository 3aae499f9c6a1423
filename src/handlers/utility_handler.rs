use log::warn;
use teloxide::{prelude::*, types::BotCommand, utils::command::BotCommands};

use super::{game_handler::GameCommand, owner_handler::OwnerCommand, AsyncBotState};
use crate::{
    pagination::{PaginatedView, Paginator},
    surface::Control,
};

const COMMANDS_PER_PAGE: usize = 5;

pub fn get_utility_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), teloxide::RequestError>,
    teloxide::dispatching::DpHandlerDescription,
> {
    dptree::entry()
        .filter_command::<UtilityCommand>()
        .endpoint(utility_handler)
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Utility")]
pub enum UtilityCommand {
    #[command(description = "list all commands, or describe one. /help [command]")]
    Help(String),
    #[command(description = "check that the bot is alive.")]
    Ping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Category {
    All,
    Games,
    Utility,
}

impl Category {
    const ALL: [Category; 3] = [Category::All, Category::Games, Category::Utility];

    fn data(self) -> &'static str {
        match self {
            Category::All => "help:all",
            Category::Games => "help:games",
            Category::Utility => "help:utility",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Games => "Games",
            Category::Utility => "Utility",
        }
    }

    fn from_data(data: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.data() == data)
    }

    fn controls() -> Vec<Control> {
        Category::ALL
            .into_iter()
            .map(|c| Control::new(c.label(), c.data()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct CommandEntry {
    name: String,
    description: String,
}

impl CommandEntry {
    fn new(command: BotCommand) -> CommandEntry {
        CommandEntry {
            name: command.command.trim_start_matches('/').to_string(),
            description: command.description,
        }
    }

    fn line(&self) -> String {
        format!("/{}: {}", self.name, self.description)
    }
}

fn entries(category: Category) -> Vec<CommandEntry> {
    let games = || GameCommand::bot_commands().into_iter().map(CommandEntry::new);
    let utility = || {
        UtilityCommand::bot_commands()
            .into_iter()
            .chain(OwnerCommand::bot_commands())
            .map(CommandEntry::new)
    };

    match category {
        Category::All => games().chain(utility()).collect(),
        Category::Games => games().collect(),
        Category::Utility => utility().collect(),
    }
}

fn describe(name: &str) -> String {
    let name = name.trim().trim_start_matches('/').to_lowercase();
    match entries(Category::All).into_iter().find(|entry| entry.name == name) {
        Some(entry) => entry.line(),
        None => format!("There is no command called /{name}. Try /help for the full list."),
    }
}

async fn utility_handler(
    bot_state: AsyncBotState,
    bot: Bot,
    msg: Message,
    cmd: UtilityCommand,
) -> Result<(), teloxide::RequestError> {
    match cmd {
        UtilityCommand::Ping => {
            bot.send_message(msg.chat.id, "Pong!").await?;
        }
        UtilityCommand::Help(name) if !name.trim().is_empty() => {
            bot.send_message(msg.chat.id, describe(&name)).await?;
        }
        UtilityCommand::Help(_) => {
            let Some(user) = msg.from() else {
                return Ok(());
            };
            let table = bot_state.table(msg.chat.id);
            let view = PaginatedView::new(
                "📖 Commands",
                Paginator::new(entries(Category::All), COMMANDS_PER_PAGE),
                user.id,
                bot_state.config.page_time_limit,
            )
            .with_selectors(Category::controls());

            tokio::spawn(async move {
                let result = view
                    .run(&table, CommandEntry::line, |data| Category::from_data(data).map(entries))
                    .await;
                if let Err(err) = result {
                    warn!("Help view failed in chat {}: {}", table.chat_id, err);
                }
            });
        }
    }

    Ok(())
}
