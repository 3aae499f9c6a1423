use std::time::Duration;

use log::info;
use teloxide::{prelude::*, utils::command::BotCommands};

use super::AsyncBotState;

// Periods shorter than this are applied without a confirmation message.
const QUIET_BELOW: Duration = Duration::from_secs(20);

pub fn get_owner_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), teloxide::RequestError>,
    teloxide::dispatching::DpHandlerDescription,
> {
    dptree::entry()
        .filter_command::<OwnerCommand>()
        .filter(|msg: Message, bot_state: AsyncBotState| {
            msg.from().map_or(false, |user| bot_state.config.is_owner(user.id))
        })
        .endpoint(owner_handler)
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Owner commands")]
pub enum OwnerCommand {
    #[command(description = "(owner only) restart the periodic seat clear. /refresh [seconds]")]
    Refresh(String),
}

fn refresh_period(args: &str, default: Duration) -> Duration {
    match args.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => default,
    }
}

async fn owner_handler(
    bot_state: AsyncBotState,
    bot: Bot,
    msg: Message,
    cmd: OwnerCommand,
) -> Result<(), teloxide::RequestError> {
    match cmd {
        OwnerCommand::Refresh(args) => {
            let period = refresh_period(&args, bot_state.config.seat_clear_period);
            bot_state.clear_timer().start(period);
            info!("Seat clear restarted with a period of {}s", period.as_secs());

            if period >= QUIET_BELOW {
                bot.send_message(
                    msg.chat.id,
                    format!("Players will be released from games every {} seconds.", period.as_secs()),
                )
                .await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_period_falls_back_to_default() {
        let default = Duration::from_secs(180);
        assert_eq!(refresh_period("", default), default);
        assert_eq!(refresh_period("0", default), default);
        assert_eq!(refresh_period("soon", default), default);
        assert_eq!(refresh_period(" 45 ", default), Duration::from_secs(45));
    }
}
