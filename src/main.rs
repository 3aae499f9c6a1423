use std::error::Error;

use teloxide::prelude::*;

use parlor_bot::{
    config::BotConfig,
    handlers::{
        event_handler::{get_button_handler, get_text_handler},
        game_handler::get_game_handler,
        new_async_bot_state,
        owner_handler::get_owner_handler,
        utility_handler::get_utility_handler,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting Parlor Bot");

    let config = BotConfig::from_env()?;
    if config.owner_id.is_none() {
        log::warn!("OWNER_ID is not set, /refresh is disabled");
    }

    let bot = Bot::from_env();
    let bot_state = new_async_bot_state(bot.clone(), config);
    bot_state.clear_timer().start(bot_state.config.seat_clear_period);

    // Command branches come first; whatever they do not claim is published
    // to running games as plain text.
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(get_utility_handler())
                .branch(get_owner_handler())
                .branch(get_game_handler())
                .branch(get_text_handler()),
        )
        .branch(get_button_handler());

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![bot_state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
