mod bits;
mod bot;
mod config;
mod error;
mod leaderboard;
mod quiz;
mod trainer;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{serializer::Json, SqliteStorage, Storage},
    prelude::*,
};
use tokio::sync::Mutex;

use bot::{Boards, DialogueStorage, SharedLeaderboard};
use config::Config;
use leaderboard::{storage::FileStorage, Leaderboards};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a missing .env is fine, the variables may come from the environment
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting BiteBulbs bot...");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.db_path);
    let storage: DialogueStorage = SqliteStorage::open(&config.db_path, Json).await?.erase();

    let leaderboard: Arc<SharedLeaderboard> = Arc::new(Mutex::new(Leaderboards::new(
        FileStorage::new(&config.data_dir),
    )));
    let boards: Arc<Boards> = Arc::new(Mutex::new(Default::default()));

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![storage, leaderboard, boards])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
