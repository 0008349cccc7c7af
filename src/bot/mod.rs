pub mod bitwise;
pub mod leaderboard;
pub mod trainers;

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::{
    dispatching::{
        dialogue::{self, ErasedStorage},
        UpdateHandler,
    },
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, MessageId},
    ApiError, RequestError,
};
use tokio::sync::Mutex;

use crate::leaderboard::storage::FileStorage;
use crate::leaderboard::{LeaderboardStore, Leaderboards};
use crate::quiz::board::BulbBoard;
use crate::quiz::QuizResult;
use crate::trainer::ChannelTrainer;

pub type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
pub type DialogueStorage = Arc<ErasedStorage<State>>;

/// Live BitWise boards by chat. Boards own running countdowns, so they stay
/// in memory instead of the dialogue storage.
pub type Boards = Mutex<HashMap<ChatId, BulbBoard>>;
/// Per-chat leaderboards, keyed by chat id.
pub type SharedLeaderboard = Mutex<Leaderboards<FileStorage>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrainerScreen {
    ByteName,
    RgBit,
}

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Menu,
    Bitwise,
    ReceiveLogName {
        result: QuizResult,
    },
    ReceiveLogEmail {
        result: QuizResult,
        name: String,
    },
    Leaderboard,
    Trainer {
        screen: TrainerScreen,
        trainer: ChannelTrainer,
        cursor: usize,
    },
}

/// Text and buttons of one screen message.
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

const BITWISE_MODULE: &str = "BitWise Trainer";
const RGBIT_MODULE: &str = "RGBit";
const BYTENAME_MODULE: &str = "ByteName";
const LEADERBOARD_MODULE: &str = "Leaderboard";
const MODULES: [&str; 4] = [BITWISE_MODULE, RGBIT_MODULE, BYTENAME_MODULE, LEADERBOARD_MODULE];

pub const MENU_CALLBACK: &str = "menu";

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Runs `op` on the leaderboard of `chat_id`. The store reads and writes
/// files, so it runs where blocking is allowed.
pub async fn with_leaderboard<T>(
    leaderboards: &SharedLeaderboard,
    chat_id: ChatId,
    op: impl FnOnce(&mut LeaderboardStore<FileStorage>) -> T,
) -> T {
    let mut leaderboards = leaderboards.lock().await;
    tokio::task::block_in_place(|| op(leaderboards.for_scope(chat_id.0)))
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let message_handler = Update::filter_message()
        .branch(dptree::filter(|msg: Message| is_menu_command(&msg)).endpoint(start))
        .branch(dptree::filter(|msg: Message| module_choice(&msg).is_some()).endpoint(receive_module_choice))
        .branch(case![State::Start].endpoint(start))
        .branch(case![State::ReceiveLogName { result }].endpoint(bitwise::receive_log_name))
        .branch(case![State::ReceiveLogEmail { result, name }].endpoint(bitwise::receive_log_email))
        .branch(case![State::Trainer { screen, trainer, cursor }].endpoint(trainers::receive_text))
        .branch(dptree::endpoint(unhandled_message));

    let callback_query_handler = Update::filter_callback_query()
        .branch(case![State::Bitwise].endpoint(bitwise::receive_action))
        .branch(case![State::Leaderboard].endpoint(leaderboard::receive_action))
        .branch(case![State::Trainer { screen, trainer, cursor }].endpoint(trainers::receive_action))
        .branch(dptree::endpoint(stale_callback));

    dialogue::enter::<Update, ErasedStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_query_handler)
}

fn is_menu_command(msg: &Message) -> bool {
    matches!(msg.text().map(str::trim), Some("/start") | Some("/menu"))
}

fn module_choice(msg: &Message) -> Option<&'static str> {
    let text = msg.text()?.trim();
    MODULES.iter().find(|m| **m == text).copied()
}

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(BITWISE_MODULE),
            KeyboardButton::new(RGBIT_MODULE),
            KeyboardButton::new(BYTENAME_MODULE),
        ],
        vec![KeyboardButton::new(LEADERBOARD_MODULE)],
    ])
}

const GREETING_TEXT: &str = "Hi! I'm BiteBulbs 💡 Flip the bulbs to learn how bytes become numbers, letters and colors.\n\nChoose a module:";

async fn start(bot: Bot, dialogue: QuizDialogue, boards: Arc<Boards>, msg: Message) -> HandlerResult {
    boards.lock().await.remove(&msg.chat.id);
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(menu_keyboard())
        .await?;
    dialogue.update(State::Menu).await?;
    Ok(())
}

/// Sends the module menu, closing whatever screen was open.
pub async fn show_menu(
    bot: &Bot,
    dialogue: &QuizDialogue,
    boards: &Boards,
    chat_id: ChatId,
) -> HandlerResult {
    boards.lock().await.remove(&chat_id);
    bot.send_message(chat_id, "Choose a module:")
        .reply_markup(menu_keyboard())
        .await?;
    dialogue.update(State::Menu).await?;
    Ok(())
}

async fn receive_module_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    boards: Arc<Boards>,
    leaderboard: Arc<SharedLeaderboard>,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    // every module opens fresh
    boards.lock().await.remove(&chat_id);

    match module_choice(&msg) {
        Some(BITWISE_MODULE) => bitwise::open(&bot, &dialogue, &boards, chat_id).await,
        Some(RGBIT_MODULE) => {
            trainers::open(&bot, &dialogue, chat_id, TrainerScreen::RgBit).await
        }
        Some(BYTENAME_MODULE) => {
            trainers::open(&bot, &dialogue, chat_id, TrainerScreen::ByteName).await
        }
        Some(LEADERBOARD_MODULE) => leaderboard::open(&bot, &dialogue, &leaderboard, chat_id).await,
        _ => {
            bot.send_message(chat_id, "Please choose one of the modules")
                .reply_markup(menu_keyboard())
                .await?;
            Ok(())
        }
    }
}

async fn unhandled_message(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Use the buttons on the screen, or send /menu to pick a module.",
    )
    .await?;
    Ok(())
}

async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id)
        .text("This screen is closed. Send /menu to start again.")
        .await?;
    Ok(())
}

pub fn button(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data)
}

pub fn bulb_icon(lit: bool) -> &'static str {
    if lit {
        "💡"
    } else {
        "⚫"
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "✓"
    } else {
        "✗"
    }
}

pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> Result<Message, RequestError> {
    bot.send_message(chat_id, screen.text)
        .reply_markup(screen.keyboard)
        .await
}

/// Redraws a screen message in place. Redrawing an unchanged screen is fine.
pub async fn edit_screen(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    screen: Screen,
) -> Result<(), RequestError> {
    match bot
        .edit_message_text(chat_id, message_id, screen.text)
        .reply_markup(screen.keyboard)
        .await
    {
        Ok(_) => Ok(()),
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(err) => Err(err),
    }
}
