//! The BitWise Trainer screen: one message with eight bulb buttons, redrawn
//! in place on every press and on every second of a running quiz.

use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, MessageId},
};

use super::{
    bulb_icon, button, edit_screen, now_ms, send_screen, with_leaderboard, yes_no, Boards,
    HandlerResult, QuizDialogue, Screen, SharedLeaderboard, State, MENU_CALLBACK,
};
use crate::bits::{ascii_glyph, binary_string, weights, BitOrder};
use crate::leaderboard::LeaderboardEntry;
use crate::quiz::board::{BulbBoard, PRESET_ALTERNATING_HIGH, PRESET_ALTERNATING_LOW};
use crate::quiz::timer::QuestionTimer;
use crate::quiz::{NextOutcome, QuizResult, TickOutcome};

const SKIP_EMAIL: &str = "skip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitwiseAction {
    Toggle(usize),
    Clear,
    Preset(u8),
    Random,
    Order,
    StartQuiz,
    Check,
    Next,
    End,
    LogResult,
    Menu,
}

impl BitwiseAction {
    fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "clear" => BitwiseAction::Clear,
            "random" => BitwiseAction::Random,
            "order" => BitwiseAction::Order,
            "quiz:start" => BitwiseAction::StartQuiz,
            "quiz:check" => BitwiseAction::Check,
            "quiz:next" => BitwiseAction::Next,
            "quiz:end" => BitwiseAction::End,
            "log" => BitwiseAction::LogResult,
            MENU_CALLBACK => BitwiseAction::Menu,
            _ => {
                if let Some(bit) = data.strip_prefix("bit:") {
                    BitwiseAction::Toggle(bit.parse().ok()?)
                } else if let Some(value) = data.strip_prefix("preset:") {
                    BitwiseAction::Preset(value.parse().ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }
}

fn order_label(order: BitOrder) -> String {
    format!("MSB on left {}", yes_no(order == BitOrder::MsbFirst))
}

pub fn render(board: &BulbBoard) -> Screen {
    let session = board.session();
    let value = board.value();

    let mut lines = vec!["💡 BitWise Trainer".to_string()];
    if let Some(question) = session.current_question().filter(|_| session.is_running()) {
        lines.push(format!(
            "Question {}/{} · ⏱ {}s · Score {}",
            session.index() + 1,
            session.total(),
            session.time_left(),
            session.score()
        ));
        lines.push(question.prompt());
    }
    lines.push(String::new());
    lines.push(format!(
        "Weights: {}",
        weights(board.order())
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    ));
    lines.push(format!("Decimal: {}", value));
    lines.push(format!("ASCII: {}", ascii_glyph(value)));
    lines.push(format!("Binary: {}", binary_string(value)));
    if let Some(feedback) = board.feedback() {
        lines.push(String::new());
        lines.push(feedback.to_string());
    }

    let bulbs = board
        .bits()
        .iter()
        .enumerate()
        .map(|(i, lit)| button(bulb_icon(lit), format!("bit:{}", i)))
        .collect::<Vec<_>>();

    let mut keyboard = vec![
        bulbs,
        vec![
            button("Clear", "clear"),
            button(
                binary_string(PRESET_ALTERNATING_HIGH),
                format!("preset:{}", PRESET_ALTERNATING_HIGH),
            ),
            button(
                binary_string(PRESET_ALTERNATING_LOW),
                format!("preset:{}", PRESET_ALTERNATING_LOW),
            ),
            button("🎲 Random", "random"),
        ],
        vec![button(order_label(board.order()), "order")],
    ];
    if session.is_running() {
        keyboard.push(vec![
            button("Check", "quiz:check"),
            button("Next", "quiz:next"),
            button("End", "quiz:end"),
        ]);
    } else {
        keyboard.push(vec![button("▶ Start Quiz", "quiz:start")]);
    }
    let mut last_row = Vec::new();
    if board.last_result().is_some() {
        last_row.push(button("📝 Log my result", "log"));
    }
    last_row.push(button("⬅ Menu", MENU_CALLBACK));
    keyboard.push(last_row);

    Screen {
        text: lines.join("\n"),
        keyboard: InlineKeyboardMarkup::new(keyboard),
    }
}

/// Opens the screen for `chat_id`, reusing the board if one is still live.
pub async fn open(
    bot: &Bot,
    dialogue: &QuizDialogue,
    boards: &Boards,
    chat_id: ChatId,
) -> HandlerResult {
    let screen = {
        let mut boards = boards.lock().await;
        render(boards.entry(chat_id).or_default())
    };
    send_screen(bot, chat_id, screen).await?;
    dialogue.update(State::Bitwise).await?;
    Ok(())
}

/// Counts the current question down on the screen message, one edit per
/// second, until the question locks or the board moves on.
fn spawn_countdown(
    bot: Bot,
    boards: Arc<Boards>,
    chat_id: ChatId,
    message_id: MessageId,
    question: usize,
) -> QuestionTimer {
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // the first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let (outcome, screen) = {
                let mut boards = boards.lock().await;
                let Some(board) = boards.get_mut(&chat_id) else {
                    return;
                };
                let outcome = board.tick(question);
                (outcome, render(board))
            };
            if outcome == TickOutcome::Ignored {
                return;
            }
            if let Err(err) = edit_screen(&bot, chat_id, message_id, screen).await {
                log::warn!("Could not redraw countdown for {}: {}", chat_id, err);
            }
            if let TickOutcome::Expired(check) = outcome {
                log::debug!("Question {} expired for {}: {:?}", question, chat_id, check);
                return;
            }
        }
    });
    QuestionTimer::new(question, handle)
}

pub async fn receive_action(
    bot: Bot,
    dialogue: QuizDialogue,
    boards: Arc<Boards>,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id).await?;
    let Some(message) = q.message else {
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(BitwiseAction::parse) else {
        log::warn!("Unknown BitWise action: {:?}", q.data);
        return Ok(());
    };
    let chat_id = message.chat.id;

    match action {
        BitwiseAction::Menu => return super::show_menu(&bot, &dialogue, &boards, chat_id).await,
        BitwiseAction::LogResult => {
            let result = boards
                .lock()
                .await
                .get_mut(&chat_id)
                .and_then(BulbBoard::take_last_result);
            if let Some(result) = result {
                bot.send_message(
                    chat_id,
                    format!(
                        "Score {}/{} in {}s. What name should go on the leaderboard?",
                        result.score, result.total, result.duration_secs
                    ),
                )
                .await?;
                dialogue.update(State::ReceiveLogName { result }).await?;
                return Ok(());
            }
        }
        _ => {}
    }

    let screen = {
        let mut guard = boards.lock().await;
        let board = guard.entry(chat_id).or_default();
        let now = now_ms();
        let mut armed_question = None;
        match action {
            BitwiseAction::Toggle(bit) => {
                board.toggle_bit(bit);
            }
            BitwiseAction::Clear => {
                board.clear();
            }
            BitwiseAction::Preset(value) => {
                board.set_value(value as i64);
            }
            BitwiseAction::Random => {
                board.randomize(&mut rand::thread_rng());
            }
            BitwiseAction::Order => board.toggle_order(),
            BitwiseAction::StartQuiz => {
                board.start_quiz(&mut rand::thread_rng(), now);
                log::info!("Quiz started for {}", chat_id);
                armed_question = Some(0);
            }
            BitwiseAction::Check => {
                board.check();
            }
            BitwiseAction::Next => match board.next(now) {
                Some(NextOutcome::Question(index)) => armed_question = Some(index),
                Some(NextOutcome::Ended(result)) => log_finished(chat_id, result),
                None => {}
            },
            BitwiseAction::End => {
                if let Some(result) = board.end(now) {
                    log_finished(chat_id, result);
                }
            }
            BitwiseAction::LogResult | BitwiseAction::Menu => {}
        }
        if let Some(question) = armed_question {
            let timer = spawn_countdown(bot.clone(), boards.clone(), chat_id, message.id, question);
            board.arm_timer(timer);
        }
        render(board)
    };
    edit_screen(&bot, chat_id, message.id, screen).await?;
    Ok(())
}

fn log_finished(chat_id: ChatId, result: QuizResult) {
    log::info!(
        "Quiz finished for {}: {}/{} in {}s",
        chat_id,
        result.score,
        result.total,
        result.duration_secs
    );
}

pub async fn receive_log_name(
    bot: Bot,
    dialogue: QuizDialogue,
    result: QuizResult,
    msg: Message,
) -> HandlerResult {
    match msg.text().map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            bot.send_message(
                msg.chat.id,
                format!("Thanks, {}! Send your email, or \"{}\".", name, SKIP_EMAIL),
            )
            .await?;
            dialogue
                .update(State::ReceiveLogEmail {
                    result,
                    name: name.to_string(),
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please type your name (as text)")
                .await?;
        }
    }
    Ok(())
}

pub async fn receive_log_email(
    bot: Bot,
    dialogue: QuizDialogue,
    boards: Arc<Boards>,
    leaderboard: Arc<SharedLeaderboard>,
    (result, name): (QuizResult, String),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please type your email, or \"skip\"")
            .await?;
        return Ok(());
    };
    let email = Some(text.trim()).filter(|email| !email.eq_ignore_ascii_case(SKIP_EMAIL));

    match LeaderboardEntry::new(&name, email, result, now_ms()) {
        Ok(entry) => {
            with_leaderboard(&leaderboard, msg.chat.id, |store| store.append(entry)).await;
            bot.send_message(msg.chat.id, "Result logged to the leaderboard 🏆")
                .await?;
        }
        Err(err) => {
            log::warn!("Dropping leaderboard entry: {}", err);
            bot.send_message(msg.chat.id, "A name is required, result not logged.")
                .await?;
        }
    }
    open(&bot, &dialogue, &boards, msg.chat.id).await
}
