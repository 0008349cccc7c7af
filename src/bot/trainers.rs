//! ByteName and RGBit screens. Both are a [`ChannelTrainer`] drawn one row
//! at a time; the trainer itself travels in the dialogue state.

use std::sync::Arc;

use teloxide::{prelude::*, types::InlineKeyboardMarkup};

use super::{
    bulb_icon, button, edit_screen, send_screen, yes_no, Boards, HandlerResult, QuizDialogue,
    Screen, State, TrainerScreen, MENU_CALLBACK,
};
use crate::bits::{binary_string, BitOrder};
use crate::trainer::color::Rgb;
use crate::trainer::{ChannelTrainer, RowResult, DEFAULT_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainerAction {
    Toggle(usize),
    PrevRow,
    NextRow,
    Check,
    Reset,
    CheckAll,
    ResetAll,
    Order,
    RandomColor,
    Menu,
}

impl TrainerAction {
    fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "row:prev" => TrainerAction::PrevRow,
            "row:next" => TrainerAction::NextRow,
            "check" => TrainerAction::Check,
            "reset" => TrainerAction::Reset,
            "check:all" => TrainerAction::CheckAll,
            "reset:all" => TrainerAction::ResetAll,
            "order" => TrainerAction::Order,
            "random" => TrainerAction::RandomColor,
            MENU_CALLBACK => TrainerAction::Menu,
            _ => TrainerAction::Toggle(data.strip_prefix("bit:")?.parse().ok()?),
        };
        Some(action)
    }
}

fn new_trainer(screen: TrainerScreen) -> ChannelTrainer {
    match screen {
        TrainerScreen::ByteName => ChannelTrainer::for_text(DEFAULT_TEXT),
        TrainerScreen::RgBit => ChannelTrainer::for_color(Rgb::random(&mut rand::thread_rng())),
    }
}

fn input_hint(screen: TrainerScreen) -> &'static str {
    match screen {
        TrainerScreen::ByteName => "Send any text to get one row per character.",
        TrainerScreen::RgBit => {
            "Send a hex color (#1e90ff) or set one channel (R 200, g=15)."
        }
    }
}

fn result_mark(result: RowResult) -> &'static str {
    match result {
        RowResult::Pending => "…",
        RowResult::Correct => "✅",
        RowResult::Incorrect => "❌",
    }
}

/// Longest ByteName text; one screen line per character has to fit in a
/// single Telegram message.
const MAX_TEXT_CHARS: usize = 64;

/// Keeps the cursor on an existing row.
fn clamp_cursor(trainer: &ChannelTrainer, cursor: usize) -> usize {
    cursor.min(trainer.rows().len().saturating_sub(1))
}

pub fn render(screen: TrainerScreen, trainer: &ChannelTrainer, cursor: usize) -> Screen {
    let order = trainer.order();
    let title = match screen {
        TrainerScreen::ByteName => "🔤 ByteName",
        TrainerScreen::RgBit => "🎨 RGBit",
    };

    let mut lines = vec![format!(
        "{} · Progress {}/{}",
        title,
        trainer.correct_count(),
        trainer.rows().len()
    )];
    if let (Some(target), Some(current)) = (trainer.target_color(), trainer.current_color()) {
        lines.push(format!(
            "Target {} · Your mix {}",
            target.to_hex(),
            current.to_hex()
        ));
    }
    lines.push(String::new());
    for (i, row) in trainer.rows().iter().enumerate() {
        let value = row.value(order);
        lines.push(format!(
            "{} {}: target {} · yours {} ({}) {}",
            if i == cursor { "▶" } else { "  " },
            row.kind.label(),
            row.target,
            binary_string(value),
            value,
            result_mark(row.result())
        ));
    }
    lines.push(String::new());
    lines.push(input_hint(screen).to_string());

    let mut keyboard = Vec::new();
    if let Some(row) = trainer.row(cursor) {
        keyboard.push(
            row.bits()
                .iter()
                .enumerate()
                .map(|(i, lit)| button(bulb_icon(lit), format!("bit:{}", i)))
                .collect(),
        );
        keyboard.push(vec![
            button("◀", "row:prev"),
            button(format!("Check {}", row.kind.label()), "check"),
            button("Reset", "reset"),
            button("▶", "row:next"),
        ]);
    }
    keyboard.push(vec![
        button("Check all", "check:all"),
        button("Reset all", "reset:all"),
    ]);
    let mut options = vec![button(
        format!("MSB on left {}", yes_no(order == BitOrder::MsbFirst)),
        "order",
    )];
    if screen == TrainerScreen::RgBit {
        options.push(button("🎲 Random color", "random"));
    }
    keyboard.push(options);
    keyboard.push(vec![button("⬅ Menu", MENU_CALLBACK)]);

    Screen {
        text: lines.join("\n"),
        keyboard: InlineKeyboardMarkup::new(keyboard),
    }
}

pub async fn open(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    screen: TrainerScreen,
) -> HandlerResult {
    let trainer = new_trainer(screen);
    send_screen(bot, chat_id, render(screen, &trainer, 0)).await?;
    dialogue
        .update(State::Trainer {
            screen,
            trainer,
            cursor: 0,
        })
        .await?;
    Ok(())
}

/// Applies one button press. Returns the new cursor.
fn apply(
    action: TrainerAction,
    screen: TrainerScreen,
    trainer: &mut ChannelTrainer,
    cursor: usize,
) -> usize {
    let cursor = clamp_cursor(trainer, cursor);
    match action {
        TrainerAction::Toggle(bit) => {
            trainer.toggle_bit(cursor, bit);
        }
        TrainerAction::PrevRow => return cursor.saturating_sub(1),
        TrainerAction::NextRow => return clamp_cursor(trainer, cursor + 1),
        TrainerAction::Check => {
            trainer.check_row(cursor);
        }
        TrainerAction::Reset => {
            trainer.reset_row(cursor);
        }
        TrainerAction::CheckAll => trainer.check_all(),
        TrainerAction::ResetAll => trainer.reset_all(),
        TrainerAction::Order => trainer.toggle_order(),
        TrainerAction::RandomColor => {
            if screen == TrainerScreen::RgBit {
                trainer.retarget_color(Rgb::random(&mut rand::thread_rng()));
                return 0;
            }
        }
        TrainerAction::Menu => {}
    }
    cursor
}

pub async fn receive_action(
    bot: Bot,
    dialogue: QuizDialogue,
    boards: Arc<Boards>,
    (screen, mut trainer, cursor): (TrainerScreen, ChannelTrainer, usize),
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id).await?;
    let Some(message) = q.message else {
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(TrainerAction::parse) else {
        log::warn!("Unknown trainer action: {:?}", q.data);
        return Ok(());
    };
    if action == TrainerAction::Menu {
        return super::show_menu(&bot, &dialogue, &boards, message.chat.id).await;
    }

    let cursor = apply(action, screen, &mut trainer, cursor);
    log::debug!(
        "{:?} {:?} on {}: {}/{} correct",
        screen,
        action,
        message.chat.id,
        trainer.correct_count(),
        trainer.rows().len()
    );
    edit_screen(
        &bot,
        message.chat.id,
        message.id,
        render(screen, &trainer, cursor),
    )
    .await?;
    dialogue
        .update(State::Trainer {
            screen,
            trainer,
            cursor,
        })
        .await?;
    Ok(())
}

/// Text typed on a trainer screen retargets it. Returns an error hint when
/// the text could not be used.
fn retarget(screen: TrainerScreen, trainer: &mut ChannelTrainer, text: &str) -> Option<String> {
    match screen {
        TrainerScreen::ByteName => {
            let len = text.chars().count();
            if len > MAX_TEXT_CHARS {
                return Some(format!(
                    "That's {} characters, please send at most {}.",
                    len, MAX_TEXT_CHARS
                ));
            }
            trainer.retarget_text(text);
            None
        }
        TrainerScreen::RgBit => {
            if trainer.apply_hex(text).is_ok() {
                return None;
            }
            match trainer.apply_channel_setting(text) {
                Ok(_) => None,
                Err(err) => {
                    log::debug!("Rejected RGBit input: {}", err);
                    let shown: String = text.trim().chars().take(MAX_TEXT_CHARS).collect();
                    Some(format!("Couldn't read \"{}\". {}", shown, input_hint(screen)))
                }
            }
        }
    }
}

pub async fn receive_text(
    bot: Bot,
    dialogue: QuizDialogue,
    (screen, mut trainer, cursor): (TrainerScreen, ChannelTrainer, usize),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, input_hint(screen)).await?;
        return Ok(());
    };
    if let Some(hint) = retarget(screen, &mut trainer, text) {
        bot.send_message(msg.chat.id, hint).await?;
        return Ok(());
    }

    // a new hex color or a new text replaces the rows
    let cursor = clamp_cursor(&trainer, cursor);
    send_screen(&bot, msg.chat.id, render(screen, &trainer, cursor)).await?;
    dialogue
        .update(State::Trainer {
            screen,
            trainer,
            cursor,
        })
        .await?;
    Ok(())
}
