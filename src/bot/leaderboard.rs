use std::sync::Arc;

use chrono::{TimeZone, Utc};
use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, InputFile},
};

use super::{
    button, edit_screen, send_screen, with_leaderboard, Boards, HandlerResult, QuizDialogue,
    Screen, SharedLeaderboard, State, MENU_CALLBACK,
};
use crate::leaderboard::export::{percent, CSV_FILE_NAME};
use crate::leaderboard::LeaderboardEntry;

/// Entries listed in the message; the export carries all of them.
const SHOWN_ENTRIES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaderboardAction {
    Export,
    AskClear,
    ConfirmClear,
    Cancel,
    Menu,
}

impl LeaderboardAction {
    fn parse(data: &str) -> Option<Self> {
        match data {
            "lb:export" => Some(LeaderboardAction::Export),
            "lb:clear" => Some(LeaderboardAction::AskClear),
            "lb:clear:yes" => Some(LeaderboardAction::ConfirmClear),
            "lb:cancel" => Some(LeaderboardAction::Cancel),
            MENU_CALLBACK => Some(LeaderboardAction::Menu),
            _ => None,
        }
    }
}

fn entry_line(rank: usize, entry: &LeaderboardEntry) -> String {
    let date = Utc
        .timestamp_millis_opt(entry.timestamp)
        .single()
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{}. {} · {}/{} ({}) · {}s · {}",
        rank,
        entry.name,
        entry.score,
        entry.total,
        percent(entry.score, entry.total),
        entry.duration_secs,
        date
    )
}

pub fn render(entries: &[LeaderboardEntry]) -> Screen {
    let mut lines = vec!["🏆 Leaderboard".to_string(), String::new()];
    if entries.is_empty() {
        lines.push("No results yet. Finish a BitWise quiz and log it!".to_string());
    } else {
        lines.extend(
            entries
                .iter()
                .take(SHOWN_ENTRIES)
                .enumerate()
                .map(|(i, entry)| entry_line(i + 1, entry)),
        );
        if entries.len() > SHOWN_ENTRIES {
            lines.push(format!(
                "…and {} more in the export",
                entries.len() - SHOWN_ENTRIES
            ));
        }
    }

    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            button("📄 Export CSV", "lb:export"),
            button("🗑 Clear", "lb:clear"),
        ],
        vec![button("⬅ Menu", MENU_CALLBACK)],
    ]);
    Screen {
        text: lines.join("\n"),
        keyboard,
    }
}

fn render_confirm_clear(count: usize) -> Screen {
    Screen {
        text: format!("Clear all {} leaderboard entries? This cannot be undone.", count),
        keyboard: InlineKeyboardMarkup::new(vec![vec![
            button("Yes, clear", "lb:clear:yes"),
            button("Cancel", "lb:cancel"),
        ]]),
    }
}

pub async fn open(
    bot: &Bot,
    dialogue: &QuizDialogue,
    leaderboard: &SharedLeaderboard,
    chat_id: ChatId,
) -> HandlerResult {
    let screen = with_leaderboard(leaderboard, chat_id, |store| render(store.entries())).await;
    send_screen(bot, chat_id, screen).await?;
    dialogue.update(State::Leaderboard).await?;
    Ok(())
}

pub async fn receive_action(
    bot: Bot,
    dialogue: QuizDialogue,
    boards: Arc<Boards>,
    leaderboard: Arc<SharedLeaderboard>,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id).await?;
    let Some(message) = q.message else {
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(LeaderboardAction::parse) else {
        log::warn!("Unknown leaderboard action: {:?}", q.data);
        return Ok(());
    };
    let chat_id = message.chat.id;

    let screen = match action {
        LeaderboardAction::Menu => return super::show_menu(&bot, &dialogue, &boards, chat_id).await,
        LeaderboardAction::Export => {
            let csv = with_leaderboard(&leaderboard, chat_id, |store| store.export_csv()).await;
            log::info!("Exporting leaderboard for {}", chat_id);
            bot.send_document(
                chat_id,
                InputFile::memory(csv.into_bytes()).file_name(CSV_FILE_NAME),
            )
            .await?;
            return Ok(());
        }
        LeaderboardAction::AskClear => {
            with_leaderboard(&leaderboard, chat_id, |store| {
                render_confirm_clear(store.entries().len())
            })
            .await
        }
        LeaderboardAction::ConfirmClear => {
            with_leaderboard(&leaderboard, chat_id, |store| {
                store.clear();
                render(store.entries())
            })
            .await
        }
        LeaderboardAction::Cancel => {
            with_leaderboard(&leaderboard, chat_id, |store| render(store.entries())).await
        }
    };
    edit_screen(&bot, chat_id, message.id, screen).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            email: None,
            score,
            total: 5,
            timestamp: 1_704_067_200_000,
            duration_secs: 21,
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            LeaderboardAction::parse("lb:clear:yes"),
            Some(LeaderboardAction::ConfirmClear)
        );
        assert_eq!(LeaderboardAction::parse("clear"), None);
    }

    #[test]
    fn test_render_lists_newest_first() {
        let screen = render(&[entry("Ada", 5), entry("Bo", 2)]);
        let lines: Vec<&str> = screen.text.lines().collect();
        assert_eq!(lines[2], "1. Ada · 5/5 (100%) · 21s · 2024-01-01 00:00");
        assert_eq!(lines[3], "2. Bo · 2/5 (40%) · 21s · 2024-01-01 00:00");
    }

    #[test]
    fn test_render_truncates_long_lists() {
        let entries: Vec<_> = (0..25).map(|i| entry(&format!("p{}", i), 1)).collect();
        let screen = render(&entries);
        assert!(screen.text.contains("20. p19"));
        assert!(!screen.text.contains("21. p20"));
        assert!(screen.text.ends_with("…and 5 more in the export"));
    }

    #[test]
    fn test_render_empty() {
        let screen = render(&[]);
        assert!(screen.text.contains("No results yet"));
        assert_eq!(screen.keyboard.inline_keyboard[0][0].text, "📄 Export CSV");
    }
}
