//! Reply texts and inline keyboards. Plain text (no parse mode) so user-supplied URLs never break formatting.

use crate::domain::{BatchResult, ErrorKind, ShortResult, UserStats};
use crate::usecases::command::ButtonAction;

/// Telegram caps messages at 4096 chars; stay under it.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Entries of the recent list shown in `/stats`.
const STATS_RECENT_SHOWN: usize = 5;

/// Outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Text with an inline keyboard, one button per row.
    Keyboard { text: String, buttons: Vec<Button> },
    /// Photo sent by URL, with a caption.
    Photo { url: String, caption: String },
}

/// Inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    /// Opens `url` in the user's browser.
    Link { label: String, url: String },
    /// Comes back to the bot as callback data.
    Action { label: String, action: ButtonAction },
}

/// Buttons under a freshly shortened link. Actions too long for callback data are left out.
pub fn result_buttons(short_url: &str) -> Vec<Button> {
    let mut buttons = Vec::with_capacity(4);
    let copy = ButtonAction::Copy(short_url.to_string());
    if copy.fits() {
        buttons.push(Button::Action {
            label: "📋 Copy URL".to_string(),
            action: copy,
        });
    }
    buttons.push(Button::Link {
        label: "📊 View Stats".to_string(),
        url: analytics_url(short_url),
    });
    buttons.push(Button::Link {
        label: "🔗 Open URL".to_string(),
        url: short_url.to_string(),
    });
    let qr = ButtonAction::Qr(short_url.to_string());
    if qr.fits() {
        buttons.push(Button::Action {
            label: "📱 QR Code".to_string(),
            action: qr,
        });
    }
    buttons
}

/// Reply to a single shorten: the result text, plus action buttons on success.
pub fn single(result: &ShortResult) -> Vec<Reply> {
    match result {
        ShortResult::Success { short_url, .. } => vec![Reply::Keyboard {
            text: single_result(result),
            buttons: result_buttons(short_url),
        }],
        ShortResult::Failure { .. } => text(single_result(result)),
    }
}

pub fn welcome(name: &str, max_batch: usize) -> String {
    format!(
        "👋 Hello {name}!\n\n\
         I shorten long URLs with Cuttly.\n\n\
         Send me any http:// or https:// link and I'll reply with a short one.\n\n\
         Commands:\n\
         /shorten <url> - shorten one URL\n\
         /custom <alias> <url> - shorten with your own alias\n\
         /bulk <url> <url> ... - shorten up to {max_batch} URLs at once\n\
         /qr <url> - QR code for a URL\n\
         /stats - your statistics\n\
         /help - detailed help"
    )
}

pub fn help(max_batch: usize) -> String {
    format!(
        "📚 Help\n\n\
         Basic: send any URL starting with http:// or https://\n\n\
         /custom <alias> <url>\n  Alias: 3-30 letters, numbers or hyphens, must be unused.\n\n\
         /bulk <url> <url> ...\n  URLs separated by spaces or new lines, at most {max_batch}.\n  Every URL gets its own line in the answer, in the order sent.\n\n\
         /qr <url>\n  Sends a scannable QR code image.\n\n\
         /stats\n  How many links you shortened and the latest ones.\n\n\
         Limits: URLs up to 2048 characters, http/https only."
    )
}

pub fn unknown_command(name: &str, max_batch: usize) -> String {
    format!("🤔 Unknown command /{}.\n\n{}", name, help(max_batch))
}

pub fn invalid_url() -> String {
    "❌ Invalid URL!\n\n\
     Send a URL starting with http:// or https://, e.g. https://example.com\n\n\
     Or use a command:\n\
     /custom <alias> <url>\n\
     /qr <url>\n\
     /bulk <url> <url> ..."
        .to_string()
}

pub fn shorten_usage() -> String {
    "❌ Usage: /shorten https://example.com".to_string()
}

pub fn custom_usage() -> String {
    "❌ Usage: /custom <alias> <url>\n\n\
     Example: /custom mysite https://www.mywebsite.com\n\n\
     Alias rules: 3-30 characters, letters, numbers and hyphens only, must be unique."
        .to_string()
}

pub fn bulk_usage(max_batch: usize) -> String {
    format!(
        "📦 Bulk shortener\n\n\
         Put the URLs after the command, separated by spaces or new lines:\n\n\
         /bulk https://example.com/page1\n\
         https://example.com/page2\n\
         https://example.com/page3\n\n\
         At most {max_batch} URLs at once."
    )
}

pub fn qr_usage() -> String {
    "❌ Usage: /qr https://example.com".to_string()
}

pub fn batch_too_large(given: usize, max_batch: usize) -> String {
    format!(
        "❌ {}: {} given, the maximum is {}. Please send fewer URLs.",
        ErrorKind::BatchTooLarge,
        given,
        max_batch
    )
}

/// Batch refused before any work for a reason other than its size.
pub fn batch_rejected(reason: ErrorKind) -> String {
    format!("❌ Bulk request rejected: {}", reason)
}

pub fn copy_text(url: &str) -> String {
    format!("📋 {}\n\nLong-press the link to copy it.", url)
}

pub fn stats_unavailable() -> String {
    "⚠️ Statistics are unavailable right now, try again later.".to_string()
}

/// Analytics page of a short link.
pub fn analytics_url(short_url: &str) -> String {
    format!("{}/stats", short_url.trim_end_matches('/'))
}

/// Answer to a single shorten (plain URL, `/shorten`, `/custom`).
pub fn single_result(result: &ShortResult) -> String {
    match result {
        ShortResult::Success {
            original_url,
            short_url,
            ..
        } => format!(
            "✅ URL shortened!\n\n\
             🌐 Original: {}\n\
             🔗 Short: {}\n\
             📊 Analytics: {}\n\n\
             💡 Use /custom for your own alias, /qr for a QR code.",
            truncate(original_url, 100),
            short_url,
            analytics_url(short_url)
        ),
        ShortResult::Failure { reason, .. } => format!("❌ Failed to shorten URL: {}", reason),
    }
}

/// One line per input URL, in input order.
pub fn batch_result(batch: &BatchResult) -> String {
    let mut out = format!(
        "📦 Shortened {} of {} URLs\n",
        batch.success_count(),
        batch.len()
    );
    for (i, result) in batch.iter().enumerate() {
        out.push('\n');
        match result {
            ShortResult::Success {
                original_url,
                short_url,
                ..
            } => out.push_str(&format!(
                "{}. {}\n   ✅ {}",
                i + 1,
                truncate(original_url, 60),
                short_url
            )),
            ShortResult::Failure {
                reason,
                original_url,
            } => out.push_str(&format!(
                "{}. {}\n   ❌ {}",
                i + 1,
                truncate(original_url, 60),
                reason
            )),
        }
    }
    out
}

pub fn stats(name: &str, stats: &UserStats) -> String {
    if stats.total_shortened == 0 {
        return format!(
            "📊 Your statistics\n\n\
             👤 User: {name}\n\
             🔗 URLs shortened: 0\n\n\
             🎯 Start by shortening your first URL!"
        );
    }

    let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "Never".to_string())
    };

    let mut out = format!(
        "📊 Your statistics\n\n\
         👤 User: {}\n\
         🔗 URLs shortened: {}\n\
         📅 First used: {}\n\
         ⏰ Last used: {}\n\
         🎯 Rank: {}\n",
        name,
        stats.total_shortened,
        fmt_time(stats.first_used),
        fmt_time(stats.last_used),
        stats.rank()
    );

    let recent: Vec<_> = stats
        .recent
        .iter()
        .filter_map(|r| match r {
            ShortResult::Success {
                original_url,
                short_url,
                ..
            } => Some((original_url, short_url)),
            ShortResult::Failure { .. } => None,
        })
        .take(STATS_RECENT_SHOWN)
        .collect();
    if !recent.is_empty() {
        out.push_str("\n🕘 Recent:\n");
        for (original, short) in recent {
            out.push_str(&format!("• {} ← {}\n", short, truncate(original, 50)));
        }
    }
    out
}

pub fn qr_caption(url: &str) -> String {
    format!(
        "📱 QR code for {}\n\nScan it with your phone camera or a QR scanner app.",
        truncate(url, 100)
    )
}

/// Truncate to `max` chars, appending "..." when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Split `text` into chunks of at most `limit` chars, preferring line boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            // A single line longer than the limit is cut hard.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                if piece.len() == limit {
                    chunks.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Text replies, split to fit Telegram's message limit.
pub fn text(body: String) -> Vec<Reply> {
    split_message(&body, MAX_MESSAGE_CHARS)
        .into_iter()
        .map(Reply::Text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn test_batch_result_lists_every_url_in_order() {
        let batch = BatchResult::new(vec![
            ShortResult::Success {
                original_url: "https://a.com".into(),
                short_url: "https://cutt.ly/a".into(),
                click_tracking_id: "a".into(),
            },
            ShortResult::failure(ErrorKind::InvalidUrl, "not-a-url"),
            ShortResult::failure(ErrorKind::UpstreamTimeout, "https://b.com"),
        ]);

        let text = batch_result(&batch);

        assert!(text.starts_with("📦 Shortened 1 of 3 URLs"));
        let a = text.find("1. https://a.com").unwrap();
        let bad = text.find("2. not-a-url").unwrap();
        let b = text.find("3. https://b.com").unwrap();
        assert!(a < bad && bad < b);
        assert!(text.contains("✅ https://cutt.ly/a"));
        assert!(text.contains(&ErrorKind::UpstreamTimeout.to_string()));
    }

    #[test]
    fn test_stats_for_new_user() {
        let text = stats("Ann", &UserStats::empty(UserId(1)));
        assert!(text.contains("URLs shortened: 0"));
        assert!(text.contains("Start by shortening"));
    }

    #[test]
    fn test_analytics_url() {
        assert_eq!(analytics_url("https://cutt.ly/abc"), "https://cutt.ly/abc/stats");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_split_message_short_text_untouched() {
        assert_eq!(split_message("hello\nworld", 100), vec!["hello\nworld".to_string()]);
    }

    #[test]
    fn test_split_message_on_line_boundaries() {
        let line = format!("{}\n", "x".repeat(9));
        let text = line.repeat(5);
        let chunks = split_message(&text, 25);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 25));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_message_hard_cuts_long_line() {
        let text = "y".repeat(10_000);
        let chunks = split_message(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_success_gets_action_buttons() {
        let result = ShortResult::Success {
            original_url: "https://a.com".into(),
            short_url: "https://cutt.ly/abc".into(),
            click_tracking_id: "abc".into(),
        };

        let replies = single(&result);
        let [Reply::Keyboard { text, buttons }] = replies.as_slice() else {
            panic!("expected keyboard reply, got {:?}", replies);
        };
        assert!(text.contains("https://cutt.ly/abc"));
        assert_eq!(
            buttons.as_slice(),
            &[
                Button::Action {
                    label: "📋 Copy URL".into(),
                    action: ButtonAction::Copy("https://cutt.ly/abc".into()),
                },
                Button::Link {
                    label: "📊 View Stats".into(),
                    url: "https://cutt.ly/abc/stats".into(),
                },
                Button::Link {
                    label: "🔗 Open URL".into(),
                    url: "https://cutt.ly/abc".into(),
                },
                Button::Action {
                    label: "📱 QR Code".into(),
                    action: ButtonAction::Qr("https://cutt.ly/abc".into()),
                },
            ]
        );
    }

    #[test]
    fn test_failure_has_no_buttons() {
        let replies = single(&ShortResult::failure(ErrorKind::AliasTaken, "https://a.com"));
        assert!(matches!(replies.as_slice(), [Reply::Text(t)] if t.contains(&ErrorKind::AliasTaken.to_string())));
    }

    #[test]
    fn test_overlong_link_drops_callback_buttons() {
        let long = format!("https://cutt.ly/{}", "a".repeat(60));
        let buttons = result_buttons(&long);
        assert_eq!(buttons.len(), 2);
        assert!(buttons.iter().all(|b| matches!(b, Button::Link { .. })));
    }

    #[test]
    fn test_batch_rejected_names_the_reason() {
        let text = batch_rejected(ErrorKind::UpstreamUnavailable);
        assert!(text.contains(&ErrorKind::UpstreamUnavailable.to_string()));
        assert!(!text.contains(&ErrorKind::BatchTooLarge.to_string()));
    }
}
