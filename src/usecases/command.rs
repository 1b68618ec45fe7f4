//! Chat command parsing.

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Stats,
    /// `/shorten <url>`; `None` when the URL is missing.
    Shorten(Option<String>),
    /// `/custom <alias> <url>`; `None` unless both are given.
    Custom(Option<CustomArgs>),
    /// `/bulk <url> <url> ...`, whitespace or newline separated.
    Bulk(Vec<String>),
    /// `/qr <url>`; `None` when the URL is missing.
    Qr(Option<String>),
    /// Plain text (not a command), treated as a URL to shorten.
    Text(String),
    /// A slash command the bot does not know.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomArgs {
    pub alias: String,
    pub url: String,
}

impl Command {
    /// Parse message text. `/cmd@BotName` is treated as `/cmd`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(after_slash) = text.strip_prefix('/') else {
            return Self::Text(text.to_owned());
        };

        let (head, args) = match after_slash.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (after_slash, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let first_arg = || args.split_whitespace().next().map(str::to_owned);

        match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "stats" => Self::Stats,
            "shorten" | "short" => Self::Shorten(first_arg()),
            "custom" => {
                let mut parts = args.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(alias), Some(url)) => Self::Custom(Some(CustomArgs {
                        alias: alias.to_owned(),
                        url: url.to_owned(),
                    })),
                    _ => Self::Custom(None),
                }
            }
            "bulk" => Self::Bulk(args.split_whitespace().map(str::to_owned).collect()),
            "qr" => Self::Qr(first_arg()),
            _ => Self::Unknown(name),
        }
    }
}

/// Telegram's limit on inline button callback data, in bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

/// Action carried by an inline keyboard button and echoed back as callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Resend a short link as plain text for copying.
    Copy(String),
    /// Send a QR code for a short link.
    Qr(String),
}

impl ButtonAction {
    pub fn encode(&self) -> String {
        match self {
            Self::Copy(url) => format!("copy_{}", url),
            Self::Qr(url) => format!("qr_{}", url),
        }
    }

    pub fn decode(data: &str) -> Option<Self> {
        let action = match data.split_once('_')? {
            ("copy", url) => Self::Copy(url.to_owned()),
            ("qr", url) => Self::Qr(url.to_owned()),
            _ => return None,
        };
        (!action.url().is_empty()).then_some(action)
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Copy(url) | Self::Qr(url) => url,
        }
    }

    /// Whether the encoded form fits in a callback button.
    pub fn fits(&self) -> bool {
        self.encode().len() <= MAX_CALLBACK_DATA
    }
}
