//! Deep link rendering and parsing
//!
//! Links take the form `<base-url>?start=<payload_id>`; opening one makes the
//! chat client send `/start <payload_id>` to the bot.

use crate::models::PayloadId;

const TELEGRAM_BASE: &str = "https://t.me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkBuilder {
    base_url: String,
}

impl DeepLinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Links that open a chat with `bot_username`
    pub fn for_bot(bot_username: &str) -> Self {
        Self::new(format!(
            "{}/{}",
            TELEGRAM_BASE,
            bot_username.trim_start_matches('@')
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn link(&self, payload_id: PayloadId) -> String {
        format!("{}?start={}", self.base_url, payload_id)
    }
}

/// Parse the `/start` argument; `None` for anything but a plain decimal id
pub fn parse_start_payload(raw: &str) -> Option<PayloadId> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_for_bot() {
        let builder = DeepLinkBuilder::for_bot("@VideoRelayBot");
        assert_eq!(
            builder.link(PayloadId::new(4_000_053_548)),
            "https://t.me/VideoRelayBot?start=4000053548"
        );
    }

    #[test]
    fn test_custom_base_trims_slash() {
        let builder = DeepLinkBuilder::new("https://example.org/relay/");
        assert_eq!(builder.base_url(), "https://example.org/relay");
        assert_eq!(
            builder.link(PayloadId::new(1_000_000_000)),
            "https://example.org/relay?start=1000000000"
        );
    }

    #[test]
    fn test_parse_start_payload() {
        assert_eq!(parse_start_payload("1234567890"), Some(PayloadId::new(1_234_567_890)));
        assert_eq!(parse_start_payload(" 1234567890\n"), Some(PayloadId::new(1_234_567_890)));
        assert_eq!(parse_start_payload(""), None);
        assert_eq!(parse_start_payload("video_1234"), None);
        assert_eq!(parse_start_payload("-5"), None);
    }
}
