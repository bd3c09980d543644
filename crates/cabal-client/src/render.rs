//! Presentation of a channel's message buffer.
//!
//! [`render_messages`] is pure: it turns a message list into view items a
//! UI can draw directly, grouping consecutive messages by the same author
//! and enriching message bodies (markdown subset plus `:emoji:` shortcodes).

use chrono::{DateTime, TimeZone};
use comrak::{markdown_to_html, Options};
use serde::Serialize;

use cabal_shared::constants::{DEFAULT_USERNAME, SYSTEM_USERNAME};

use crate::models::{Message, MessageType};

pub const STARTER_MESSAGE: &str = "This is a new channel. Send a message to start things off!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    System,
    Text,
    Emote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLabel {
    /// e.g. `3:07 PM`
    pub time: String,
    /// e.g. `October 19, 2026`
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    /// Position in the buffer; stable for a given buffer.
    pub index: usize,
    pub variant: Variant,
    /// Name shown for the avatar, `None` when the avatar is hidden.
    pub avatar: Option<String>,
    /// Header line (name and time), `None` when the header is hidden.
    pub header: Option<Header>,
    /// Sanitized HTML body.
    pub html: String,
    /// Continuation of the previous author's messages.
    pub indent: bool,
    /// Written under the viewer's current username.
    pub is_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub name: String,
    pub time: Option<TimeLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum MessagesView {
    /// The channel has no messages yet.
    Starter(String),
    List(Vec<RenderedMessage>),
}

/// Render `messages` for a viewer called `username`, with times shown in
/// `tz`.
pub fn render_messages<Tz>(messages: &[Message], username: &str, tz: &Tz) -> MessagesView
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if messages.is_empty() {
        return MessagesView::Starter(STARTER_MESSAGE.to_string());
    }

    let mut rendered = Vec::with_capacity(messages.len());
    let mut last_author: Option<Option<&str>> = None;

    for (index, message) in messages.iter().enumerate() {
        let author = message.author.as_deref();
        let repeated = last_author == Some(author);
        let is_me = author == Some(username);
        last_author = Some(author);

        let time = message.time.and_then(|ms| format_timestamp(ms, tz));
        let html = enrich_text(&message.content);

        let item = match message.kind {
            MessageType::LocalSystem => {
                let name = author.unwrap_or(SYSTEM_USERNAME).to_string();
                RenderedMessage {
                    index,
                    variant: Variant::System,
                    avatar: Some(name.clone()),
                    header: Some(Header { name, time }),
                    html,
                    indent: false,
                    is_me,
                }
            }
            MessageType::Text | MessageType::Emote => {
                let variant = if message.kind == MessageType::Text {
                    Variant::Text
                } else {
                    Variant::Emote
                };
                let name = author.unwrap_or(DEFAULT_USERNAME).to_string();
                RenderedMessage {
                    index,
                    variant,
                    avatar: (!repeated).then(|| name.clone()),
                    header: (!repeated).then(|| Header { name, time }),
                    html,
                    indent: repeated,
                    is_me,
                }
            }
            MessageType::Other(_) => continue,
        };
        rendered.push(item);
    }

    MessagesView::List(rendered)
}

fn comrak_options() -> Options<'static> {
    let mut opts = Options::default();
    opts.extension.strikethrough = true;
    opts.extension.autolink = true;
    opts.extension.shortcodes = true;
    opts
}

/// Markdown subset to HTML, with `:shortcode:` emoji expanded.
///
/// Raw HTML in the input is never passed through.
pub fn enrich_text(content: &str) -> String {
    markdown_to_html(content, &comrak_options())
}

/// Format a millisecond timestamp as a time and a long date in `tz`.
pub fn format_timestamp<Tz>(millis: i64, tz: &Tz) -> Option<TimeLabel>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp_millis(millis)?;
    let local = utc.with_timezone(tz);
    Some(TimeLabel {
        time: local.format("%-I:%M %p").to_string(),
        date: local.format("%B %-d, %Y").to_string(),
    })
}
