// SPDX-License-Identifier: MIT

//! Chat webhook wire shapes and boundary command dispatch.
//!
//! Incoming events are mapped to a closed [`Command`] enum exactly once at
//! the boundary; nothing downstream matches on message-kind strings.

use serde::Deserialize;

use crate::models::{Coordinate, ReportCategory};

/// Top-level webhook body: a batch of events.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<ChatEvent>,
}

/// One chat platform event.
#[derive(Debug, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Control triggers and artifact arrivals recognized by the bot.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    EnableTracking,
    DisableTracking,
    StartReport(ReportCategory),
    /// Free-text that is not a control command; becomes the notes artifact.
    Note(String),
    /// Image message; the payload is fetched by id from the content API.
    Photo { message_id: String },
    /// Location share; feeds both the alert engine and the report flow.
    Position(Coordinate),
}

impl ChatEvent {
    /// Sender's user id, when the platform provided one.
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.user_id.as_deref())
    }

    /// Map this event to a command, or `None` for event/message kinds the
    /// bot does not handle (stickers, follows, etc.).
    pub fn to_command(&self) -> Option<Command> {
        if self.event_type != "message" {
            return None;
        }
        let message = self.message.as_ref()?;

        match message.message_type.as_str() {
            "text" => {
                let text = message.text.as_deref().unwrap_or("").trim();
                if text.is_empty() {
                    return None;
                }
                Some(parse_text_command(text))
            }
            "image" => Some(Command::Photo {
                message_id: message.id.clone(),
            }),
            "location" => {
                let (lat, lng) = (message.latitude?, message.longitude?);
                Some(Command::Position(Coordinate::new(lat, lng)))
            }
            _ => None,
        }
    }
}

/// Recognize control keywords; anything else is note text.
fn parse_text_command(text: &str) -> Command {
    match text.to_lowercase().as_str() {
        "track me" | "start tracking" => Command::EnableTracking,
        "stop tracking" => Command::DisableTracking,
        "report wildlife" => Command::StartReport(ReportCategory::Wildlife),
        "report hazard" => Command::StartReport(ReportCategory::Hazard),
        _ => Command::Note(text.to_string()),
    }
}
