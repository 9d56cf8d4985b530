//! Webhook message construction.
//!
//! Builds a Discord-compatible execute-webhook body: one embed per
//! record, with the descriptive fields laid out as embed fields.

use beacon_core::Record;
use beacon_core::record::UNKNOWN;
use beacon_core::value::format_value;
use serde::Serialize;

/// Embed accent colour (Discord blurple).
pub const EMBED_COLOR: u32 = 0x0058_65F2;

/// Embed title for a found server.
pub const EMBED_TITLE: &str = "🔔 Brainrot Found!";

/// Top-level webhook body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    /// Author name shown for the message.
    pub username: String,
    /// Rich embeds; always exactly one.
    pub embeds: Vec<Embed>,
}

/// A single rich embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    /// Embed title.
    pub title: String,
    /// Accent colour as an RGB integer.
    pub color: u32,
    /// Field list, rendered in order.
    pub fields: Vec<EmbedField>,
    /// RFC 3339 timestamp shown in the footer.
    pub timestamp: String,
}

/// One name/value row in an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field body (Markdown).
    pub value: String,
    /// Whether the field may share a row with its neighbours.
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_owned(),
            value: value.into(),
            inline,
        }
    }
}

/// Build the webhook body announcing `record`.
pub fn build_message(record: &Record, username: &str) -> WebhookMessage {
    let value = if record.value_formatted.is_empty() {
        format_value(record.value)
    } else {
        record.value_formatted.clone()
    };

    let mut fields = vec![
        EmbedField::new("🐾 Brainrot", or_unknown(&record.display_name), false),
        EmbedField::new("💰 Value", value, true),
        EmbedField::new("✨ Mutation", or_unknown(&record.mutation), true),
        EmbedField::new("🎯 Rarity", or_unknown(&record.rarity), true),
        EmbedField::new("👥 Players", record.players.clone(), true),
        EmbedField::new("🆔 Job ID", format!("```{}```", or_unknown(&record.job_id)), false),
    ];

    fields.push(match &record.teleport_script {
        Some(script) => EmbedField::new("🚀 Teleport Script", format!("```lua\n{script}\n```"), false),
        None => EmbedField::new(
            "📍 Place ID",
            record
                .place_id
                .map_or_else(|| UNKNOWN.to_owned(), |id| id.to_string()),
            true,
        ),
    });

    WebhookMessage {
        username: username.to_owned(),
        embeds: vec![Embed {
            title: EMBED_TITLE.to_owned(),
            color: EMBED_COLOR,
            fields,
            timestamp: record.inserted_at.to_rfc3339(),
        }],
    }
}

fn or_unknown(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN.to_owned()
    } else {
        value.to_owned()
    }
}
