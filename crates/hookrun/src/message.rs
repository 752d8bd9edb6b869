use std::time::Duration;

use serde::Serialize;

use crate::config::Settings;
use crate::exec::{Invocation, Outcome};

pub const COLOR_GOOD: &str = "good";
pub const COLOR_DANGER: &str = "danger";

/// Incoming-webhook message body.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fallback: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub short: bool,
}

impl Attachment {
    pub fn add_field(&mut self, title: &str, value: impl Into<String>) {
        self.fields.push(Field {
            title: title.to_string(),
            value: value.into(),
            short: true,
        });
    }
}

/// Assemble the notification for one finished run.
pub fn build(settings: &Settings, invocation: &Invocation, outcome: &Outcome) -> Message {
    let mut attachment = Attachment {
        fallback: format!("{} results", invocation.exe),
        color: COLOR_GOOD.to_string(),
        pretext: format!("`{}`", invocation.pretty()),
        mrkdwn_in: vec!["pretext".to_string(), "text".to_string()],
        ..Default::default()
    };

    if let Some(failure) = &outcome.failure {
        attachment.color = COLOR_DANGER.to_string();
        attachment.add_field("Error", failure.to_string());
    }

    if !outcome.output.is_empty() {
        attachment.text = format!("```\n{}```", String::from_utf8_lossy(&outcome.output));
    }

    if settings.timing {
        attachment.add_field("Timing", format_duration(outcome.elapsed));
    }

    Message {
        username: settings.username.clone(),
        channel: settings.channel.clone(),
        icon_emoji: settings.emoji.clone(),
        icon_url: settings.icon.clone(),
        attachments: vec![attachment],
        ..Default::default()
    }
}

/// Short human form: `850µs`, `12.5ms`, `1.234s`, `2m3.5s`, `1h0m12s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", d.as_micros());
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", trim_fraction(d.as_micros(), 1_000, 3));
    }

    let millis = d.as_millis();
    let hours = millis / 3_600_000;
    let minutes = millis / 60_000 % 60;
    let secs = trim_fraction(millis % 60_000, 1_000, 3);
    match (hours, minutes) {
        (0, 0) => format!("{secs}s"),
        (0, m) => format!("{m}m{secs}s"),
        (h, m) => format!("{h}h{m}m{secs}s"),
    }
}

/// `value / unit` as a decimal with trailing zeros dropped.
fn trim_fraction(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0digits$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
