//! Tagged JSON telemetry events (§4.3, §6, design note "Dynamic JSON events
//! → tagged events").
//!
//! The inbound JSON protocol carries an open-ended `type` discriminator
//! with free-form fields. We recognise a closed set of variants and fall
//! back to [`SessionEvent::Passthrough`] for anything else, which keeps
//! the raw payload only for telemetry.

use serde::Deserialize;
use serde_json::Value;

use crate::format::RawAudioFormat;

/// One participant record as carried in a `UsersUpdate` event.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "isCurrentUser", default)]
    pub is_current_user: Option<bool>,
}

/// A recognised JSON telemetry event, decoded from the raw `type` field.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SessionStarted {
        meeting_url: Option<String>,
        bot_name: Option<String>,
    },
    AudioFormatUpdate {
        format: RawAudioFormat,
    },
    UsersUpdate {
        new_users: Vec<UserRecord>,
        updated_users: Vec<UserRecord>,
    },
    MeetingStatusChange {
        change: String,
    },
    /// Anything else: logged to telemetry only.
    Passthrough,
}

#[derive(Debug, Deserialize)]
struct SessionStartedPayload {
    #[serde(rename = "meetingUrl", default)]
    meeting_url: Option<String>,
    #[serde(rename = "botName", default)]
    bot_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudioFormatUpdatePayload {
    format: RawAudioFormat,
}

#[derive(Debug, Default, Deserialize)]
struct UsersUpdatePayload {
    #[serde(rename = "newUsers", default)]
    new_users: Vec<Value>,
    #[serde(rename = "updatedUsers", default)]
    updated_users: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MeetingStatusChangePayload {
    change: String,
}

/// Parses the `type`-tagged envelope into a [`SessionEvent`].
///
/// Unrecognised `type` values, or a missing/non-string `type`, yield
/// [`SessionEvent::Passthrough`]. A recognised `type` whose body fails to
/// parse into its expected shape also falls back to `Passthrough` rather
/// than erroring the session.
pub fn parse_event(raw: &Value) -> SessionEvent {
    let Some(type_str) = raw.get("type").and_then(Value::as_str) else {
        return SessionEvent::Passthrough;
    };

    match type_str {
        "SessionStarted" => match serde_json::from_value::<SessionStartedPayload>(raw.clone()) {
            Ok(p) => SessionEvent::SessionStarted {
                meeting_url: p.meeting_url,
                bot_name: p.bot_name,
            },
            Err(_) => SessionEvent::Passthrough,
        },
        "AudioFormatUpdate" => match serde_json::from_value::<AudioFormatUpdatePayload>(raw.clone()) {
            Ok(p) => SessionEvent::AudioFormatUpdate { format: p.format },
            Err(_) => SessionEvent::Passthrough,
        },
        "UsersUpdate" => {
            let payload: UsersUpdatePayload =
                serde_json::from_value(raw.clone()).unwrap_or_default();
            let new_users = filter_user_records(payload.new_users);
            let updated_users = filter_user_records(payload.updated_users);
            SessionEvent::UsersUpdate {
                new_users,
                updated_users,
            }
        }
        "MeetingStatusChange" => {
            match serde_json::from_value::<MeetingStatusChangePayload>(raw.clone()) {
                Ok(p) => SessionEvent::MeetingStatusChange { change: p.change },
                Err(_) => SessionEvent::Passthrough,
            }
        }
        _ => SessionEvent::Passthrough,
    }
}

/// Keeps only elements that are objects with a string `deviceId`, as
/// required by §4.3's `UsersUpdate` handling.
fn filter_user_records(values: Vec<Value>) -> Vec<UserRecord> {
    values
        .into_iter()
        .filter(|v| v.get("deviceId").and_then(Value::as_str).is_some())
        .filter_map(|v| serde_json::from_value::<UserRecord>(v).ok())
        .collect()
}

/// Extracts a top-level string `meetingUrl`, applied to every event
/// (recognised or not) per §4.3: "if `meetingUrl` is still unknown and
/// the event has a string `meetingUrl`, adopt it."
#[must_use]
pub fn extract_meeting_url(raw: &Value) -> Option<String> {
    raw.get("meetingUrl")
        .and_then(Value::as_str)
        .map(str::to_string)
}
