//! Reminder dialog: validation, due-date composition, and the display text
//! inserted into the note as a reminder marker.

#[cfg(test)]
#[path = "reminder_test.rs"]
mod tests;

use canvas::markers::reminder_markup;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, PrimitiveDateTime, Time, UtcOffset};
use tracing::{info, warn};

use crate::api::{ApiError, NewReminder, Reminder, ReminderStore};

/// Time of day preselected in the dialog.
pub const DEFAULT_TIME: Time = time!(9:00);

/// Errors shown inline in the reminder dialog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReminderError {
    #[error("reminder message is empty")]
    EmptyMessage,

    #[error("reminder date is missing")]
    MissingDate,

    #[error("invalid reminder date or time: {0}")]
    InvalidDateTime(String),

    #[error("reminder create failed: {0}")]
    Request(ApiError),
}

impl ReminderError {
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::EmptyMessage => "Please enter a reminder message".to_string(),
            Self::MissingDate => "Please select a date".to_string(),
            Self::InvalidDateTime(_) => "Please pick a valid date and time".to_string(),
            Self::Request(e) => e.server_message().unwrap_or_else(|| "Failed to save reminder".to_string()),
        }
    }
}

/// The dialog's form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub message: String,
    pub date: Option<Date>,
    pub time: Time,
    pub early_reminder_minutes: u32,
}

impl ReminderDraft {
    #[must_use]
    pub fn new(message: impl Into<String>, date: Option<Date>) -> Self {
        Self { message: message.into(), date, time: DEFAULT_TIME, early_reminder_minutes: 0 }
    }

    /// Build a draft from the form's `YYYY-MM-DD` and `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::InvalidDateTime`] when either field does not parse.
    pub fn from_form(message: &str, date: &str, time: &str, early_reminder_minutes: u32) -> Result<Self, ReminderError> {
        let date = if date.trim().is_empty() {
            None
        } else {
            let fmt = format_description!("[year]-[month]-[day]");
            Some(Date::parse(date.trim(), &fmt).map_err(|e| ReminderError::InvalidDateTime(e.to_string()))?)
        };
        let time = if time.trim().is_empty() {
            DEFAULT_TIME
        } else {
            let fmt = format_description!("[hour]:[minute]");
            Time::parse(time.trim(), &fmt).map_err(|e| ReminderError::InvalidDateTime(e.to_string()))?
        };
        Ok(Self { message: message.to_string(), date, time, early_reminder_minutes })
    }

    fn validated(&self) -> Result<(String, Date), ReminderError> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ReminderError::EmptyMessage);
        }
        let date = self.date.ok_or(ReminderError::MissingDate)?;
        Ok((message.to_string(), date))
    }
}

/// A created reminder and the text to insert for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedReminder {
    pub reminder: Reminder,
    pub display_text: String,
    /// Marker span plus a trailing space, ready for insertion.
    pub insert: String,
}

/// Due date as an RFC 3339 UTC timestamp, reading `date`/`time` in `offset`.
///
/// # Errors
///
/// Returns [`ReminderError::InvalidDateTime`] if the instant cannot be formatted.
pub fn due_date_utc(date: Date, time: Time, offset: UtcOffset) -> Result<String, ReminderError> {
    PrimitiveDateTime::new(date, time)
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| ReminderError::InvalidDateTime(e.to_string()))
}

/// `🔔 Sat, Oct 17 at 9:00 AM: "message"` with an early-reminder suffix.
#[must_use]
pub fn display_text(date: Date, time: Time, message: &str, early_reminder_minutes: u32) -> String {
    let date_fmt = format_description!("[weekday repr:short], [month repr:short] [day]");
    let time_fmt = format_description!("[hour repr:12 padding:none]:[minute] [period]");
    let day = date.format(&date_fmt).unwrap_or_else(|_| date.to_string());
    let clock = time.format(&time_fmt).unwrap_or_else(|_| time.to_string());
    format!("🔔 {day} at {clock}: \"{message}\"{}", early_suffix(early_reminder_minutes))
}

fn early_suffix(minutes: u32) -> String {
    match minutes {
        0 => String::new(),
        1440.. => " (1 day early reminder)".to_string(),
        60.. => format!(" ({}h early reminder)", f64::from(minutes) / 60.0),
        m => format!(" ({m}min early reminder)"),
    }
}

/// Validate `draft`, create the reminder, and build its marker text.
///
/// # Errors
///
/// Returns a validation error before any request is made, or
/// [`ReminderError::Request`] when the store rejects the reminder.
pub async fn create_reminder(
    store: &dyn ReminderStore,
    note_id: &str,
    block_id: Option<&str>,
    draft: &ReminderDraft,
    offset: UtcOffset,
) -> Result<CreatedReminder, ReminderError> {
    let (message, date) = draft.validated()?;
    let request = NewReminder {
        note_id: note_id.to_string(),
        block_id: block_id.map(str::to_string),
        message: message.clone(),
        due_date: due_date_utc(date, draft.time, offset)?,
        early_reminder_minutes: draft.early_reminder_minutes,
    };

    let reminder = store.create_reminder(&request).await.map_err(|e| {
        warn!(note_id = %note_id, error = %e, "reminder create failed");
        ReminderError::Request(e)
    })?;
    info!(note_id = %note_id, reminder_id = %reminder.id, "reminder created");

    let display_text = display_text(date, draft.time, &message, draft.early_reminder_minutes);
    let insert = format!("{} ", reminder_markup(&reminder.id, &display_text));
    Ok(CreatedReminder { reminder, display_text, insert })
}
