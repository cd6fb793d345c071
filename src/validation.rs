use crate::constants::*;
use crate::error::AppError;
use log::info;

/// Clamp a countdown length into `[MIN_COUNTDOWN_SECS, MAX_COUNTDOWN_SECS]`.
///
/// Out-of-range values are not an error; the nearest bound is used instead.
pub fn clamp_countdown_seconds(seconds: u32) -> u32 {
    let clamped = seconds.clamp(MIN_COUNTDOWN_SECS, MAX_COUNTDOWN_SECS);
    if clamped != seconds {
        info!("Countdown of {seconds}s out of range, using {clamped}s");
    }
    clamped
}

/// Clamp a repeat delay into `[0, MAX_REPEAT_DELAY_MINUTES]`.
pub fn clamp_repeat_delay_minutes(minutes: u32) -> u32 {
    let clamped = minutes.min(MAX_REPEAT_DELAY_MINUTES);
    if clamped != minutes {
        info!("Repeat delay of {minutes}min out of range, using {clamped}min");
    }
    clamped
}

/// Validate the intervention message. Returns the trimmed text.
pub fn validate_message(message: &str) -> Result<&str, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidInput {
            field: "message",
            reason: "cannot be empty".into(),
        });
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(AppError::InvalidInput {
            field: "message",
            reason: format!("cannot exceed {MAX_MESSAGE_LEN} characters"),
        });
    }
    Ok(message)
}

/// Validate an application identifier. Returns the trimmed identifier.
pub fn validate_app_id(app_id: &str) -> Result<&str, AppError> {
    let app_id = app_id.trim();
    if app_id.is_empty() {
        return Err(AppError::InvalidInput {
            field: "app_id",
            reason: "cannot be empty".into(),
        });
    }
    if app_id.len() > MAX_APP_ID_LEN {
        return Err(AppError::InvalidInput {
            field: "app_id",
            reason: format!("cannot exceed {MAX_APP_ID_LEN} characters"),
        });
    }
    if app_id.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidInput {
            field: "app_id",
            reason: "cannot contain whitespace".into(),
        });
    }
    Ok(app_id)
}
