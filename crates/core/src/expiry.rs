//! Expiration-state classification for compliance documents.
//!
//! Classification works on calendar days normalized to UTC: instants are
//! converted to their UTC date before the difference is taken, so the result
//! does not depend on the caller's local offset or on DST transitions.
//!
//! Only the three [`DocumentState`] values are persisted. [`ExpiryTier`] adds
//! an `urgente` band for display and is always derived at read time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::CalendarDate;

/// Alert window applied when neither the document nor its type sets one.
pub const DEFAULT_ALERT_WINDOW_DAYS: i32 = 30;

/// Documents this close to expiry are shown as urgent.
pub const URGENT_WINDOW_DAYS: i64 = 7;

pub const STATE_VIGENTE: &str = "vigente";
pub const STATE_POR_VENCER: &str = "por_vencer";
pub const STATE_VENCIDO: &str = "vencido";

/// Persisted lifecycle state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Current: expiry lies beyond the alert window.
    Vigente,
    /// Expiring soon: expiry lies within the alert window.
    PorVencer,
    /// Expired, including documents that expire today.
    Vencido,
}

impl DocumentState {
    pub const ALL: [DocumentState; 3] = [Self::Vigente, Self::PorVencer, Self::Vencido];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vigente => STATE_VIGENTE,
            Self::PorVencer => STATE_POR_VENCER,
            Self::Vencido => STATE_VENCIDO,
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATE_VIGENTE => Ok(Self::Vigente),
            STATE_POR_VENCER => Ok(Self::PorVencer),
            STATE_VENCIDO => Ok(Self::Vencido),
            other => Err(CoreError::validation(
                "state",
                format!("Invalid state '{other}'. Must be one of: vigente, por_vencer, vencido"),
            )),
        }
    }
}

/// Display tier. Splits `por_vencer` into a further `urgente` band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryTier {
    Vigente,
    PorVencer,
    Urgente,
    Vencido,
}

/// Whole calendar days from `today` until `expiry_date`. Negative once expired.
pub fn days_remaining(expiry_date: CalendarDate, today: CalendarDate) -> i64 {
    (expiry_date - today).num_days()
}

/// The UTC calendar date of an instant expressed in any time zone.
pub fn utc_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> CalendarDate {
    instant.with_timezone(&Utc).date_naive()
}

/// Classify a document given its expiry date, alert window and today's UTC date.
///
/// A negative window is treated as zero.
pub fn classify(
    expiry_date: CalendarDate,
    alert_window_days: i32,
    today: CalendarDate,
) -> DocumentState {
    let remaining = days_remaining(expiry_date, today);
    if remaining <= 0 {
        DocumentState::Vencido
    } else if remaining <= i64::from(alert_window_days.max(0)) {
        DocumentState::PorVencer
    } else {
        DocumentState::Vigente
    }
}

/// Classify against an instant in any zone, normalizing it to its UTC date first.
pub fn classify_at<Tz: TimeZone>(
    expiry_date: CalendarDate,
    alert_window_days: i32,
    now: &DateTime<Tz>,
) -> DocumentState {
    classify(expiry_date, alert_window_days, utc_date(now))
}

/// Derive the display tier. Never persisted.
pub fn tier(expiry_date: CalendarDate, alert_window_days: i32, today: CalendarDate) -> ExpiryTier {
    match classify(expiry_date, alert_window_days, today) {
        DocumentState::Vencido => ExpiryTier::Vencido,
        DocumentState::Vigente => ExpiryTier::Vigente,
        DocumentState::PorVencer => {
            if days_remaining(expiry_date, today) <= URGENT_WINDOW_DAYS {
                ExpiryTier::Urgente
            } else {
                ExpiryTier::PorVencer
            }
        }
    }
}
