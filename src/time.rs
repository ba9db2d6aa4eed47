use hifitime::Epoch;
use std::str::FromStr;

use crate::{
    constants::{UnixSeconds, SECONDS_PER_DAY},
    spinmodel_errors::SpinModelError,
};

/// Transformation from Unix seconds to a hifitime [`Epoch`]
///
/// Argument
/// --------
/// * `t`: seconds since 1970-01-01T00:00:00 UTC
///
/// Return
/// ------
/// * the corresponding epoch
pub fn unix_to_epoch(t: UnixSeconds) -> Epoch {
    Epoch::from_unix_seconds(t)
}

/// Transformation from a hifitime [`Epoch`] to Unix seconds
pub fn epoch_to_unix(epoch: &Epoch) -> UnixSeconds {
    epoch.to_unix_seconds()
}

/// Transformation from a date in the format YYYY-MM-ddTHH:mm:ss (UTC) to Unix seconds
///
/// Argument
/// --------
/// * `date`: an ISO-8601 date, optionally followed by a time scale
///
/// Return
/// ------
/// * the Unix time of the date, or [`SpinModelError::InvalidTime`] if it cannot be parsed
pub fn iso_to_unix(date: &str) -> Result<UnixSeconds, SpinModelError> {
    Epoch::from_str(date)
        .map(|epoch| epoch.to_unix_seconds())
        .map_err(|e| SpinModelError::InvalidTime(format!("{date}: {e}")))
}

/// Human readable UTC representation of a Unix time, used in log messages.
pub fn format_unix(t: UnixSeconds) -> String {
    format!("{}", unix_to_epoch(t))
}

/// Index of the UTC day containing `t` (day 0 starts at the Unix epoch).
///
/// Unix time has no leap seconds, so every day spans exactly [`SECONDS_PER_DAY`].
pub fn utc_day_index(t: UnixSeconds) -> i64 {
    (t / SECONDS_PER_DAY).floor() as i64
}

/// Does the half-open interval `(start, end]` contain a UTC midnight?
pub fn crosses_utc_midnight(start: UnixSeconds, end: UnixSeconds) -> bool {
    utc_day_index(end) > utc_day_index(start)
}
