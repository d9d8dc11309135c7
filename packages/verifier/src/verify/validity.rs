//! Validity period limits for publicly trusted leaves

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Utc};

use crate::cert::CertificateInfo;

/// 2012-07-01, Baseline Requirements effective date
const BASELINE_EFFECTIVE_UNIX: u64 = 1_341_100_800;
/// 2015-04-01, 60-month ceiling expires
const SIXTY_MONTH_CUTOFF_UNIX: u64 = 1_427_846_400;
/// 2016-01-01, SHA-1 leaves issued after this are weak
pub(crate) const SHA1_LEAF_CUTOFF_UNIX: u64 = 1_451_606_400;

/// True if the leaf's validity period exceeds the ceiling in force when it
/// was issued, or if it ends before it starts
#[must_use]
pub fn has_too_long_validity(info: &CertificateInfo) -> bool {
    if info.not_after < info.not_before {
        return true;
    }

    let (Some(start), Some(end)) = (utc(info.not_before), utc(info.not_after)) else {
        return true;
    };

    let months = months_between(&start, &end);
    let limit = if info.not_before < at(BASELINE_EFFECTIVE_UNIX) {
        120
    } else if info.not_before < at(SIXTY_MONTH_CUTOFF_UNIX) {
        60
    } else {
        39
    };
    months > limit
}

/// True if a SHA-1 leaf was issued on or after the SHA-1 sunset date
#[must_use]
pub fn is_late_sha1_issuance(info: &CertificateInfo) -> bool {
    info.not_before >= at(SHA1_LEAF_CUTOFF_UNIX)
}

/// Whole months from `start` to `end`, counting a partial month as one
fn months_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(end.month()) - i64::from(start.month());
    if end.day() > start.day() {
        months += 1;
    }
    months
}

fn utc(time: SystemTime) -> Option<DateTime<Utc>> {
    let secs = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok()?,
        Err(before) => -i64::try_from(before.duration().as_secs()).ok()?,
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
}

fn at(unix: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn partial_month_counts() {
        let start = Utc.with_ymd_and_hms(2016, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2019, 4, 15, 0, 0, 0).unwrap();
        assert_eq!(months_between(&start, &end), 39);
        let end = Utc.with_ymd_and_hms(2019, 4, 16, 0, 0, 0).unwrap();
        assert_eq!(months_between(&start, &end), 40);
    }
}
