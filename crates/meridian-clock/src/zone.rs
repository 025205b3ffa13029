//! Regional time conversion with a fixed-offset fallback

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

/// Japan Standard Time offset from UTC, in seconds
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Ordered timezone fallback chain
///
/// Candidates are looked up in the bundled IANA database in order; the
/// final fixed offset guarantees a regional reading is always produced,
/// even if no candidate resolves.
#[derive(Clone, Debug)]
pub struct RegionalZone {
    /// IANA identifiers tried in order
    pub candidates: Vec<String>,
    /// Applied when no candidate resolves
    pub fallback: FixedOffset,
}

impl RegionalZone {
    /// Japan Standard Time (UTC+9), the default regional reading
    pub fn jst() -> Self {
        RegionalZone {
            candidates: vec!["Japan".to_string(), "Asia/Tokyo".to_string()],
            fallback: FixedOffset::east_opt(JST_OFFSET_SECS).unwrap(),
        }
    }

    /// Convert a UTC instant to the regional zone
    pub fn convert(&self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        for name in &self.candidates {
            if let Ok(tz) = name.parse::<Tz>() {
                return utc.with_timezone(&tz).fixed_offset();
            }
        }
        utc.with_timezone(&self.fallback)
    }
}

impl Default for RegionalZone {
    fn default() -> Self {
        Self::jst()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_jst_is_nine_hours_ahead() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let regional = RegionalZone::jst().convert(utc);

        assert_eq!(regional.offset().local_minus_utc(), JST_OFFSET_SECS);
        assert_eq!(format!("{}", regional.format("%H:%M")), "12:00");
    }

    #[test]
    fn test_unknown_candidates_fall_back_to_fixed_offset() {
        let zone = RegionalZone {
            candidates: vec!["Tokyo Standard Time".to_string(), "Not/AZone".to_string()],
            fallback: FixedOffset::east_opt(JST_OFFSET_SECS).unwrap(),
        };

        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let regional = zone.convert(utc);

        assert_eq!(regional.offset().local_minus_utc(), JST_OFFSET_SECS);
    }

    #[test]
    fn test_chain_stops_at_first_resolvable_candidate() {
        let zone = RegionalZone {
            candidates: vec!["Not/AZone".to_string(), "Asia/Tokyo".to_string()],
            // A wrong fallback that must never be reached
            fallback: FixedOffset::east_opt(0).unwrap(),
        };

        let utc = Utc.with_ymd_and_hms(2024, 6, 15, 3, 0, 0).unwrap();
        assert_eq!(zone.convert(utc).offset().local_minus_utc(), JST_OFFSET_SECS);
    }

    proptest! {
        // The fixed-offset fallback is a hard guarantee: a reading comes
        // out no matter what the candidate list holds
        #[test]
        fn prop_conversion_never_fails(
            candidates in prop::collection::vec("[a-z]{1,12}(/[a-z]{1,12})?", 0..6),
            secs in 0i64..4_000_000_000,
        ) {
            let zone = RegionalZone {
                candidates,
                fallback: FixedOffset::east_opt(JST_OFFSET_SECS).unwrap(),
            };

            let utc = DateTime::from_timestamp(secs, 0).unwrap();
            let regional = zone.convert(utc);
            prop_assert_eq!(regional.timestamp(), utc.timestamp());
        }
    }
}
