//! Acceptance filters applied to every fetched candidate.
//!
//! The chain is pure: given the same candidate, parameters and evaluation
//! time it always produces the same verdict. Predicates run in a fixed order
//! and stop at the first failure so the reported reason is deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::discovery::{CrawlCandidate, Visibility};

/// Thresholds a candidate must meet to be accepted.
///
/// A `None` bound disables its predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterParameters {
    /// Minimum number of stars (inclusive)
    pub min_stars: Option<u64>,

    /// Minimum number of forks (inclusive)
    pub min_forks: Option<u64>,

    /// Maximum whole days since last activity (inclusive)
    pub max_inactivity_days: Option<i64>,
}

/// Why a candidate was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotPublic,
    TooFewStars { stars: u64, min: u64 },
    TooFewForks { forks: u64, min: u64 },
    TooInactive { days: i64, max: i64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotPublic => write!(f, "visibility other than public"),
            RejectReason::TooFewStars { stars, min } => {
                write!(f, "too small number of stars ({} < {})", stars, min)
            }
            RejectReason::TooFewForks { forks, min } => {
                write!(f, "too small number of forks ({} < {})", forks, min)
            }
            RejectReason::TooInactive { days, max } => {
                write!(f, "too many days of inactivity ({} > {})", days, max)
            }
        }
    }
}

/// Outcome of running the chain over one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Whole days between `last_activity` and `now`, truncated toward zero.
pub fn inactivity_days(last_activity: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*now - *last_activity).num_days()
}

/// Run the visibility, stars, forks and recency predicates in that order.
pub fn evaluate(
    candidate: &CrawlCandidate,
    filters: &FilterParameters,
    now: DateTime<Utc>,
) -> Verdict {
    if candidate.visibility != Visibility::Public {
        return Verdict::Reject(RejectReason::NotPublic);
    }

    if let Some(min) = filters.min_stars {
        if candidate.star_count < min {
            return Verdict::Reject(RejectReason::TooFewStars {
                stars: candidate.star_count,
                min,
            });
        }
    }

    if let Some(min) = filters.min_forks {
        if candidate.forks_count < min {
            return Verdict::Reject(RejectReason::TooFewForks {
                forks: candidate.forks_count,
                min,
            });
        }
    }

    if let Some(max) = filters.max_inactivity_days {
        let days = inactivity_days(&candidate.last_activity_at, &now);
        if days > max {
            return Verdict::Reject(RejectReason::TooInactive { days, max });
        }
    }

    Verdict::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use quickcheck_macros::quickcheck;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn candidate() -> CrawlCandidate {
        CrawlCandidate {
            id: 42,
            web_url: "https://gitlab.com/group/project".to_string(),
            http_url_to_repo: "https://gitlab.com/group/project.git".to_string(),
            visibility: Visibility::Public,
            star_count: 10,
            forks_count: 4,
            last_activity_at: now() - Duration::days(3),
        }
    }

    #[test]
    fn test_no_bounds_accepts_public() {
        assert_eq!(
            evaluate(&candidate(), &FilterParameters::default(), now()),
            Verdict::Accept
        );
    }

    #[test]
    fn test_private_and_internal_rejected() {
        let filters = FilterParameters::default();

        let mut private = candidate();
        private.visibility = Visibility::Private;
        assert_eq!(
            evaluate(&private, &filters, now()),
            Verdict::Reject(RejectReason::NotPublic)
        );

        let mut internal = candidate();
        internal.visibility = Visibility::Internal;
        assert_eq!(
            evaluate(&internal, &filters, now()),
            Verdict::Reject(RejectReason::NotPublic)
        );
    }

    #[test]
    fn test_min_stars_boundary_is_inclusive() {
        let filters = FilterParameters {
            min_stars: Some(5),
            ..Default::default()
        };

        let mut c = candidate();
        c.star_count = 4;
        assert_eq!(
            evaluate(&c, &filters, now()),
            Verdict::Reject(RejectReason::TooFewStars { stars: 4, min: 5 })
        );

        c.star_count = 5;
        assert!(evaluate(&c, &filters, now()).is_accept());
    }

    #[test]
    fn test_min_forks_boundary_is_inclusive() {
        let filters = FilterParameters {
            min_forks: Some(2),
            ..Default::default()
        };

        let mut c = candidate();
        c.forks_count = 1;
        assert_eq!(
            evaluate(&c, &filters, now()),
            Verdict::Reject(RejectReason::TooFewForks { forks: 1, min: 2 })
        );

        c.forks_count = 2;
        assert!(evaluate(&c, &filters, now()).is_accept());
    }

    #[test]
    fn test_max_inactivity_boundary() {
        let filters = FilterParameters {
            max_inactivity_days: Some(30),
            ..Default::default()
        };

        let mut c = candidate();
        c.last_activity_at = now() - Duration::days(30);
        assert!(evaluate(&c, &filters, now()).is_accept());

        c.last_activity_at = now() - Duration::days(31);
        assert_eq!(
            evaluate(&c, &filters, now()),
            Verdict::Reject(RejectReason::TooInactive { days: 31, max: 30 })
        );
    }

    #[test]
    fn test_partial_days_truncate() {
        let last = now() - Duration::days(30) - Duration::hours(23);
        assert_eq!(inactivity_days(&last, &now()), 30);

        let filters = FilterParameters {
            max_inactivity_days: Some(30),
            ..Default::default()
        };
        let mut c = candidate();
        c.last_activity_at = last;
        assert!(evaluate(&c, &filters, now()).is_accept());
    }

    #[test]
    fn test_first_failing_predicate_is_reported() {
        // Fails every predicate, only visibility is reported
        let filters = FilterParameters {
            min_stars: Some(100),
            min_forks: Some(100),
            max_inactivity_days: Some(0),
        };
        let mut c = candidate();
        c.visibility = Visibility::Private;
        assert_eq!(
            evaluate(&c, &filters, now()),
            Verdict::Reject(RejectReason::NotPublic)
        );

        // Public but short on stars and forks: stars wins
        c.visibility = Visibility::Public;
        assert_eq!(
            evaluate(&c, &filters, now()),
            Verdict::Reject(RejectReason::TooFewStars { stars: 10, min: 100 })
        );
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(
            RejectReason::NotPublic.to_string(),
            "visibility other than public"
        );
        assert_eq!(
            RejectReason::TooInactive { days: 40, max: 30 }.to_string(),
            "too many days of inactivity (40 > 30)"
        );
    }

    #[quickcheck]
    fn prop_non_public_always_rejected(
        internal: bool,
        stars: u64,
        forks: u64,
        days_ago: u16,
        min_stars: Option<u64>,
        min_forks: Option<u64>,
    ) -> bool {
        let mut c = candidate();
        c.visibility = if internal {
            Visibility::Internal
        } else {
            Visibility::Private
        };
        c.star_count = stars;
        c.forks_count = forks;
        c.last_activity_at = now() - Duration::days(days_ago as i64);

        let filters = FilterParameters {
            min_stars,
            min_forks,
            max_inactivity_days: None,
        };

        evaluate(&c, &filters, now()) == Verdict::Reject(RejectReason::NotPublic)
    }
}
