//! The authoritative transition table, its guards, and side effects.

use chrono::{DateTime, Utc};
use log::info;

use crate::calendar::Calendar;
use crate::error::TransitionError;
use crate::monitoring::{Monitoring, MonitoringStatus, Publishable};
use crate::time::Period;

use crate::monitoring::MonitoringStatus::{
    Active, Addressed, Cancelled, Closed, Completed, Declined, Draft, Stopped,
};

/// Every legal (from, to) pair. Anything else is rejected.
const LEGAL: &[(MonitoringStatus, MonitoringStatus)] = &[
    (Draft, Active),
    (Draft, Cancelled),
    (Active, Addressed),
    (Active, Declined),
    (Active, Stopped),
    (Addressed, Stopped),
    (Declined, Stopped),
    (Addressed, Completed),
    (Declined, Closed),
    (Stopped, Active),
];

/// Returns true if the pair appears in the transition table.
#[must_use]
pub fn is_legal(from: MonitoringStatus, to: MonitoringStatus) -> bool {
    LEGAL.contains(&(from, to))
}

/// The full legal pair list, for exhaustive tests.
#[must_use]
pub const fn legal_transitions() -> &'static [(MonitoringStatus, MonitoringStatus)] {
    LEGAL
}

/// Durations feeding derived periods, in business days.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleDurations {
    /// Length of the monitoring period stamped on activation.
    pub monitoring_days: i64,
    /// Elimination window when violations were found.
    pub elimination_addressed_days: i64,
    /// Shorter window when no violations were found.
    pub elimination_declined_days: i64,
    /// Optional sandbox time-compression divisor.
    pub accelerator: Option<u32>,
}

impl Default for LifecycleDurations {
    fn default() -> Self {
        Self {
            monitoring_days: 15,
            elimination_addressed_days: 10,
            elimination_declined_days: 3,
            accelerator: None,
        }
    }
}

/// Everything a transition needs besides the candidate itself.
pub struct TransitionContext<'a> {
    /// The instant the operation observes.
    pub now: DateTime<Utc>,
    /// Business-calendar collaborator.
    pub calendar: &'a dyn Calendar,
    /// Configured durations.
    pub durations: LifecycleDurations,
}

impl TransitionContext<'_> {
    fn period_from_now(&self, days: i64) -> Period {
        let end = self
            .calendar
            .add_business_period(self.now, days, self.durations.accelerator);
        Period {
            start_date: self.now,
            end_date: end,
        }
    }
}

fn guard_err(
    from: MonitoringStatus,
    to: MonitoringStatus,
    requirement: &str,
) -> TransitionError {
    TransitionError::GuardNotMet {
        from,
        to,
        requirement: requirement.to_string(),
    }
}

/// Validates the requested status change against the table and, on
/// success, applies its side effects to `candidate` (including the status
/// itself).
///
/// The candidate must already carry the incoming field patch; guards see
/// exactly the state that would be stored.
///
/// # Errors
///
/// [`TransitionError::Illegal`] for a pair outside the table,
/// [`TransitionError::GuardNotMet`] when the pair's precondition fails.
/// The candidate is left untouched on error.
pub fn apply_transition(
    candidate: &mut Monitoring,
    to: MonitoringStatus,
    ctx: &TransitionContext<'_>,
) -> Result<(), TransitionError> {
    let from = candidate.status;

    if !is_legal(from, to) {
        return Err(TransitionError::Illegal { from, to });
    }

    match (from, to) {
        (Draft, Active) => {
            let decision = candidate
                .decision
                .as_ref()
                .ok_or_else(|| guard_err(from, to, "a decision must be present"))?;
            if decision.description.trim().is_empty() {
                return Err(guard_err(from, to, "the decision needs a description"));
            }

            candidate.monitoring_period =
                Some(ctx.period_from_now(ctx.durations.monitoring_days));
            if let Some(decision) = candidate.decision.as_mut() {
                decision.publish(ctx.now);
            }
        }

        (Draft, Cancelled) => {
            if candidate.cancellation.is_none() {
                return Err(guard_err(from, to, "a cancellation must be present"));
            }
            if let Some(cancellation) = candidate.cancellation.as_mut() {
                cancellation.publish(ctx.now);
            }
        }

        (Active, Addressed) => {
            let conclusion = candidate
                .conclusion
                .as_ref()
                .ok_or_else(|| guard_err(from, to, "a conclusion must be present"))?;
            if !conclusion.violation_occurred {
                return Err(guard_err(
                    from,
                    to,
                    "the conclusion must record a violation",
                ));
            }
            if conclusion.violation_types.is_empty() {
                return Err(guard_err(
                    from,
                    to,
                    "at least one violation type is required",
                ));
            }

            candidate.elimination_period =
                Some(ctx.period_from_now(ctx.durations.elimination_addressed_days));
            if let Some(conclusion) = candidate.conclusion.as_mut() {
                conclusion.publish(ctx.now);
            }
        }

        (Active, Declined) => {
            let conclusion = candidate
                .conclusion
                .as_ref()
                .ok_or_else(|| guard_err(from, to, "a conclusion must be present"))?;
            if conclusion.violation_occurred {
                return Err(guard_err(
                    from,
                    to,
                    "the conclusion records a violation; address it instead",
                ));
            }

            candidate.elimination_period =
                Some(ctx.period_from_now(ctx.durations.elimination_declined_days));
            if let Some(conclusion) = candidate.conclusion.as_mut() {
                conclusion.publish(ctx.now);
            }
        }

        (Active | Addressed | Declined, Stopped) => {
            let cancellation = candidate
                .cancellation
                .as_ref()
                .ok_or_else(|| guard_err(from, to, "a cancellation must be present"))?;
            // A published cancellation already consumed its stop; each
            // activation episode needs a fresh one.
            if cancellation.date_published().is_some() {
                return Err(guard_err(
                    from,
                    to,
                    "the cancellation was already used; supply a new one",
                ));
            }

            if let Some(cancellation) = candidate.cancellation.as_mut() {
                cancellation.publish(ctx.now);
            }
            candidate.date_stopped = Some(ctx.now);
        }

        (Addressed, Completed) => {
            let period = candidate
                .elimination_period
                .ok_or_else(|| guard_err(from, to, "the elimination period is not set"))?;
            if !period.has_ended_by(ctx.now) {
                return Err(guard_err(
                    from,
                    to,
                    "the elimination period has not ended yet",
                ));
            }
            if candidate.elimination_resolution.is_none() {
                return Err(guard_err(
                    from,
                    to,
                    "an elimination resolution must be present",
                ));
            }

            if let Some(resolution) = candidate.elimination_resolution.as_mut() {
                resolution.publish(ctx.now);
            }
        }

        (Declined, Closed) => {
            let period = candidate
                .elimination_period
                .ok_or_else(|| guard_err(from, to, "the elimination period is not set"))?;
            if !period.has_ended_by(ctx.now) {
                return Err(guard_err(
                    from,
                    to,
                    "the elimination period has not ended yet",
                ));
            }
        }

        (Stopped, Active) => {
            let stopped_at = candidate
                .date_stopped
                .ok_or_else(|| guard_err(from, to, "the stop instant is not recorded"))?;
            let Some(period) = candidate.monitoring_period.as_mut() else {
                return Err(guard_err(from, to, "the monitoring period is not set"));
            };

            // Preserve the remaining duration: push the end out by the
            // paused interval.
            period.extend_by(ctx.now - stopped_at);
            candidate.date_stopped = None;
        }

        _ => unreachable!("pair was checked against the table"),
    }

    info!(
        "monitoring {} moves {from} -> {to}",
        candidate.case_number
    );
    candidate.status = to;
    Ok(())
}
