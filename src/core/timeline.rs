use chrono::{DateTime, Utc};
use crate::models::{Casualty, ComplianceStatus, DoctrineWindows, TimelineAssessment, TimelineWindow, TriageColor};

/// Tighter and looser 10-1-2 windows a triage colour is held to.
///
/// RED must reach initial care within 10 minutes and surgery within the hour;
/// YELLOW is held to the surgical and definitive-care windows.
pub fn windows_for(triage: TriageColor) -> (TimelineWindow, TimelineWindow) {
    match triage {
        TriageColor::Red => (TimelineWindow::InitialCare, TimelineWindow::Surgical),
        _ => (TimelineWindow::Surgical, TimelineWindow::Definitive),
    }
}

/// Minutes elapsed between injury and `now`, clamped at zero for clock skew
pub fn elapsed_minutes(injured_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - injured_at).num_milliseconds();
    (elapsed_ms.max(0) as f64) / 60_000.0
}

/// Assess a casualty against the 10-1-2 timeline
pub fn assess(casualty: &Casualty, now: DateTime<Utc>, windows: &DoctrineWindows) -> TimelineAssessment {
    let elapsed = elapsed_minutes(casualty.injured_at, now);
    let (tighter, looser) = windows_for(casualty.triage_color);
    let tighter_minutes = windows.minutes(tighter);
    let looser_minutes = windows.minutes(looser);

    let (status, window) = if elapsed <= tighter_minutes {
        (ComplianceStatus::Compliant, tighter)
    } else if elapsed <= looser_minutes {
        (ComplianceStatus::AtRisk, tighter)
    } else {
        (ComplianceStatus::Violated, looser)
    };

    let overdue_minutes = match status {
        ComplianceStatus::Compliant => 0.0,
        _ => elapsed - tighter_minutes,
    };

    TimelineAssessment {
        elapsed_minutes: elapsed,
        status,
        window,
        overdue_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::models::GeoPoint;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn casualty(triage: TriageColor, minutes_ago: i64) -> Casualty {
        Casualty {
            id: "c".to_string(),
            name: "Casualty".to_string(),
            triage_color: triage,
            location: GeoPoint::new(0.0, 0.0),
            injured_at: now() - Duration::minutes(minutes_ago),
        }
    }

    fn status(triage: TriageColor, minutes_ago: i64) -> ComplianceStatus {
        assess(&casualty(triage, minutes_ago), now(), &DoctrineWindows::default()).status
    }

    #[test]
    fn test_red_windows() {
        assert_eq!(status(TriageColor::Red, 5), ComplianceStatus::Compliant);
        assert_eq!(status(TriageColor::Red, 10), ComplianceStatus::Compliant);
        assert_eq!(status(TriageColor::Red, 11), ComplianceStatus::AtRisk);
        assert_eq!(status(TriageColor::Red, 60), ComplianceStatus::AtRisk);
        assert_eq!(status(TriageColor::Red, 70), ComplianceStatus::Violated);
    }

    #[test]
    fn test_yellow_windows() {
        assert_eq!(status(TriageColor::Yellow, 30), ComplianceStatus::Compliant);
        assert_eq!(status(TriageColor::Yellow, 90), ComplianceStatus::AtRisk);
        assert_eq!(status(TriageColor::Yellow, 121), ComplianceStatus::Violated);
    }

    #[test]
    fn test_implicated_window() {
        let windows = DoctrineWindows::default();
        let red = assess(&casualty(TriageColor::Red, 70), now(), &windows);
        assert_eq!(red.window, TimelineWindow::Surgical);
        assert!((red.overdue_minutes - 60.0).abs() < 1e-9);

        let yellow = assess(&casualty(TriageColor::Yellow, 90), now(), &windows);
        assert_eq!(yellow.window, TimelineWindow::Surgical);
        assert!((yellow.overdue_minutes - 30.0).abs() < 1e-9);

        let compliant = assess(&casualty(TriageColor::Red, 3), now(), &windows);
        assert_eq!(compliant.window, TimelineWindow::InitialCare);
        assert_eq!(compliant.overdue_minutes, 0.0);
    }

    #[test]
    fn test_longer_violation_is_more_overdue() {
        let windows = DoctrineWindows::default();
        let short = assess(&casualty(TriageColor::Yellow, 130), now(), &windows);
        let long = assess(&casualty(TriageColor::Yellow, 300), now(), &windows);
        assert_eq!(short.status, ComplianceStatus::Violated);
        assert_eq!(long.status, ComplianceStatus::Violated);
        assert!(long.overdue_minutes > short.overdue_minutes);
    }

    #[test]
    fn test_clock_skew_clamped() {
        let assessment = assess(&casualty(TriageColor::Red, -15), now(), &DoctrineWindows::default());
        assert_eq!(assessment.elapsed_minutes, 0.0);
        assert_eq!(assessment.status, ComplianceStatus::Compliant);
    }
}
