//! Squadron status rollup.
//!
//! Pure functions over an in-memory flight list: per-flight worst status and
//! squadron-wide counts. No caching, callers recompute from the latest data on
//! every request.

use serde::Serialize;

use crate::model::{ComponentStatus, Flight};

/// Resolved worst status for one flight, included in the summary so callers
/// never recompute it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightStatus {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub worst_status: ComponentStatus,
}

/// Squadron-wide rollup. A flight is deployable iff its worst component
/// status is strictly below Critical.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadronSummary {
    pub total_flights: usize,
    pub flights_all_good: usize,
    pub flights_with_warnings: usize,
    pub flights_with_critical: usize,
    pub deployable_count: usize,
    /// Rounded whole percentage; 0 when the squadron is empty.
    pub deployable_pct: u32,
    pub in_service_count: usize,
    pub critical_ids: Vec<String>,
    pub per_flight: Vec<FlightStatus>,
}

/// Computes the squadron summary in a single pass. An empty flight set yields
/// all-zero counts; a flight with no components is Good.
pub fn summarize(flights: &[Flight]) -> SquadronSummary {
    let total = flights.len();
    let mut all_good = 0usize;
    let mut with_warnings = 0usize;
    let mut with_critical = 0usize;
    let mut deployable = 0usize;
    let mut critical_ids = Vec::new();
    let mut per_flight = Vec::with_capacity(total);

    for flight in flights {
        let worst = flight
            .components
            .iter()
            .map(|c| c.severity())
            .max()
            .unwrap_or(ComponentStatus::SEVERITY_GOOD);
        if worst == ComponentStatus::SEVERITY_GOOD {
            all_good += 1;
        } else if worst == ComponentStatus::SEVERITY_WARNING {
            with_warnings += 1;
        } else {
            with_critical += 1;
            critical_ids.push(flight.id.clone());
        }
        if worst < ComponentStatus::SEVERITY_CRITICAL {
            deployable += 1;
        }
        per_flight.push(FlightStatus {
            id: flight.id.clone(),
            display_name: flight.display_name.clone(),
            worst_status: ComponentStatus::from_severity(worst),
        });
    }

    let deployable_pct = if total > 0 {
        ((deployable as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };

    SquadronSummary {
        total_flights: total,
        flights_all_good: all_good,
        flights_with_warnings: with_warnings,
        flights_with_critical: with_critical,
        deployable_count: deployable,
        deployable_pct,
        in_service_count: total - deployable,
        critical_ids,
        per_flight,
    }
}

/// Flight-scoped rollup: worst status plus a one-line "key issue" for the
/// templated chat reply.
#[derive(Debug, Clone)]
pub struct FlightSummary {
    pub worst: ComponentStatus,
    pub key_issue: String,
}

/// First Critical component wins, then first Warning, else no issues. Label
/// matching is case-insensitive since override files are hand-authored.
pub fn flight_summary(flight: &Flight) -> FlightSummary {
    let find = |label: &str| {
        flight
            .components
            .iter()
            .find(|c| c.status.as_ref().is_some_and(|s| s.matches_label(label)))
    };
    if let Some(critical) = find("critical") {
        return FlightSummary {
            worst: ComponentStatus::Critical,
            key_issue: format!(
                "{} = Critical (maintenanceDue: {})",
                critical.name(),
                critical.maintenance_due.as_deref().unwrap_or("unknown")
            ),
        };
    }
    if let Some(warning) = find("warning") {
        return FlightSummary {
            worst: ComponentStatus::Warning,
            key_issue: format!(
                "{} = Warning (maintenanceDue: {})",
                warning.name(),
                warning.maintenance_due.as_deref().unwrap_or("unknown")
            ),
        };
    }
    FlightSummary {
        worst: ComponentStatus::Good,
        key_issue: "No issues detected.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;

    fn flight(id: &str, statuses: &[&str]) -> Flight {
        Flight {
            id: id.to_string(),
            display_name: Some(format!("Atlas {id}")),
            components: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| Component {
                    id: Some(format!("{id}-c{i}")),
                    display_name: None,
                    component_name: Some(format!("Component {i}")),
                    status: Some(ComponentStatus::from(s.to_string())),
                    maintenance_due: None,
                })
                .collect(),
            extra: Default::default(),
        }
    }

    #[test]
    fn empty_squadron_is_all_zeros() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_flights, 0);
        assert_eq!(summary.deployable_count, 0);
        assert_eq!(summary.deployable_pct, 0);
        assert!(summary.critical_ids.is_empty());
        assert!(summary.per_flight.is_empty());
    }

    #[test]
    fn flight_with_no_components_is_good() {
        let summary = summarize(&[flight("A400-01", &[])]);
        assert_eq!(summary.flights_all_good, 1);
        assert_eq!(summary.per_flight[0].worst_status, ComponentStatus::Good);
        assert_eq!(summary.deployable_pct, 100);
    }

    #[test]
    fn one_critical_component_dominates_regardless_of_order() {
        let front = summarize(&[flight("A400-02", &["Critical", "Good", "Warning"])]);
        let back = summarize(&[flight("A400-02", &["Good", "Warning", "Critical"])]);
        for summary in [front, back] {
            assert_eq!(summary.flights_with_critical, 1);
            assert_eq!(summary.per_flight[0].worst_status, ComponentStatus::Critical);
            assert_eq!(summary.critical_ids, vec!["A400-02".to_string()]);
        }
    }

    #[test]
    fn deployable_plus_critical_covers_the_squadron() {
        let flights = vec![
            flight("A400-01", &["Good"]),
            flight("A400-02", &["Warning", "Good"]),
            flight("A400-03", &["Critical"]),
            flight("A400-04", &[]),
        ];
        let summary = summarize(&flights);
        assert_eq!(summary.deployable_count + summary.flights_with_critical, summary.total_flights);
        assert_eq!(summary.in_service_count, summary.total_flights - summary.deployable_count);
        assert!(summary.deployable_pct <= 100);
        assert_eq!(summary.deployable_pct, 75);
    }

    #[test]
    fn unrecognized_status_counts_as_warning_severity() {
        let summary = summarize(&[flight("A400-05", &["Degraded"])]);
        assert_eq!(summary.flights_with_warnings, 1);
        assert_eq!(summary.per_flight[0].worst_status, ComponentStatus::Warning);
        assert_eq!(summary.deployable_count, 1);
    }

    #[test]
    fn pct_rounds_to_nearest_whole() {
        let flights = vec![
            flight("A400-01", &["Good"]),
            flight("A400-02", &["Good"]),
            flight("A400-03", &["Critical"]),
        ];
        // 2/3 = 66.67 -> 67
        assert_eq!(summarize(&flights).deployable_pct, 67);
    }

    #[test]
    fn key_issue_prefers_critical_and_reports_maintenance_due() {
        let mut f = flight("A400-06", &["Warning", "Critical"]);
        f.components[1].maintenance_due = Some("2026-09-15".to_string());
        let summary = flight_summary(&f);
        assert_eq!(summary.worst, ComponentStatus::Critical);
        assert!(summary.key_issue.contains("Component 1 = Critical"));
        assert!(summary.key_issue.contains("2026-09-15"));
    }

    #[test]
    fn key_issue_for_clean_flight() {
        let summary = flight_summary(&flight("A400-07", &["Good", "Good"]));
        assert_eq!(summary.worst, ComponentStatus::Good);
        assert_eq!(summary.key_issue, "No issues detected.");
    }
}
