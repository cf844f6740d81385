//! Engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use flightsurety_common::Event;

/// Engine counters.
pub struct Metrics {
    airlines_registered: AtomicU64,
    airlines_funded: AtomicU64,
    votes_cast: AtomicU64,
    flights_registered: AtomicU64,
    policies_sold: AtomicU64,
    oracles_registered: AtomicU64,
    oracle_requests: AtomicU64,
    oracle_reports: AtomicU64,
    reports_ignored: AtomicU64,
    flights_resolved: AtomicU64,
    insurees_credited: AtomicU64,
    withdrawals: AtomicU64,
    operations_rejected: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            airlines_registered: AtomicU64::new(0),
            airlines_funded: AtomicU64::new(0),
            votes_cast: AtomicU64::new(0),
            flights_registered: AtomicU64::new(0),
            policies_sold: AtomicU64::new(0),
            oracles_registered: AtomicU64::new(0),
            oracle_requests: AtomicU64::new(0),
            oracle_reports: AtomicU64::new(0),
            reports_ignored: AtomicU64::new(0),
            flights_resolved: AtomicU64::new(0),
            insurees_credited: AtomicU64::new(0),
            withdrawals: AtomicU64::new(0),
            operations_rejected: AtomicU64::new(0),
        }
    }

    /// Count the effects of a committed operation.
    pub fn record_events(&self, events: &[Event]) {
        for event in events {
            let counter = match event {
                Event::AirlineRegistered { .. } => &self.airlines_registered,
                Event::AirlineFunded { .. } => &self.airlines_funded,
                Event::FlightRegistered { .. } => &self.flights_registered,
                Event::InsurancePurchased { .. } => &self.policies_sold,
                Event::OracleRegistered { .. } => &self.oracles_registered,
                Event::OracleRequest { .. } => &self.oracle_requests,
                Event::OracleReport { .. } => &self.oracle_reports,
                Event::FlightStatusResolved { .. } => &self.flights_resolved,
                Event::InsureeCredited { .. } => &self.insurees_credited,
                Event::Withdrawn { .. } => &self.withdrawals,
                Event::OperatingStatusChanged { .. } => continue,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a consensus vote that did not yet admit the candidate.
    pub fn vote_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an oracle report dropped without error.
    pub fn report_ignored(&self) {
        self.reports_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an operation that failed a check.
    pub fn operation_rejected(&self) {
        self.operations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            airlines_registered: self.airlines_registered.load(Ordering::Relaxed),
            airlines_funded: self.airlines_funded.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            flights_registered: self.flights_registered.load(Ordering::Relaxed),
            policies_sold: self.policies_sold.load(Ordering::Relaxed),
            oracles_registered: self.oracles_registered.load(Ordering::Relaxed),
            oracle_requests: self.oracle_requests.load(Ordering::Relaxed),
            oracle_reports: self.oracle_reports.load(Ordering::Relaxed),
            reports_ignored: self.reports_ignored.load(Ordering::Relaxed),
            flights_resolved: self.flights_resolved.load(Ordering::Relaxed),
            insurees_credited: self.insurees_credited.load(Ordering::Relaxed),
            withdrawals: self.withdrawals.load(Ordering::Relaxed),
            operations_rejected: self.operations_rejected.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("airlines_registered", "Airlines admitted", snapshot.airlines_registered),
            ("airlines_funded", "Airline stake deposits", snapshot.airlines_funded),
            ("votes_cast", "Consensus votes short of admission", snapshot.votes_cast),
            ("flights_registered", "Flights registered", snapshot.flights_registered),
            ("policies_sold", "Insurance policies sold", snapshot.policies_sold),
            ("oracles_registered", "Oracles registered", snapshot.oracles_registered),
            ("oracle_requests", "Flight status requests", snapshot.oracle_requests),
            ("oracle_reports", "Oracle reports recorded", snapshot.oracle_reports),
            ("reports_ignored", "Oracle reports ignored", snapshot.reports_ignored),
            ("flights_resolved", "Flights resolved by quorum", snapshot.flights_resolved),
            ("insurees_credited", "Policies paid out", snapshot.insurees_credited),
            ("withdrawals", "Credit withdrawals", snapshot.withdrawals),
            ("operations_rejected", "Operations that failed a check", snapshot.operations_rejected),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP flightsurety_{name} {help}\n# TYPE flightsurety_{name} counter\nflightsurety_{name} {value}\n\n"
            ));
        }
        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub airlines_registered: u64,
    pub airlines_funded: u64,
    pub votes_cast: u64,
    pub flights_registered: u64,
    pub policies_sold: u64,
    pub oracles_registered: u64,
    pub oracle_requests: u64,
    pub oracle_reports: u64,
    pub reports_ignored: u64,
    pub flights_resolved: u64,
    pub insurees_credited: u64,
    pub withdrawals: u64,
    pub operations_rejected: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
