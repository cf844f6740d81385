//! Simulation metrics.

use rust_decimal::Decimal;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Policies bought.
    pub policies_sold: u64,
    /// Purchases the engine refused.
    pub policies_rejected: u64,
    /// Status requests sent to the oracles.
    pub status_requests: u64,
    /// Oracle reports accepted (recorded, resolving or ignored).
    pub reports_submitted: u64,
    /// Oracle reports the engine refused.
    pub reports_rejected: u64,
    /// Flights resolved by quorum.
    pub flights_resolved: u64,
    /// Withdrawals that paid out.
    pub withdrawals: u64,
    /// Total paid out to passengers.
    pub payouts: Decimal,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            policies_sold: 0,
            policies_rejected: 0,
            status_requests: 0,
            reports_submitted: 0,
            reports_rejected: 0,
            flights_resolved: 0,
            withdrawals: 0,
            payouts: Decimal::ZERO,
        }
    }

    /// Record a policy purchase.
    pub fn record_policy(&mut self) {
        self.policies_sold += 1;
    }

    /// Record a refused purchase.
    pub fn record_policy_rejected(&mut self) {
        self.policies_rejected += 1;
    }

    /// Record a status request.
    pub fn record_request(&mut self) {
        self.status_requests += 1;
    }

    /// Record an accepted oracle report.
    pub fn record_report(&mut self) {
        self.reports_submitted += 1;
    }

    /// Record a refused oracle report.
    pub fn record_report_rejected(&mut self) {
        self.reports_rejected += 1;
    }

    /// Record a flight reaching quorum.
    pub fn record_resolution(&mut self) {
        self.flights_resolved += 1;
    }

    /// Record a withdrawal.
    pub fn record_withdrawal(&mut self, amount: Decimal) {
        self.withdrawals += 1;
        self.payouts += amount;
    }

    /// Share of flights resolved.
    pub fn resolution_rate(&self, flights: usize) -> f64 {
        if flights == 0 {
            return 0.0;
        }

        self.flights_resolved as f64 / flights as f64
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_policy();
        metrics.record_policy_rejected();
        metrics.record_resolution();
        metrics.record_withdrawal(Decimal::new(15, 1));
        metrics.record_withdrawal(Decimal::new(75, 2));

        assert_eq!(metrics.policies_sold, 1);
        assert_eq!(metrics.policies_rejected, 1);
        assert_eq!(metrics.withdrawals, 2);
        assert_eq!(metrics.payouts, Decimal::new(225, 2));
        assert_eq!(metrics.resolution_rate(4), 0.25);
        assert_eq!(metrics.resolution_rate(0), 0.0);
    }
}
