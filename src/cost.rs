//! Financial projections derived from a [`SolarSummary`].

use crate::types::{CostMetrics, Payback, SolarSummary};
use tracing::info;

pub const DEFAULT_RATE_PER_KWH: f64 = 0.14;
pub const DEFAULT_SYSTEM_COSTS: [f64; 3] = [1000.0, 2000.0, 3000.0];

/// Payback figure reported when projected annual savings are not positive.
pub const PAYBACK_NOT_ACHIEVABLE_YEARS: f64 = 999.9;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone)]
pub struct CostAnalyzer {
    system_costs: Vec<f64>,
}

impl Default for CostAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_COSTS.to_vec())
    }
}

impl CostAnalyzer {
    /// `system_costs` are the reference installation prices payback is quoted for.
    pub fn new(system_costs: Vec<f64>) -> Self {
        Self { system_costs }
    }

    pub fn compute(&self, summary: &SolarSummary, rate_per_kwh: f64) -> CostMetrics {
        info!("Generating cost report with rate ${:.3}/kWh", rate_per_kwh);

        let total_solar_kwh = summary.total_yield_wh / 1000.0;
        let total_consumption_kwh = summary.total_consumption_wh / 1000.0;

        let solar_value_usd = total_solar_kwh * rate_per_kwh;
        let consumption_cost_usd = total_consumption_kwh * rate_per_kwh;
        let net_savings_usd = solar_value_usd - consumption_cost_usd;

        let solar_offset_pct = if total_consumption_kwh > 0.0 {
            100.0 * total_solar_kwh / total_consumption_kwh
        } else {
            0.0
        };

        let days = summary.record_count;
        let per_day = |v: f64| if days > 0 { v / days as f64 } else { 0.0 };
        let avg_daily_solar_kwh = per_day(total_solar_kwh);
        let avg_daily_consumption_kwh = per_day(total_consumption_kwh);
        let projected_annual_usd = if days > 0 {
            net_savings_usd * (DAYS_PER_YEAR / days as f64)
        } else {
            0.0
        };

        let payback = self
            .system_costs
            .iter()
            .map(|&cost| Payback {
                system_cost_usd: cost,
                years: payback_years(cost, projected_annual_usd),
                achievable: projected_annual_usd > 0.0,
            })
            .collect();

        info!(
            "Cost report generated: ${:.2} net savings over {} days",
            net_savings_usd, days
        );

        CostMetrics {
            rate_per_kwh,
            days_analyzed: days,
            total_solar_kwh,
            total_consumption_kwh,
            solar_value_usd,
            consumption_cost_usd,
            net_savings_usd,
            solar_offset_pct,
            avg_daily_solar_kwh,
            avg_daily_consumption_kwh,
            projected_annual_usd,
            payback,
        }
    }
}

pub fn payback_years(system_cost: f64, projected_annual_usd: f64) -> f64 {
    if projected_annual_usd > 0.0 {
        system_cost / projected_annual_usd
    } else {
        PAYBACK_NOT_ACHIEVABLE_YEARS
    }
}
