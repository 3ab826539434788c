use crate::types::{CostMetrics, Payback, SolarSummary};
use crate::util::format_int;

const WIDTH: usize = 70;
const LABEL_WIDTH: usize = 27;

// Below this many kWh/day the array is considered undersized.
const LOW_OUTPUT_KWH_PER_DAY: f64 = 0.5;

fn rule(c: char) -> String {
    c.to_string().repeat(WIDTH)
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(rule('-'));
    lines.push(title.to_string());
    lines.push(rule('-'));
}

fn energy_line(label: &str, value: String, unit: &str) -> String {
    format!("{:<w$}{:>10}{}", label, value, unit, w = LABEL_WIDTH)
}

fn money_line(label: &str, value: f64) -> String {
    format!("{:<w$}${:>10.2}", label, value, w = LABEL_WIDTH)
}

fn payback_line(p: &Payback) -> String {
    let cost = format_int(p.system_cost_usd.round() as i64);
    if !p.achievable {
        format!("  - ${} system = not achievable", cost)
    } else {
        format!("  - ${} system = {:.1} years payback", cost, p.years)
    }
}

/// Render the fixed-layout cost analysis report.
pub fn render_report(summary: &SolarSummary, m: &CostMetrics) -> String {
    let days = summary.record_count;
    let mut lines = vec![
        String::new(),
        rule('='),
        "SOLAR ENERGY COST ANALYSIS REPORT".to_string(),
        rule('='),
        String::new(),
        format!("Analysis Period: {} days", days),
        format!("Electricity Rate: ${:.3} per kWh", m.rate_per_kwh),
        String::new(),
    ];

    section(&mut lines, "ENERGY SUMMARY");
    lines.push(energy_line(
        "Solar Energy Collected:",
        format!("{:.2}", m.total_solar_kwh),
        " kWh",
    ));
    lines.push(energy_line(
        "Energy Consumed:",
        format!("{:.2}", m.total_consumption_kwh),
        " kWh",
    ));
    lines.push(energy_line(
        "Solar Offset:",
        format!("{:.1}", m.solar_offset_pct),
        "%",
    ));
    lines.push(String::new());
    lines.push(energy_line(
        "Daily Average Solar:",
        format!("{:.3}", m.avg_daily_solar_kwh),
        " kWh",
    ));
    lines.push(energy_line(
        "Daily Average Consumption:",
        format!("{:.3}", m.avg_daily_consumption_kwh),
        " kWh",
    ));
    lines.push(String::new());

    section(&mut lines, "FINANCIAL ANALYSIS");
    lines.push(money_line("Value of Solar Generated:", m.solar_value_usd));
    lines.push(money_line("Cost of Energy Consumed:", m.consumption_cost_usd));
    lines.push(money_line("NET SAVINGS:", m.net_savings_usd));
    lines.push(String::new());

    section(&mut lines, "PROJECTIONS");
    lines.push(money_line("Projected Annual Savings:", m.projected_annual_usd));
    lines.push(String::new());

    section(&mut lines, "INVESTMENT GUIDANCE");
    lines.push(format!("Based on your {}-day analysis:", days));
    lines.push(String::new());
    lines.push(format!(
        "• Your solar system generates ${:.2} worth of energy",
        m.solar_value_usd
    ));
    lines.push(
        if m.net_savings_usd > 0.0 {
            "• You are NET POSITIVE - solar exceeds consumption!"
        } else {
            "• You are consuming more than you generate"
        }
        .to_string(),
    );
    lines.push(format!(
        "• Solar offsets {:.1}% of your energy needs",
        m.solar_offset_pct
    ));
    lines.push(String::new());
    lines.push("Annual Value Analysis:".to_string());
    lines.push(format!(
        "• Annual solar generation value: ${:.2}",
        m.projected_annual_usd
    ));
    lines.push("• Break-even timeline depends on system cost".to_string());
    lines.extend(m.payback.iter().map(payback_line));
    lines.push(String::new());
    lines.push(
        if m.avg_daily_solar_kwh < LOW_OUTPUT_KWH_PER_DAY {
            "Recommendation: Your current solar output is LOW. Consider expanding your"
        } else {
            "Recommendation: Strong solar performance. Current capacity appears adequate for"
        }
        .to_string(),
    );
    lines.push("solar array to maximize ROI and reduce grid dependence.".to_string());
    lines.push(String::new());
    lines.push(rule('='));
    lines.push(String::new());

    lines.join("\n")
}
