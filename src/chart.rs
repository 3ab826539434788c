//! Performance dashboard and single-metric charts rendered to PNG.
//!
//! Text is drawn with fonts bundled under `assets/fonts`, so rendering
//! needs no system font libraries.

use crate::error::{Result, SolarError};
use crate::pipeline::SolarTable;
use crate::record::SolarRecord;
use crate::util::average;
use once_cell::sync::OnceCell;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use std::path::Path;
use tracing::info;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;
type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type XyChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const SANS_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const MONO_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");
static FONTS: OnceCell<()> = OnceCell::new();

const DASHBOARD_SIZE: (u32, u32) = (2000, 1500);
const SINGLE_CHART_SIZE: (u32, u32) = (1800, 900);
const TITLE: &str = "Victron MPPT Solar Charge Controller - Performance Dashboard";

const GOLD: RGBColor = RGBColor(255, 193, 7);
const DARK_RED: RGBColor = RGBColor(139, 0, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
const ORANGE: RGBColor = RGBColor(255, 152, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const WHEAT: RGBColor = RGBColor(245, 222, 179);
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);

// Charge-controller setpoints for a 12 V lead-acid bank.
const ABSORPTION_SETPOINT_V: f64 = 14.4;
const FLOAT_SETPOINT_V: f64 = 13.5;
const LOW_BATTERY_V: f64 = 12.0;
// Roughly 50% state of charge for a 12 V bank.
const HALF_CHARGE_V: f64 = 12.2;

const LOW_TOTAL_YIELD_WH: f64 = 500.0;
const LONG_BULK_MIN: f64 = 300.0;
const SMALL_ARRAY_AVG_WH: f64 = 200.0;

/// Per-day series plotted on the charts, oldest day first.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSeries {
    pub dates: Vec<String>,
    pub yields: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub pv_power: Vec<f64>,
    pub pv_voltage: Vec<f64>,
    pub min_voltage: Vec<f64>,
    pub max_voltage: Vec<f64>,
    pub bulk: Vec<f64>,
    pub absorption: Vec<f64>,
    pub float: Vec<f64>,
    /// Wh harvested per hour spent in bulk or absorption.
    pub efficiency: Vec<f64>,
}

fn charging_efficiency(r: &SolarRecord) -> f64 {
    let hours = r.charging_minutes() / 60.0;
    if hours > 0.0 {
        r.yield_wh / hours
    } else {
        0.0
    }
}

impl DashboardSeries {
    pub fn from_table(table: &SolarTable) -> Self {
        let sorted = table.sorted_by_date();
        let yields = sorted.column(|r| r.yield_wh);
        let cumulative = yields
            .iter()
            .scan(0.0, |total, y| {
                *total += y;
                Some(*total)
            })
            .collect();
        Self {
            dates: sorted
                .records()
                .iter()
                .map(|r| r.date.format("%m/%d").to_string())
                .collect(),
            yields,
            cumulative,
            pv_power: sorted.column(|r| r.max_pv_power_w),
            pv_voltage: sorted.column(|r| r.max_pv_voltage_v),
            min_voltage: sorted.column(|r| r.min_battery_voltage_v),
            max_voltage: sorted.column(|r| r.max_battery_voltage_v),
            bulk: sorted.column(|r| r.time_in_bulk_min),
            absorption: sorted.column(|r| r.time_in_absorption_min),
            float: sorted.column(|r| r.time_in_float_min),
            efficiency: sorted.column(charging_efficiency),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn x_range(&self) -> std::ops::Range<f64> {
        -0.5..self.len() as f64 - 0.5
    }

    fn date_label(&self, x: f64) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        self.dates.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Text of the system summary panel.
    pub fn summary_lines(&self) -> Vec<String> {
        let total: f64 = self.yields.iter().sum();
        let min_v = self.min_voltage.iter().copied().fold(f64::INFINITY, f64::min);
        let status = if min_v > LOW_BATTERY_V {
            "Healthy"
        } else {
            "Low voltage detected"
        };
        let mut lines = vec![
            format!("SYSTEM SUMMARY ({} days)", self.len()),
            String::new(),
            format!("Total Energy: {total:.0} Wh"),
            format!("Daily Average: {:.0} Wh", average(&self.yields)),
            format!("Peak Power: {:.0} W", max_of(&self.pv_power)),
            String::new(),
            "BATTERY HEALTH".to_string(),
            format!("Max Voltage: {:.2} V", average(&self.max_voltage)),
            format!("Min Voltage: {min_v:.2} V"),
            format!("Status: {status}"),
            String::new(),
        ];
        if total < LOW_TOTAL_YIELD_WH {
            lines.push("WARNING: Battery may be undercharged".to_string());
            lines.push("or oversized for solar capacity".to_string());
        } else {
            lines.push("System operating normally".to_string());
        }
        lines
    }

    /// Text of the key insights panel.
    pub fn insight_lines(&self) -> Vec<String> {
        let avg = average(&self.yields);
        let good_days = self.yields.iter().filter(|&&y| y > avg).count();
        let low_days = self.yields.iter().filter(|&&y| y < avg * 0.5).count();
        let avg_bulk = average(&self.bulk);
        let low_battery_days = self.min_voltage.iter().filter(|&&v| v < HALF_CHARGE_V).count();

        let mut lines = vec![
            "KEY INSIGHTS".to_string(),
            String::new(),
            "PRODUCTION".to_string(),
            format!("- {good_days}/{} days above average", self.len()),
            format!("- {low_days} low production days"),
            String::new(),
            "CHARGING PATTERN".to_string(),
            format!("- Bulk: {avg_bulk:.0} min avg"),
            format!("- Absorption: {:.0} min avg", average(&self.absorption)),
        ];
        if avg_bulk > LONG_BULK_MIN {
            lines.push("- WARNING: Long bulk times suggest".to_string());
            lines.push("  undersized solar array".to_string());
        } else {
            lines.push("- Good charging speed".to_string());
        }
        lines.push(String::new());
        lines.push("BATTERY HEALTH".to_string());
        if low_battery_days > 0 {
            lines.push(format!("- WARNING: {low_battery_days} days below {HALF_CHARGE_V}V"));
            lines.push("  (50% SOC for 12V system)".to_string());
        } else {
            lines.push("- Good voltage maintained".to_string());
        }
        lines.push(String::new());
        lines.push("RECOMMENDATIONS".to_string());
        if avg < SMALL_ARRAY_AVG_WH {
            lines.push("- Consider larger solar array".to_string());
            lines.push("- Check battery capacity".to_string());
        } else {
            lines.push("- System performing well".to_string());
            lines.push("- Monitor during winter".to_string());
        }
        lines
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().enumerate().map(|(i, y)| (i as f64, *y)).collect()
}

fn register_fonts() -> Result<()> {
    FONTS
        .get_or_try_init(|| {
            for (family, bytes) in [("sans-serif", SANS_FONT), ("monospace", MONO_FONT)] {
                register_font(family, FontStyle::Normal, bytes).map_err(|_| {
                    SolarError::Chart(format!("bundled {family} font could not be loaded"))
                })?;
            }
            Ok(())
        })
        .map(|_| ())
}

/// Render the eight-panel dashboard for `table` to a PNG at `path`.
pub fn render_dashboard(table: &SolarTable, path: &Path) -> Result<()> {
    render(table, path, DASHBOARD_SIZE, draw_dashboard)?;
    info!("Saved dashboard to {}", path.display());
    Ok(())
}

/// Daily yield as a line over time.
pub fn render_yield_chart(table: &SolarTable, path: &Path) -> Result<()> {
    render(table, path, SINGLE_CHART_SIZE, draw_yield_over_time)?;
    info!("Saved yield chart to {}", path.display());
    Ok(())
}

/// Daily minimum and maximum battery voltage with the band between them.
pub fn render_battery_voltage_chart(table: &SolarTable, path: &Path) -> Result<()> {
    render(table, path, SINGLE_CHART_SIZE, draw_voltage_range)?;
    info!("Saved battery voltage chart to {}", path.display());
    Ok(())
}

fn render(
    table: &SolarTable,
    path: &Path,
    size: (u32, u32),
    draw: impl FnOnce(&Panel<'_>, &DashboardSeries) -> DrawResult<()>,
) -> Result<()> {
    let series = DashboardSeries::from_table(table);
    if series.is_empty() {
        return Err(SolarError::Chart("no records to plot".to_string()));
    }
    register_fonts()?;
    draw_to_file(path, size, &series, draw).map_err(|e| SolarError::Chart(e.to_string()))
}

fn draw_to_file(
    path: &Path,
    size: (u32, u32),
    series: &DashboardSeries,
    draw: impl FnOnce(&Panel<'_>, &DashboardSeries) -> DrawResult<()>,
) -> DrawResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root, series)?;
    root.present()?;
    Ok(())
}

fn draw_dashboard(root: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let body = root.titled(TITLE, ("sans-serif", 32))?;
    let rows = body.split_evenly((3, 1));

    // Top row: daily yield across two thirds, summary text in the rest.
    let (width, _) = rows[0].dim_in_pixel();
    let (yield_area, summary_area) = rows[0].split_horizontally(width * 2 / 3);
    draw_daily_yield(&yield_area, s)?;
    draw_text_panel(&summary_area, &s.summary_lines(), WHEAT)?;

    let middle = rows[1].split_evenly((1, 3));
    draw_battery_voltage(&middle[0], s)?;
    draw_solar_output(&middle[1], s)?;
    draw_charging_phases(&middle[2], s)?;

    let bottom = rows[2].split_evenly((1, 3));
    draw_cumulative_yield(&bottom[0], s)?;
    draw_charging_efficiency(&bottom[1], s)?;
    draw_text_panel(&bottom[2], &s.insight_lines(), LIGHT_BLUE)?;
    Ok(())
}

fn draw_text_panel(area: &Panel<'_>, lines: &[String], background: RGBColor) -> DrawResult<()> {
    let inner = area.margin(15, 15, 15, 15);
    inner.fill(&background.mix(0.3))?;
    let style = ("monospace", 17).into_font().color(&BLACK);
    for (i, line) in lines.iter().enumerate() {
        inner.draw(&Text::new(
            line.as_str(),
            (15, 12 + i as i32 * 22),
            style.clone(),
        ))?;
    }
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(chart: &mut XyChart<'a, 'b>, position: SeriesLabelPosition) -> DrawResult<()> {
    chart
        .configure_series_labels()
        .position(position)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_daily_yield(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let avg = average(&s.yields);
    let mut chart = ChartBuilder::on(area)
        .caption("Daily Solar Energy Production", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&s.yields) * 1.1 + 1.0)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(14))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Energy Yield (Wh)")
        .draw()?;

    chart.draw_series(s.yields.iter().enumerate().map(|(i, y)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *y)], GOLD.mix(0.7).filled())
    }))?;

    let range = s.x_range();
    chart
        .draw_series(LineSeries::new(
            vec![(range.start, avg), (range.end, avg)],
            RED.stroke_width(2),
        ))?
        .label(format!("Avg: {avg:.0} Wh"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    draw_legend(&mut chart, SeriesLabelPosition::UpperRight)
}

fn draw_battery_voltage(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let lo = s.min_voltage.iter().copied().fold(LOW_BATTERY_V, f64::min) - 0.5;
    let hi = s
        .max_voltage
        .iter()
        .copied()
        .fold(ABSORPTION_SETPOINT_V, f64::max)
        + 0.5;

    let mut chart = ChartBuilder::on(area)
        .caption("Battery Voltage Behavior", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(s.x_range(), lo..hi)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(7))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Voltage (V)")
        .draw()?;

    draw_voltage_series(&mut chart, s, "Min (Depth of Discharge)", "Max (Charged)")?;

    let range = s.x_range();
    for (level, color, label) in [
        (ABSORPTION_SETPOINT_V, BLUE, "Absorption setpoint"),
        (FLOAT_SETPOINT_V, ORANGE, "Float setpoint"),
        (LOW_BATTERY_V, RED, "Low battery warning"),
    ] {
        chart
            .draw_series(LineSeries::new(
                vec![(range.start, level), (range.end, level)],
                color.mix(0.5),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.mix(0.5)));
    }

    draw_legend(&mut chart, SeriesLabelPosition::LowerLeft)
}

/// Min/max band plus both voltage lines, shared by the dashboard panel and
/// the standalone chart.
fn draw_voltage_series<'a, 'b: 'a>(
    chart: &mut XyChart<'a, 'b>,
    s: &DashboardSeries,
    min_label: &str,
    max_label: &str,
) -> DrawResult<()> {
    let band: Vec<(f64, f64)> = points(&s.max_voltage)
        .into_iter()
        .chain(points(&s.min_voltage).into_iter().rev())
        .collect();
    chart
        .draw_series(std::iter::once(Polygon::new(band, GREEN.mix(0.3))))?
        .label("Voltage Range")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], GREEN.mix(0.3).filled()));
    chart
        .draw_series(LineSeries::new(points(&s.min_voltage), DARK_RED.stroke_width(2)).point_size(4))?
        .label(min_label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DARK_RED));
    chart
        .draw_series(LineSeries::new(points(&s.max_voltage), DARK_GREEN.stroke_width(2)).point_size(4))?
        .label(max_label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DARK_GREEN));
    Ok(())
}

fn draw_solar_output(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let mut chart = ChartBuilder::on(area)
        .caption("Solar Panel Output", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&s.pv_power) * 1.1 + 1.0)?
        .set_secondary_coord(s.x_range(), 0.0..max_of(&s.pv_voltage) * 1.1 + 1.0);

    chart
        .configure_mesh()
        .x_labels(s.len().min(7))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Peak PV Power (W)")
        .axis_desc_style(("sans-serif", 15).into_font().color(&ORANGE))
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Peak PV Voltage (V)")
        .axis_desc_style(("sans-serif", 15).into_font().color(&BLUE))
        .draw()?;

    chart
        .draw_series(LineSeries::new(points(&s.pv_power), ORANGE.stroke_width(2)).point_size(5))?
        .label("Peak Power")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE));
    chart
        .draw_secondary_series(
            LineSeries::new(points(&s.pv_voltage), BLUE.mix(0.7).stroke_width(2)).point_size(4),
        )?
        .label("Peak Voltage")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_charging_phases(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let totals: Vec<f64> = (0..s.len())
        .map(|i| s.bulk[i] + s.absorption[i] + s.float[i])
        .collect();
    let mut chart = ChartBuilder::on(area)
        .caption("MPPT Charging Phases", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&totals) * 1.1 + 1.0)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(7))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Time (minutes)")
        .draw()?;

    // Bulk at the bottom, absorption on top of it, float on top of both.
    let mut base = vec![0.0; s.len()];
    for (values, color, label) in [
        (&s.bulk, RED, "Bulk"),
        (&s.absorption, YELLOW, "Absorption"),
        (&s.float, GREEN, "Float"),
    ] {
        let style = color.mix(0.7).filled();
        let bars: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, base[i]), (x + 0.4, base[i] + v)], style)
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));
        for (b, v) in base.iter_mut().zip(values.iter()) {
            *b += v;
        }
    }

    draw_legend(&mut chart, SeriesLabelPosition::UpperRight)
}

fn draw_cumulative_yield(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let mut chart = ChartBuilder::on(area)
        .caption("Cumulative Energy Production", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&s.cumulative) * 1.1 + 1.0)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(7))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Total Energy (Wh)")
        .draw()?;

    chart.draw_series(
        AreaSeries::new(points(&s.cumulative), 0.0, GREEN.mix(0.2))
            .border_style(DARK_GREEN.stroke_width(3)),
    )?;
    Ok(())
}

fn draw_charging_efficiency(area: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let avg = average(&s.efficiency);
    let mut chart = ChartBuilder::on(area)
        .caption("Charging Efficiency", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&s.efficiency) * 1.1 + 1.0)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(7))
        .x_label_formatter(&|x| s.date_label(*x))
        .y_desc("Average Power (W)")
        .draw()?;

    chart.draw_series(
        LineSeries::new(points(&s.efficiency), PURPLE.stroke_width(2)).point_size(5),
    )?;

    let range = s.x_range();
    chart
        .draw_series(LineSeries::new(
            vec![(range.start, avg), (range.end, avg)],
            RED.stroke_width(2),
        ))?
        .label(format!("Avg: {avg:.1} W"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    draw_legend(&mut chart, SeriesLabelPosition::UpperRight)
}

fn draw_yield_over_time(root: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let mut chart = ChartBuilder::on(root)
        .caption("Daily Solar Yield Over Time", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(s.x_range(), 0.0..max_of(&s.yields) * 1.1 + 1.0)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(20))
        .x_label_formatter(&|x| s.date_label(*x))
        .x_desc("Date")
        .y_desc("Yield (Wh)")
        .draw()?;

    chart.draw_series(LineSeries::new(points(&s.yields), BLUE.stroke_width(2)).point_size(4))?;
    Ok(())
}

fn draw_voltage_range(root: &Panel<'_>, s: &DashboardSeries) -> DrawResult<()> {
    let lo = s.min_voltage.iter().copied().fold(f64::INFINITY, f64::min) - 0.5;
    let hi = max_of(&s.max_voltage) + 0.5;
    let mut chart = ChartBuilder::on(root)
        .caption("Battery Voltage Range Over Time", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(s.x_range(), lo..hi)?;

    chart
        .configure_mesh()
        .x_labels(s.len().min(20))
        .x_label_formatter(&|x| s.date_label(*x))
        .x_desc("Date")
        .y_desc("Voltage (V)")
        .draw()?;

    draw_voltage_series(&mut chart, s, "Min Voltage", "Max Voltage")?;
    draw_legend(&mut chart, SeriesLabelPosition::UpperRight)
}
