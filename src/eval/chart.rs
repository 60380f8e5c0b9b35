

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{KindredError, Result};
use crate::matching::RunMetrics;

pub const CHART_FILE: &str = "metrics_comparison.svg";

const PANEL_WIDTH: f64 = 420.0;
const PANEL_HEIGHT: f64 = 300.0;
const MARGIN: f64 = 40.0;
const COLORS: [&str; 4] = ["#4c72b0", "#dd8452", "#55a868", "#c44e52"];


struct Panel {
    title: &'static str,
    value: fn(&RunMetrics) -> f64,
    integer: bool,
}

const PANELS: [Panel; 4] = [
    Panel {
        title: "Metric (success rate x (1 - gini))",
        value: combined_score,
        integer: false,
    },
    Panel {
        title: "Success rate",
        value: RunMetrics::success_rate,
        integer: false,
    },
    Panel {
        title: "Gini coefficient",
        value: gini,
        integer: false,
    },
    Panel {
        title: "Comparisons",
        value: comparisons,
        integer: true,
    },
];

fn combined_score(m: &RunMetrics) -> f64 {
    m.combined_score
}

fn gini(m: &RunMetrics) -> f64 {
    m.gini
}

fn comparisons(m: &RunMetrics) -> f64 {
    m.total_comparisons as f64
}


/// 2x2 bar chart comparing strategies.
pub fn render_comparison(metrics: &[RunMetrics]) -> Result<String> {
    let width = PANEL_WIDTH * 2.0;
    let height = PANEL_HEIGHT * 2.0;
    let mut svg = String::new();
    let fmt_err = |e: std::fmt::Error| KindredError::Report(e.to_string());

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" font-family="sans-serif" font-size="11">"#
    )
    .map_err(fmt_err)?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#).map_err(fmt_err)?;

    for (i, panel) in PANELS.iter().enumerate() {
        let x0 = (i % 2) as f64 * PANEL_WIDTH;
        let y0 = (i / 2) as f64 * PANEL_HEIGHT;
        render_panel(&mut svg, panel, metrics, x0, y0).map_err(fmt_err)?;
    }

    writeln!(svg, "</svg>").map_err(fmt_err)?;
    Ok(svg)
}

fn render_panel(
    svg: &mut String,
    panel: &Panel,
    metrics: &[RunMetrics],
    x0: f64,
    y0: f64,
) -> std::fmt::Result {
    let plot_left = x0 + MARGIN;
    let plot_bottom = y0 + PANEL_HEIGHT - MARGIN;
    let plot_width = PANEL_WIDTH - 2.0 * MARGIN;
    let plot_height = PANEL_HEIGHT - 2.5 * MARGIN;

    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="13" font-weight="bold">{}</text>"#,
        x0 + PANEL_WIDTH / 2.0,
        y0 + MARGIN * 0.75,
        panel.title
    )?;
    writeln!(
        svg,
        r##"<line x1="{plot_left}" y1="{plot_bottom}" x2="{}" y2="{plot_bottom}" stroke="#333"/>"##,
        plot_left + plot_width
    )?;

    let values: Vec<f64> = metrics.iter().map(|m| (panel.value)(m).max(0.0)).collect();
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { plot_height / max } else { 0.0 };
    let slot = plot_width / values.len().max(1) as f64;
    let bar_width = slot * 0.6;

    for (i, (m, value)) in metrics.iter().zip(&values).enumerate() {
        let bar_height = value * scale;
        let x = plot_left + slot * i as f64 + (slot - bar_width) / 2.0;
        let y = plot_bottom - bar_height;
        let label = if panel.integer {
            format!("{value:.0}")
        } else {
            format!("{value:.3}")
        };

        writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{bar_height:.1}" fill="{}"/>"#,
            COLORS[i % COLORS.len()]
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{label}</text>"#,
            x + bar_width / 2.0,
            y - 4.0
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            x + bar_width / 2.0,
            plot_bottom + 14.0,
            m.strategy.label()
        )?;
    }
    Ok(())
}


pub fn write_chart(dir: &Path, metrics: &[RunMetrics]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(CHART_FILE);
    fs::write(&path, render_comparison(metrics)?)?;
    Ok(path)
}
