use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::path::Path;

use crate::engine::metrics;
use crate::errors::AppError;
use crate::models::params::StrategyParams;
use crate::models::result::{MonteCarloReport, ReturnCurves};

/// Format the final results block printed after a backtest run.
pub fn format_summary(ticker: &str, params: &StrategyParams, total_log_return: f64) -> String {
    let total_percent_return = metrics::percent_return(total_log_return);
    let rule = "=".repeat(40);
    format!(
        "\n{rule}\n FINAL RESULTS FOR {ticker}\n{rule}\n\
         Strategy Params:      {params}\n\
         Total Log Return:     {total_log_return:.4}\n\
         Total Profit/Loss:    {:.2}% (Real Value)\n{rule}\n",
        total_percent_return * 100.0
    )
}

/// Format the permutation-test results block.
pub fn format_mc_summary(ticker: &str, report: &MonteCarloReport) -> String {
    let rule = "=".repeat(40);
    format!(
        "\n{rule}\n PERMUTATION TEST FOR {ticker}\n{rule}\n\
         Strategy Params:      {}\n\
         Trials:               {}/{}\n\
         Real Score:           {:.4}\n\
         Null Mean / Median:   {:.4} / {:.4}\n\
         Percentile Rank:      {:.1}%\n\
         P-Value:              {:.4}\n{rule}\n",
        report.params,
        report.trials_completed,
        report.trials_requested,
        report.real_score,
        report.null_mean,
        report.null_median,
        report.percentile_rank * 100.0,
        report.p_value
    )
}

/// Write the strategy-comparison chart: buy-and-hold on the left,
/// strategy on the right, as inline SVG in a standalone HTML page.
pub fn write_comparison_html(
    curves: &ReturnCurves,
    ticker: &str,
    strategy_name: &str,
    path: &Path,
) -> Result<(), AppError> {
    let mut html = String::with_capacity(64 * 1024);

    write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{} vs {}</title>
<style>
:root {{
  --bg: #09090b; --card: #18181b; --border: #27272a; --fg: #fafafa;
  --muted: #a1a1aa; --red: #ef4444; --blue: #3b82f6;
}}
* {{ margin:0; padding:0; box-sizing:border-box; }}
body {{ background:var(--bg); color:var(--fg); font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif; padding:24px; max-width:1400px; margin:0 auto; }}
h1 {{ font-size:1.5rem; margin-bottom:8px; }}
h3 {{ font-size:0.95rem; margin-bottom:12px; }}
.timestamp {{ color:var(--muted); font-size:0.8rem; margin-bottom:24px; }}
.grid {{ display:grid; grid-template-columns:1fr 1fr; gap:16px; }}
.card {{ background:var(--card); border:1px solid var(--border); border-radius:8px; padding:16px; }}
.chart-container {{ width:100%; overflow-x:auto; }}
svg {{ display:block; }}
</style>
</head>
<body>
<h1>Strategy Comparison</h1>
<p class="timestamp">Generated: {}</p>
<div class="grid">
"#, ticker, strategy_name, chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).ok();

    write!(html, r#"<div class="card"><h3>{} — Log Returns</h3><div class="chart-container">"#, ticker).ok();
    write_curve_svg(&mut html, &curves.buy_hold, "#ef4444");
    html.push_str("</div></div>");

    write!(html, r#"<div class="card"><h3>{} — Log Strategy Returns</h3><div class="chart-container">"#, strategy_name).ok();
    write_curve_svg(&mut html, &curves.strategy, "#3b82f6");
    html.push_str("</div></div>");

    html.push_str("</div>\n</body></html>");

    let mut file = std::fs::File::create(path)
        .map_err(|e| AppError::FileWrite(format!("Cannot create HTML: {}", e)))?;
    file.write_all(html.as_bytes())
        .map_err(|e| AppError::FileWrite(e.to_string()))?;
    Ok(())
}

/// Render one cumulative-return curve as an SVG line chart.
fn write_curve_svg(html: &mut String, data: &[f64], color: &str) {
    if data.is_empty() {
        return;
    }

    let w: f64 = 620.0;
    let h: f64 = 300.0;
    let pad = 56.0;
    let chart_w = w - pad - 10.0;
    let chart_h = h - 40.0;

    // Downsample
    let max_pts = 500;
    let step = (data.len() / max_pts).max(1);
    let pts: Vec<f64> = data.iter().copied().step_by(step).collect();

    let min_v = pts.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let max_v = pts.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(0.0);
    let range = (max_v - min_v).max(1e-6);

    let x_step = chart_w / (pts.len() as f64 - 1.0).max(1.0);

    write!(html, r##"<svg width="100%" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" style="max-width:{}px">"##, w, h, w as i64).ok();

    // Grid lines
    for i in 0..5 {
        let y = 10.0 + chart_h * (i as f64 / 4.0);
        let val = max_v - range * (i as f64 / 4.0);
        write!(html, r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="#27272a" stroke-dasharray="3,3"/>"##, pad, y, w - 10.0, y).ok();
        write!(html, r##"<text x="{}" y="{:.1}" fill="#a1a1aa" font-size="10" text-anchor="end">{:.3}</text>"##, pad - 4.0, y + 3.0, val).ok();
    }

    // Line path
    let mut path = String::with_capacity(pts.len() * 20);
    for (i, v) in pts.iter().enumerate() {
        let x = pad + x_step * i as f64;
        let y = 10.0 + chart_h * (1.0 - (v - min_v) / range);
        if i == 0 {
            write!(path, "M{:.1},{:.1}", x, y).ok();
        } else {
            write!(path, " L{:.1},{:.1}", x, y).ok();
        }
    }
    write!(html, r##"<path d="{}" fill="none" stroke="{}" stroke-width="1.5"/>"##, path, color).ok();

    // Fill area down to the bottom of the chart
    let x_end = pad + x_step * (pts.len() - 1) as f64;
    write!(html, r##"<path d="{} L{:.1},{:.1} L{:.1},{:.1} Z" fill="{}" fill-opacity="0.1"/>"##,
        path, x_end, 10.0 + chart_h, pad, 10.0 + chart_h, color).ok();

    html.push_str("</svg>");
}

/// Write the Monte Carlo report as pretty-printed JSON.
pub fn write_mc_report_json(report: &MonteCarloReport, path: &Path) -> Result<(), AppError> {
    let document = serde_json::json!({
        "generated_at": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "report": report,
    });
    let mut file = std::fs::File::create(path)
        .map_err(|e| AppError::FileWrite(format!("Cannot create JSON: {}", e)))?;
    file.write_all(serde_json::to_string_pretty(&document)?.as_bytes())
        .map_err(|e| AppError::FileWrite(e.to_string()))?;
    Ok(())
}
