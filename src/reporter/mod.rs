//! Dashboard rendering.
//!
//! `HtmlReporter` writes one self-contained HTML page; [`terminal`] draws the
//! same sections to a terminal, one tab at a time.

pub mod terminal;

pub use terminal::TerminalRenderer;

use crate::errors::{ScopeError, ScopeResult};
use crate::models::SecurityLevel;
use crate::view::charts::{BarChart, ConfidenceBar, SliceChart};
use crate::view::protocols::ProtocolCard;
use crate::view::{CategoryTable, ControlFlowGraph, DashboardView, ProtocolBreakdown, TableRow};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// HTML report generator for a built dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReporter;

impl HtmlReporter {
    pub fn new() -> Self {
        Self
    }

    /// Write the report; a missing `.html` extension is added.
    pub fn generate_report(&self, view: &DashboardView, output: &Path) -> ScopeResult<PathBuf> {
        let path = if output.extension().is_some() {
            output.to_path_buf()
        } else {
            output.with_extension("html")
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScopeError::io(e, parent.to_path_buf()))?;
        }
        std::fs::write(&path, self.generate_html(view)).map_err(|e| ScopeError::io(e, path.clone()))?;
        log::info!("HTML report generated: {}", path.display());
        Ok(path)
    }

    pub fn generate_html(&self, view: &DashboardView) -> String {
        let header = &view.header;
        let file_line = header
            .file_line
            .as_deref()
            .map(escape_html)
            .unwrap_or_default();

        let tables: String = view.tables.iter().map(Self::category_table).collect();

        let summary = if view.protocol_summary.is_empty() {
            r#"<p class="dim">No protocols detected</p>"#.to_string()
        } else {
            view.protocol_summary
                .iter()
                .map(|p| {
                    format!(
                        r#"<div class="proto-chip"><b>{}</b><span>{}</span></div>"#,
                        escape_html(&p.name),
                        escape_html(&p.active_phases.join(" · "))
                    )
                })
                .collect()
        };

        let protocols = view
            .breakdown
            .as_ref()
            .map(Self::protocol_section)
            .unwrap_or_else(|| r#"<p class="dim">No protocol breakdown available</p>"#.to_string());

        let cfg = view
            .cfg
            .as_ref()
            .map(Self::cfg_section)
            .unwrap_or_else(|| r#"<p class="dim">No algorithm detected</p>"#.to_string());

        let mut functions = String::new();
        for f in &view.functions {
            let _ = write!(
                functions,
                r#"<tr><td class="mono">{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>"#,
                escape_html(&f.address),
                escape_html(&f.function),
                escape_html(&f.classification),
                f.confidence
            );
        }

        let notes = Self::security_notes(view);

        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CRYPTOSCOPE // {title}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        :root {{
            --bg-dark: #050508;
            --bg-card: #0d0d14;
            --border: #232333;
            --text-main: #e0e0e0;
            --text-dim: #707080;
            --crypto: #00d9ff;
            --non-crypto: #ff9500;
            --high: #00ff88;
            --medium: #ffaa00;
            --low: #ff5555;
            --font-mono: 'JetBrains Mono', ui-monospace, monospace;
        }}
        body {{ background: var(--bg-dark); color: var(--text-main); font-family: var(--font-mono); font-size: 14px; line-height: 1.5; padding: 2rem; }}
        h1, h2, h3 {{ text-transform: uppercase; letter-spacing: 0.1em; margin-bottom: 0.75rem; }}
        h1 {{ color: var(--crypto); }}
        section {{ background: var(--bg-card); border: 1px solid var(--border); border-radius: 6px; padding: 1.25rem; margin-bottom: 1.5rem; }}
        .dim {{ color: var(--text-dim); }}
        .mono {{ font-family: var(--font-mono); }}
        .stats {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; }}
        .stat {{ border: 1px solid var(--border); padding: 0.75rem; border-radius: 4px; }}
        .stat-value {{ font-size: 1.6rem; color: var(--crypto); }}
        table {{ width: 100%; border-collapse: collapse; margin-bottom: 1rem; }}
        th, td {{ text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid var(--border); }}
        th {{ color: var(--text-dim); }}
        tr.starred td {{ color: var(--crypto); font-weight: bold; }}
        .tier {{ padding: 0.1rem 0.5rem; border-radius: 3px; font-size: 0.8rem; }}
        .tier-high {{ background: rgba(0,255,136,0.15); color: var(--high); }}
        .tier-medium {{ background: rgba(255,170,0,0.15); color: var(--medium); }}
        .tier-low {{ background: rgba(255,85,85,0.15); color: var(--low); }}
        .proto-chip {{ display: inline-flex; flex-direction: column; border: 1px solid var(--border); padding: 0.5rem 0.75rem; margin: 0 0.5rem 0.5rem 0; }}
        .charts {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 1.5rem; }}
        .donut {{ width: 160px; height: 160px; border-radius: 50%; margin: 0.5rem auto; }}
        .legend li {{ list-style: none; }}
        .swatch {{ display: inline-block; width: 10px; height: 10px; margin-right: 0.4rem; }}
        .bar-row {{ display: flex; align-items: center; gap: 0.5rem; margin: 0.25rem 0; }}
        .bar-label {{ width: 180px; }}
        .bar-track {{ flex: 1; background: var(--border); height: 10px; }}
        .bar-fill {{ height: 10px; }}
        .card {{ border: 1px solid var(--border); padding: 1rem; margin-bottom: 1rem; }}
        .phase.on {{ color: var(--high); }}
        .phase.off {{ color: var(--text-dim); }}
        .tag {{ display: inline-block; border: 1px solid var(--crypto); color: var(--crypto); padding: 0 0.4rem; margin: 0.2rem; font-size: 0.8rem; }}
        .cfg-block {{ border: 1px solid var(--crypto); padding: 0.75rem; margin: 0.5rem 0; }}
        .badge {{ background: rgba(0,217,255,0.15); color: var(--crypto); padding: 0 0.4rem; margin-left: 0.5rem; }}
        ul.notes li {{ margin: 0.3rem 0 0.3rem 1.2rem; }}
    </style>
</head>
<body>
    <h1>CryptoScope Analysis</h1>
    <p><b>{title}</b> <span class="dim">{file_line}</span></p>
    <p class="dim">Generated {generated}</p>

    <section>
        <h2>Overview</h2>
        <div class="stats">
            <div class="stat"><div class="dim">Crypto Functions</div><div class="stat-value">{crypto}</div></div>
            <div class="stat"><div class="dim">Non-Crypto Functions</div><div class="stat-value">{non_crypto}</div></div>
            <div class="stat"><div class="dim">Avg Confidence</div><div class="stat-value">{avg}</div></div>
            <div class="stat"><div class="dim">Protocol</div><div class="stat-value">{protocol}</div></div>
        </div>
        <p style="margin-top:1rem">Architecture: <b>{architecture}</b> | Detected: <b>{detected}</b> ({category}, {confidence:.1}%)</p>
    </section>

    <section>
        <h2>Algorithms</h2>
        {tables}
    </section>

    <section>
        <h2>Protocol Summary</h2>
        {summary}
    </section>

    <section>
        <h2>Protocols</h2>
        {protocols}
    </section>

    <section>
        <h2>Functions</h2>
        <table>
            <thead><tr><th>Address</th><th>Function</th><th>Classification</th><th>Confidence</th></tr></thead>
            <tbody>{functions}</tbody>
        </table>
    </section>

    <section>
        <h2>Control Flow</h2>
        {cfg}
    </section>

    <section>
        <h2>Security Notes</h2>
        <ul class="notes">{notes}</ul>
    </section>
</body>
</html>
"##,
            title = escape_html(&header.filename),
            file_line = file_line,
            generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            crypto = header.crypto_functions,
            non_crypto = header.non_crypto_functions,
            avg = header.avg_confidence_display(),
            protocol = escape_html(&header.protocol),
            architecture = escape_html(&view.architecture),
            detected = escape_html(&view.detected),
            category = escape_html(&view.category),
            confidence = view.confidence,
            tables = tables,
            summary = summary,
            protocols = protocols,
            functions = functions,
            cfg = cfg,
            notes = notes,
        )
    }

    fn category_table(table: &CategoryTable) -> String {
        let mut rows = String::new();
        for row in &table.rows {
            match row {
                TableRow::Placeholder { message } => {
                    let _ = write!(
                        rows,
                        r#"<tr><td colspan="3" class="dim">{}</td></tr>"#,
                        escape_html(message)
                    );
                }
                TableRow::Algorithm(algo) => {
                    let _ = write!(
                        rows,
                        r#"<tr class="algo-{}{}"><td>{}{}</td><td>{}</td><td><span class="tier tier-{}">{:.1}%</span></td></tr>"#,
                        algo.css_class(),
                        if algo.starred { " starred" } else { "" },
                        if algo.starred { "★ " } else { "" },
                        escape_html(&algo.name),
                        escape_html(&algo.architecture),
                        algo.tier.as_str(),
                        algo.confidence
                    );
                }
            }
        }

        format!(
            r#"<h3>{}</h3><table><thead><tr><th>Algorithm</th><th>Architecture</th><th>Confidence</th></tr></thead><tbody>{}</tbody></table>"#,
            escape_html(&table.category),
            rows
        )
    }

    fn protocol_section(breakdown: &ProtocolBreakdown) -> String {
        let stats = &breakdown.stats;
        let cards: String = breakdown.cards.iter().map(Self::protocol_card).collect();

        format!(
            r#"<div class="stats">
            <div class="stat"><div class="dim">Protocols</div><div class="stat-value">{}</div></div>
            <div class="stat"><div class="dim">Crypto Steps</div><div class="stat-value">{}</div></div>
            <div class="stat"><div class="dim">Non-Crypto Steps</div><div class="stat-value">{}</div></div>
            <div class="stat"><div class="dim">High Security</div><div class="stat-value">{}</div></div>
            <div class="stat"><div class="dim">Deprecated</div><div class="stat-value">{}</div></div>
        </div>
        <div class="charts">
            <div><h3>Crypto vs Non-Crypto</h3>{}</div>
            <div><h3>Security Levels</h3>{}</div>
            <div><h3>Protocol Types</h3>{}</div>
            <div><h3>Step Confidence</h3>{}</div>
        </div>
        {}"#,
            stats.protocol_count,
            stats.crypto_steps,
            stats.non_crypto_steps,
            stats.high_security,
            stats.deprecated,
            Self::donut(&breakdown.charts.distribution),
            Self::donut(&breakdown.charts.security),
            Self::bar_chart(&breakdown.charts.protocol_types),
            Self::confidence_bars(&breakdown.confidence_bars),
            cards
        )
    }

    fn donut(chart: &SliceChart) -> String {
        let total = chart.total();
        if total <= 0.0 {
            return r#"<p class="dim">No data</p>"#.to_string();
        }

        let mut stops = Vec::new();
        let mut start = 0.0;
        for slice in chart.visible_slices() {
            let end = start + slice.value / total * 100.0;
            stops.push(format!("{} {:.2}% {:.2}%", slice.color, start, end));
            start = end;
        }

        let legend: String = chart
            .slices
            .iter()
            .map(|s| {
                format!(
                    r#"<li><span class="swatch" style="background:{}"></span>{}: {} ({}%)</li>"#,
                    s.color, s.label, s.value, s.percent
                )
            })
            .collect();

        format!(
            r#"<div class="donut" style="background:conic-gradient({})"></div><ul class="legend">{}</ul>"#,
            stops.join(", "),
            legend
        )
    }

    fn bar_chart(chart: &BarChart) -> String {
        chart
            .bars
            .iter()
            .map(|bar| {
                format!(
                    r#"<div class="bar-row"><span class="bar-label">{}</span><div class="bar-track"><div class="bar-fill" style="width:{:.0}%;background:{}"></div></div><span>{:.2}</span></div>"#,
                    escape_html(&bar.label),
                    bar.height * 100.0,
                    bar.kind.color(),
                    bar.value
                )
            })
            .collect()
    }

    fn confidence_bars(bars: &[ConfidenceBar]) -> String {
        bars.iter()
            .map(|bar| {
                format!(
                    r#"<div class="bar-row"><span class="bar-label">{}</span><div class="bar-track"><div class="bar-fill" style="width:{:.1}%;background:{}"></div></div><span>{:.1}%</span></div>"#,
                    bar.label,
                    bar.confidence,
                    bar.kind.color(),
                    bar.confidence
                )
            })
            .collect()
    }

    fn protocol_card(card: &ProtocolCard) -> String {
        let phases: String = card
            .phases
            .iter()
            .map(|status| {
                format!(
                    r#"<div class="phase {}">{} {} <span class="dim">{}</span></div>"#,
                    if status.active { "on" } else { "off" },
                    status.phase.icon(),
                    status.phase.title(),
                    status.phase.description()
                )
            })
            .collect();
        let tags: String = card
            .function_tags
            .iter()
            .map(|tag| format!(r#"<span class="tag">{}</span>"#, tag))
            .collect();

        format!(
            r#"<div class="card"><h3>{} <span class="tier tier-{}">{}</span> <span class="dim">{:.1}%</span></h3><p class="dim">{}</p>{}<div>{}</div></div>"#,
            escape_html(&card.name),
            match card.security {
                SecurityLevel::High => "high",
                SecurityLevel::Medium => "medium",
                SecurityLevel::Low => "low",
            },
            card.security.label(),
            card.confidence,
            card.description,
            phases,
            tags
        )
    }

    fn cfg_section(cfg: &ControlFlowGraph) -> String {
        format!(
            r#"<h3>{}</h3>
        <div class="cfg-block mono">Round loop @ {} ({} instructions)<span class="badge">{}</span></div>
        <div class="cfg-block mono">{} @ {} ({} instructions)</div>
        <p>{}</p>
        <p class="dim">Pattern confidence: {}</p>"#,
            escape_html(&cfg.function_label),
            cfg.round_loop.address,
            cfg.round_loop.instructions,
            cfg.round_loop.tag.unwrap_or_default(),
            cfg.transform_label(),
            cfg.transform_block.address,
            cfg.transform_block.instructions,
            cfg.analysis,
            cfg.confidence
        )
    }

    fn security_notes(view: &DashboardView) -> String {
        let mut notes = Vec::new();

        if let Some(breakdown) = &view.breakdown {
            if breakdown.stats.deprecated > 0 {
                notes.push(format!(
                    "<li><strong>Deprecated Protocols:</strong> {} protocol(s) rely on SSL or MD5. Plan a migration to TLS 1.2+ and SHA-2.</li>",
                    breakdown.stats.deprecated
                ));
            }
            if breakdown.stats.high_security < breakdown.stats.protocol_count {
                notes.push("<li><strong>Partial Protocols:</strong> Some protocols skip handshake or key exchange phases. Confirm that session keys are negotiated, not hard-coded.</li>".to_string());
            }
        }
        if view.confidence < 60.0 {
            notes.push(format!(
                "<li><strong>Low Confidence:</strong> {} was detected at {:.1}%. Verify the classification manually.</li>",
                escape_html(&view.detected),
                view.confidence
            ));
        }

        if notes.is_empty() {
            notes.push("<li>No immediate actions required.</li>".to_string());
        }
        notes.join("\n")
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{demo_record, ProtocolDescriptor};
    use crate::view::DashboardView;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn view_with(mutate: impl FnOnce(&mut crate::models::AnalysisRecord)) -> DashboardView {
        let mut record = demo_record();
        mutate(&mut record);
        DashboardView::build(&record, &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b onclick="x">Tom & 'Jerry'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_record_text_is_escaped() {
        let view = view_with(|r| r.filename = "<script>alert(1)</script>.bin".to_string());
        let html = HtmlReporter::new().generate_html(&view);
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;.bin"));
    }

    #[test]
    fn test_demo_report_sections() {
        let view = view_with(|_| {});
        let html = HtmlReporter::new().generate_html(&view);
        assert!(html.contains("firmware_sample.bin"));
        assert!(html.contains("★ AES256"));
        assert!(html.contains("No protocol breakdown available"));
        assert!(html.contains("sub_401234 (AES256)"));
        assert_eq!(html.matches("<h3>").count(), 4);
    }

    #[test]
    fn test_deprecated_protocol_note() {
        let view = view_with(|r| {
            r.protocols = vec![ProtocolDescriptor::new("SSLv3", [true, true, true, true])];
        });
        let html = HtmlReporter::new().generate_html(&view);
        assert!(html.contains("Deprecated Protocols:</strong> 1 protocol(s)"));
        assert!(html.contains("conic-gradient("));
    }

    #[test]
    fn test_generate_report_adds_extension() {
        let dir = tempfile::tempdir().unwrap();
        let view = view_with(|_| {});
        let path = HtmlReporter::new()
            .generate_report(&view, &dir.path().join("out/report"))
            .unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
