//! Terminal rendering of the dashboard, one tab at a time.

use crate::errors::ScopeResult;
use crate::presenter::{DashboardState, Tab, ViewMode};
use crate::view::charts::{BarChart, BarKind, SliceChart};
use crate::view::tables::ConfidenceTier;
use crate::view::{CategoryTable, ControlFlowGraph, DashboardView, ProtocolBreakdown, TableRow};
use console::{style, StyledObject};
use std::io::Write;

const BAR_WIDTH: usize = 24;

pub struct TerminalRenderer {
    bar_width: usize,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self {
            bar_width: BAR_WIDTH,
        }
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header, tab strip and the active tab.
    pub fn render<W: Write>(&self, out: &mut W, state: &DashboardState) -> ScopeResult<()> {
        self.render_header(out, state)?;
        match state.tab() {
            Tab::Overview => self.render_overview(out, &state.view, state.view_mode())?,
            Tab::Protocols => self.render_protocols(out, state.view.breakdown.as_ref())?,
            Tab::ControlFlow => self.render_cfg(out, state.view.cfg.as_ref())?,
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn render_reply<W: Write>(&self, out: &mut W, reply: &str) -> ScopeResult<()> {
        writeln!(out, "  {}", style("Assistant").magenta().bold())?;
        for line in reply.lines() {
            writeln!(out, "    {}", line)?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn render_header<W: Write>(&self, out: &mut W, state: &DashboardState) -> ScopeResult<()> {
        let header = &state.view.header;
        writeln!(out)?;
        writeln!(
            out,
            "  {} {}",
            style(&header.filename).white().bold(),
            style(format!("[{}]", state.source)).dim()
        )?;
        if let Some(line) = &header.file_line {
            writeln!(out, "  {}", style(line).dim())?;
        }

        let tabs: Vec<String> = Tab::ALL
            .iter()
            .map(|tab| {
                if *tab == state.tab() {
                    style(format!("[{}]", tab.title())).cyan().bold().to_string()
                } else {
                    style(format!(" {} ", tab.title())).dim().to_string()
                }
            })
            .collect();
        writeln!(out, "  {}", tabs.join("  "))?;
        writeln!(out, "  {}", style("─".repeat(60)).dim())?;
        Ok(())
    }

    fn render_overview<W: Write>(
        &self,
        out: &mut W,
        view: &DashboardView,
        mode: ViewMode,
    ) -> ScopeResult<()> {
        let header = &view.header;
        writeln!(
            out,
            "  Crypto functions: {}   Non-crypto: {}   Avg confidence: {}   Protocol: {}",
            style(header.crypto_functions).cyan().bold(),
            style(header.non_crypto_functions).yellow(),
            style(header.avg_confidence_display()).green(),
            style(&header.protocol).white().bold()
        )?;
        writeln!(
            out,
            "  Architecture: {}   Detected: {} ({}, {:.1}%)",
            view.architecture,
            style(&view.detected).cyan().bold(),
            view.category,
            view.confidence
        )?;

        if !view.protocol_summary.is_empty() {
            writeln!(out)?;
            writeln!(out, "  {}", style("Protocols").white().bold())?;
            for summary in &view.protocol_summary {
                writeln!(
                    out,
                    "    {} {}",
                    style(&summary.name).cyan(),
                    style(summary.active_phases.join(" · ")).dim()
                )?;
            }
        }

        for table in &view.tables {
            writeln!(out)?;
            self.render_table(out, table, mode)?;
        }

        if !view.functions.is_empty() {
            writeln!(out)?;
            writeln!(out, "  {}", style("Functions").white().bold())?;
            for f in &view.functions {
                writeln!(
                    out,
                    "    {}  {:<24} {:<20} {:.1}%",
                    style(&f.address).dim(),
                    f.function,
                    f.classification,
                    f.confidence
                )?;
            }
        }
        Ok(())
    }

    fn render_table<W: Write>(&self, out: &mut W, table: &CategoryTable, mode: ViewMode) -> ScopeResult<()> {
        writeln!(out, "  {}", style(&table.category).white().bold())?;
        for row in &table.rows {
            match row {
                TableRow::Placeholder { message } => {
                    writeln!(out, "    {}", style(message).dim())?;
                }
                TableRow::Algorithm(algo) => {
                    let marker = if algo.starred { "★" } else { " " };
                    let confidence = tier_style(algo.tier, format!("{:5.1}%", algo.confidence));
                    match mode {
                        ViewMode::Table => writeln!(
                            out,
                            "  {} {:<16} {:<16} {}",
                            style(marker).cyan().bold(),
                            algo.name,
                            algo.architecture,
                            confidence
                        )?,
                        ViewMode::Graph => writeln!(
                            out,
                            "  {} {:<16} {} {}",
                            style(marker).cyan().bold(),
                            algo.name,
                            tier_style(algo.tier, self.bar(algo.confidence / 100.0)),
                            confidence
                        )?,
                    }
                }
            }
        }
        Ok(())
    }

    fn render_protocols<W: Write>(&self, out: &mut W, breakdown: Option<&ProtocolBreakdown>) -> ScopeResult<()> {
        let Some(breakdown) = breakdown else {
            writeln!(out, "  {}", style("No protocol breakdown available").dim())?;
            return Ok(());
        };

        let stats = &breakdown.stats;
        writeln!(
            out,
            "  Protocols: {}   Crypto steps: {}   Non-crypto steps: {}   High security: {}   Deprecated: {}",
            style(stats.protocol_count).cyan().bold(),
            style(stats.crypto_steps).cyan(),
            style(stats.non_crypto_steps).yellow(),
            style(stats.high_security).green(),
            style(stats.deprecated).red()
        )?;

        writeln!(out)?;
        writeln!(out, "  {}", style("Crypto vs Non-Crypto").white().bold())?;
        self.render_slices(out, &breakdown.charts.distribution)?;
        writeln!(out, "  {}", style("Security Levels").white().bold())?;
        self.render_slices(out, &breakdown.charts.security)?;
        writeln!(out, "  {}", style("Protocol Types").white().bold())?;
        self.render_bars(out, &breakdown.charts.protocol_types)?;

        writeln!(out, "  {}", style("Step Confidence").white().bold())?;
        for bar in &breakdown.confidence_bars {
            writeln!(
                out,
                "    {:<24} {} {:.1}%",
                bar.label,
                kind_style(bar.kind, self.bar(bar.confidence / 100.0)),
                bar.confidence
            )?;
        }

        for card in &breakdown.cards {
            writeln!(out)?;
            writeln!(
                out,
                "  {} {} {}",
                style(&card.name).cyan().bold(),
                style(card.security.label()).yellow(),
                style(format!("{:.1}%", card.confidence)).dim()
            )?;
            writeln!(out, "    {}", style(card.description).dim())?;
            for status in &card.phases {
                let mark = if status.active {
                    style("●").green()
                } else {
                    style("○").dim()
                };
                writeln!(out, "    {} {} {}", mark, status.phase.icon(), status.phase.title())?;
            }
            if !card.function_tags.is_empty() {
                writeln!(out, "    {}", style(card.function_tags.join(", ")).cyan())?;
            }
        }
        Ok(())
    }

    fn render_slices<W: Write>(&self, out: &mut W, chart: &SliceChart) -> ScopeResult<()> {
        let total = chart.total();
        for slice in &chart.slices {
            let fraction = if total > 0.0 { slice.value / total } else { 0.0 };
            writeln!(
                out,
                "    {:<12} {} {} ({}%)",
                slice.label,
                self.bar(fraction),
                slice.value,
                slice.percent
            )?;
        }
        Ok(())
    }

    fn render_bars<W: Write>(&self, out: &mut W, chart: &BarChart) -> ScopeResult<()> {
        for bar in &chart.bars {
            writeln!(
                out,
                "    {:<12} {} {:.2}",
                bar.label,
                kind_style(bar.kind, self.bar(bar.height)),
                bar.value
            )?;
        }
        Ok(())
    }

    fn render_cfg<W: Write>(&self, out: &mut W, cfg: Option<&ControlFlowGraph>) -> ScopeResult<()> {
        let Some(cfg) = cfg else {
            writeln!(out, "  {}", style("No algorithm detected").dim())?;
            return Ok(());
        };

        writeln!(out, "  {}", style(&cfg.function_label).cyan().bold())?;
        writeln!(out, "    ┌──────────────────────────────┐")?;
        writeln!(
            out,
            "    │ {} ({} insns) │ {}",
            cfg.round_loop.address,
            cfg.round_loop.instructions,
            style(cfg.round_loop.tag.unwrap_or_default()).yellow()
        )?;
        writeln!(out, "    └──────────────┬───────────────┘")?;
        writeln!(out, "                   ▼")?;
        writeln!(out, "    ┌──────────────────────────────┐")?;
        writeln!(
            out,
            "    │ {} ({} insns) │ {}",
            cfg.transform_block.address,
            cfg.transform_block.instructions,
            style(cfg.transform_label()).yellow()
        )?;
        writeln!(out, "    └──────────────────────────────┘")?;
        writeln!(out)?;
        writeln!(out, "  {}", cfg.analysis)?;
        writeln!(out, "  Confidence: {}", style(cfg.confidence).green().bold())?;
        Ok(())
    }

    /// Fixed-width bar for a 0-1 fraction.
    fn bar(&self, fraction: f64) -> String {
        let filled = ((fraction.clamp(0.0, 1.0) * self.bar_width as f64).round()) as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(self.bar_width - filled))
    }
}

fn tier_style(tier: ConfidenceTier, text: String) -> StyledObject<String> {
    match tier {
        ConfidenceTier::High => style(text).green(),
        ConfidenceTier::Medium => style(text).yellow(),
        ConfidenceTier::Low => style(text).red(),
    }
}

fn kind_style(kind: BarKind, text: String) -> StyledObject<String> {
    match kind {
        BarKind::Crypto => style(text).cyan(),
        BarKind::NonCrypto => style(text).yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantContext;
    use crate::models::{demo_record, ProtocolDescriptor};
    use crate::presenter::UiAction;
    use crate::resolver::ResultSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(protocols: Vec<ProtocolDescriptor>) -> DashboardState {
        let mut record = demo_record();
        record.protocols = protocols;
        let view = DashboardView::build(&record, &mut StdRng::seed_from_u64(11));
        DashboardState::new(view, ResultSource::Demo, AssistantContext::default())
    }

    fn render(state: &DashboardState) -> String {
        let mut buf = Vec::new();
        TerminalRenderer::new().render(&mut buf, state).unwrap();
        console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).into_owned()
    }

    #[test]
    fn test_overview_tab() {
        let output = render(&state(Vec::new()));
        assert!(output.contains("firmware_sample.bin [Demo]"));
        assert!(output.contains("[Overview]"));
        assert!(output.contains("Avg confidence: 94.2%"));
        assert!(output.contains("★ AES256"));
        assert_eq!(output.matches('★').count(), 1);
    }

    #[test]
    fn test_graph_mode_draws_bars() {
        let mut state = state(Vec::new());
        state.apply(UiAction::ToggleView);
        let output = render(&state);
        let starred = output
            .lines()
            .find(|line| line.contains("★ AES256"))
            .unwrap();
        assert!(starred.contains('█'));
        assert!(!starred.contains("ARM64"));
    }

    #[test]
    fn test_protocols_tab_without_protocols() {
        let mut state = state(Vec::new());
        state.apply(UiAction::SelectTab(Tab::Protocols));
        assert!(render(&state).contains("No protocol breakdown available"));
    }

    #[test]
    fn test_protocols_tab_with_breakdown() {
        let mut state = state(vec![
            ProtocolDescriptor::new("TLS 1.2", [true, true, false, false]),
            ProtocolDescriptor::new("SSLv3", [true, false, false, false]),
        ]);
        state.apply(UiAction::SelectTab(Tab::Protocols));
        let output = render(&state);
        assert!(output.contains("Crypto steps: 3"));
        assert!(output.contains("Non-crypto steps: 5"));
        assert!(output.contains("Deprecated: 1"));
        assert!(output.contains("client_hello, server_hello"));
    }

    #[test]
    fn test_cfg_tab() {
        let mut state = state(Vec::new());
        state.apply(UiAction::SelectTab(Tab::ControlFlow));
        let output = render(&state);
        assert!(output.contains("sub_401234 (AES256)"));
        assert!(output.contains("MixColumns"));
        assert!(output.contains("Confidence: 98.1%"));
    }

    #[test]
    fn test_bar_width() {
        let renderer = TerminalRenderer::new();
        assert_eq!(renderer.bar(0.5).chars().filter(|c| *c == '█').count(), 12);
        assert_eq!(renderer.bar(2.0).chars().count(), BAR_WIDTH);
    }
}
