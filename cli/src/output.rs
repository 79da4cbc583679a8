//! Reporters that write monitor output to a terminal or a JSON-lines sink.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use supplywatch_core::{
    AssetEventReport, LedgerReport, MonitorPhase, MonitorSummary, SupplyReporter,
    UntrackedEventReport,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

// ─── Console ──────────────────────────────────────────────────────────────────

/// Human-readable progress lines. Mints print green, burns and clawbacks red.
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    color: bool,
}

impl ConsoleReporter<io::Stdout> {
    /// Colours are enabled only when stdout is a terminal.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self::new(out, color)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write output");
        }
    }
}

impl<W: Write + Send> SupplyReporter for ConsoleReporter<W> {
    fn configuration(&mut self, summary: &MonitorSummary) {
        let start = summary
            .start_ledger
            .map(|s| s.to_string())
            .unwrap_or_else(|| "latest".to_string());
        self.line("Configuration:");
        self.line(&format!("  Horizon:  {}", summary.feed_url));
        self.line(&format!("  Network:  {}", summary.network));
        self.line(&format!("  Asset:    {}", summary.asset));
        self.line(&format!("  Contract: {}", summary.contract_id));
        let mode = match summary.phase {
            MonitorPhase::Historical => "historical",
            MonitorPhase::Streaming => "streaming",
        };
        self.line(&format!("  Mode:     {mode}"));
        self.line(&format!("  Start:    {start}"));
    }

    fn ledger_processed(&mut self, report: &LedgerReport) {
        let time = report.processed_at.format("%H:%M:%S");
        self.line(&format!(
            "[{time}] PROCESSING LEDGER [{}]... SUPPLY: {}",
            report.sequence, report.supply
        ));
    }

    fn asset_event(&mut self, report: &AssetEventReport) {
        let color = if report.kind == "mint" { GREEN } else { RED };
        let text = format!("({}) -> {}", report.kind.to_uppercase(), report.amount);
        let painted = self.paint(color, &text);
        self.line(&painted);
    }

    fn untracked_event(&mut self, report: &UntrackedEventReport) {
        let text = format!("({}) no supply change", report.kind.to_uppercase());
        let painted = self.paint(DIM, &text);
        self.line(&painted);
    }
}

// ─── JSON lines ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    Configuration(&'a MonitorSummary),
    Ledger(&'a LedgerReport),
    AssetEvent(&'a AssetEventReport),
    UntrackedEvent(&'a UntrackedEventReport),
}

/// One JSON object per line, tagged with `"type"`.
pub struct JsonLinesReporter<W: Write + Send> {
    out: W,
}

impl JsonLinesReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: Line<'_>) {
        let res = serde_json::to_writer(&mut self.out, &line)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = res {
            tracing::warn!(error = %e, "failed to write output");
        }
    }
}

impl<W: Write + Send> SupplyReporter for JsonLinesReporter<W> {
    fn configuration(&mut self, summary: &MonitorSummary) {
        self.emit(Line::Configuration(summary));
    }

    fn ledger_processed(&mut self, report: &LedgerReport) {
        self.emit(Line::Ledger(report));
    }

    fn asset_event(&mut self, report: &AssetEventReport) {
        self.emit(Line::AssetEvent(report));
    }

    fn untracked_event(&mut self, report: &UntrackedEventReport) {
        self.emit(Line::UntrackedEvent(report));
    }
}
