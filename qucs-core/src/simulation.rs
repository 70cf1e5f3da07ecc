//! External simulator runs.
//!
//! The simulator is a separate program. A run writes the document next to
//! its dataset, starts the configured command and completes asynchronously.
//! Results are only applied through [`DocumentSet::apply_simulation`], which
//! first checks that the document is still open.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Notify;

use crate::document::{Document, DocumentId};
use crate::document_set::DocumentSet;
use crate::element::Complex;
use crate::error::Result;
use crate::format::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Document has no dataset file name")]
    NoDataSet,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// What to do with the results of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FollowUp {
    Reload,
    OpenDataDisplay,
    ShowBias,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub document: DocumentId,
    /// Exit code; `None` when the process was killed.
    pub status: Option<i32>,
    /// Number of lines the simulator wrote to stderr.
    pub warnings: usize,
    pub messages: Vec<String>,
    pub data_set: PathBuf,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SimulationReport {
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.status == Some(0)
    }
}

/// Stops a run from anywhere, including before `finish` is awaited.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<Notify>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.notify_one();
    }
}

#[derive(Debug)]
pub struct SimulationRun {
    document: DocumentId,
    child: Child,
    cancel: Arc<Notify>,
    data_set: PathBuf,
    started_at: DateTime<Utc>,
}

impl SimulationRun {
    /// Write the netlist and spawn the simulator for `doc`.
    pub fn start(doc: &Document) -> std::result::Result<Self, SimulationError> {
        let data_set = doc.data_set_path().ok_or(SimulationError::NoDataSet)?;
        let netlist = data_set.with_extension("net");
        std::fs::write(&netlist, doc.serialize())?;

        let simulator = &doc.settings().simulator;
        let input = netlist.to_string_lossy();
        let output = data_set.to_string_lossy();
        let args: Vec<String> = simulator
            .args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect();

        let child = Command::new(&simulator.program)
            .args(&args)
            .current_dir(doc.directory())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SimulationError::Spawn {
                program: simulator.program.clone(),
                source,
            })?;
        tracing::info!("Started {} for {}", simulator.program, doc.name());

        Ok(Self {
            document: doc.id(),
            child,
            cancel: Arc::new(Notify::new()),
            data_set,
            started_at: Utc::now(),
        })
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Wait for the simulator to exit (or be cancelled) and collect its
    /// diagnostics.
    pub async fn finish(mut self) -> std::result::Result<SimulationReport, SimulationError> {
        let stderr = self.child.stderr.take();
        let collect = async move {
            let mut messages = Vec::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    messages.push(line);
                }
            }
            messages
        };

        let cancel = self.cancel.clone();
        let child = &mut self.child;
        let wait = async move {
            tokio::select! {
                status = child.wait() => (status, false),
                _ = cancel.notified() => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill simulator: {}", e);
                    }
                    (child.wait().await, true)
                }
            }
        };

        let (messages, (status, cancelled)) = tokio::join!(collect, wait);
        let status = status?;
        let report = SimulationReport {
            document: self.document,
            status: status.code(),
            warnings: messages.len(),
            messages,
            data_set: self.data_set,
            cancelled,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        if report.cancelled {
            tracing::info!("Simulation cancelled");
        } else {
            tracing::info!(
                "Simulation finished with {:?} ({} warnings)",
                report.status,
                report.warnings
            );
        }
        Ok(report)
    }
}

/// Outstanding runs, one per document.
#[derive(Debug, Default)]
pub struct Simulations {
    runs: HashMap<DocumentId, CancelHandle>,
}

impl Simulations {
    pub fn register(&mut self, run: &SimulationRun) {
        self.runs.insert(run.document(), run.cancel_handle());
    }

    pub fn finished(&mut self, document: DocumentId) {
        self.runs.remove(&document);
    }

    pub fn is_running(&self, document: DocumentId) -> bool {
        self.runs.contains_key(&document)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Cancel every outstanding run, e.g. before exit.
    pub fn kill_all(&mut self) {
        for (_, handle) in self.runs.drain() {
            handle.cancel();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowUpOutcome {
    /// The document was closed while the simulator ran.
    DocumentClosed,
    /// The run failed or was cancelled.
    Failed,
    Reloaded(usize),
    OpenedDataDisplay(DocumentId),
    /// DC node voltages by net name.
    Bias(Vec<(String, Complex)>),
}

impl DocumentSet {
    pub fn apply_simulation(
        &mut self,
        report: &SimulationReport,
        follow_up: FollowUp,
    ) -> Result<FollowUpOutcome> {
        if !self.contains(report.document) {
            tracing::debug!("Simulated document {} is no longer open", report.document);
            return Ok(FollowUpOutcome::DocumentClosed);
        }
        if !report.succeeded() {
            return Ok(FollowUpOutcome::Failed);
        }
        let index = self.index_of(report.document)?;
        match follow_up {
            FollowUp::Reload => {
                let filled = self.docs[index].reload_results()?;
                Ok(FollowUpOutcome::Reloaded(filled))
            }
            FollowUp::OpenDataDisplay => {
                let display = self.open_data_display(report.document)?;
                if let Some(doc) = self.get_mut(display) {
                    doc.reload_results()?;
                }
                Ok(FollowUpOutcome::OpenedDataDisplay(display))
            }
            FollowUp::ShowBias => {
                let dataset = Dataset::load(&report.data_set)?;
                let doc = &self.docs[index];
                let mut bias = Vec::new();
                for net in doc.schematic().nets() {
                    let Some(name) = net.name else {
                        continue;
                    };
                    let value = dataset
                        .variable(&format!("{}.V", name))
                        .and_then(|v| v.values.first().copied());
                    if let Some(value) = value {
                        bias.push((name, value));
                    }
                }
                Ok(FollowUpOutcome::Bias(bias))
            }
        }
    }
}
