use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use dupmap_core::{Cluster, ClusterStats, Contradiction, DupError, DupResult, ReportSink};

/// Closing line of the contradiction report.
pub fn contradiction_summary(count: usize) -> String {
    format!("{count} contradictions found where is_duplicate=0 but qids are in the same set.")
}

pub fn render_clusters<K: Display, W: Write>(out: &mut W, clusters: &[Cluster<K>]) -> io::Result<()> {
    for cluster in clusters {
        writeln!(out, "{cluster}")?;
    }
    Ok(())
}

pub fn render_contradictions<K: Display, W: Write>(
    out: &mut W,
    log: &[Contradiction<K>],
    count: usize,
) -> io::Result<()> {
    for entry in log {
        writeln!(out, "{entry}")?;
    }
    writeln!(out, "{}", contradiction_summary(count))
}

fn create(path: &Path) -> DupResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DupError::Io(format!("cannot create {}: {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| DupError::Io(format!("cannot create {}: {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

fn write_failed(path: &Path) -> impl FnOnce(io::Error) -> DupError + '_ {
    move |e| DupError::Io(format!("cannot write {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// FileReportSink
// ---------------------------------------------------------------------------

/// Writes the cluster and contradiction reports to two text files. Each file
/// is replaced, not appended to.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    clusters_path: PathBuf,
    contradictions_path: PathBuf,
}

impl FileReportSink {
    pub fn new(clusters_path: impl Into<PathBuf>, contradictions_path: impl Into<PathBuf>) -> Self {
        Self {
            clusters_path: clusters_path.into(),
            contradictions_path: contradictions_path.into(),
        }
    }

    pub fn clusters_path(&self) -> &Path {
        &self.clusters_path
    }

    pub fn contradictions_path(&self) -> &Path {
        &self.contradictions_path
    }
}

impl<K: Display> ReportSink<K> for FileReportSink {
    fn write_clusters(&mut self, clusters: &[Cluster<K>]) -> DupResult<()> {
        let path = &self.clusters_path;
        let mut out = create(path)?;
        render_clusters(&mut out, clusters)
            .and_then(|_| out.flush())
            .map_err(write_failed(path))?;
        info!(path = %path.display(), clusters = clusters.len(), "wrote cluster report");
        Ok(())
    }

    fn write_contradictions(&mut self, log: &[Contradiction<K>], count: usize) -> DupResult<()> {
        let path = &self.contradictions_path;
        let mut out = create(path)?;
        render_contradictions(&mut out, log, count)
            .and_then(|_| out.flush())
            .map_err(write_failed(path))?;
        info!(path = %path.display(), contradictions = count, "wrote contradiction report");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Collects rendered report lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub cluster_lines: Vec<String>,
    pub contradiction_lines: Vec<String>,
    pub summary: Option<String>,
}

impl<K: Display> ReportSink<K> for MemorySink {
    fn write_clusters(&mut self, clusters: &[Cluster<K>]) -> DupResult<()> {
        self.cluster_lines = clusters.iter().map(ToString::to_string).collect();
        Ok(())
    }

    fn write_contradictions(&mut self, log: &[Contradiction<K>], count: usize) -> DupResult<()> {
        self.contradiction_lines = log.iter().map(ToString::to_string).collect();
        self.summary = Some(contradiction_summary(count));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON summary
// ---------------------------------------------------------------------------

pub fn write_summary_json(path: &Path, stats: &ClusterStats) -> DupResult<()> {
    let json = serde_json::to_string_pretty(stats)?;
    let mut out = create(path)?;
    writeln!(out, "{json}")
        .and_then(|_| out.flush())
        .map_err(write_failed(path))?;
    info!(path = %path.display(), "wrote summary");
    Ok(())
}
