use crate::error::DupResult;
use crate::partition::{Cluster, Clustering};
use crate::record::Contradiction;

/// Destination for the final reports of a run.
pub trait ReportSink<K> {
    fn write_clusters(&mut self, clusters: &[Cluster<K>]) -> DupResult<()>;
    fn write_contradictions(&mut self, log: &[Contradiction<K>], count: usize) -> DupResult<()>;

    /// Write both reports of a finished run.
    fn write_report(&mut self, clustering: &Clustering<K>) -> DupResult<()> {
        self.write_clusters(&clustering.clusters)?;
        self.write_contradictions(&clustering.contradictions, clustering.stats.contradictions)
    }
}
