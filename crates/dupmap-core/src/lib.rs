pub mod engine;
pub mod error;
pub mod partition;
pub mod record;
pub mod sink;
pub mod union_find;

pub use engine::{ClusterEngine, Outcome};
pub use error::{DupError, DupResult};
pub use partition::{Cluster, ClusterStats, Clustering};
pub use record::{ColumnMap, ColumnNames, Contradiction, Label, RawRecord, RelationRecord};
pub use sink::ReportSink;
pub use union_find::{ClusterHandle, DisjointSet, Union};
