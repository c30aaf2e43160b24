//! Batching thresholds for the ingestion writer.

/// Nodes buffered before a flush by default.
pub const DEFAULT_NODE_BATCH_SIZE: usize = 10_000;

/// Ways buffered before a flush by default. Node-to-way rows travel with
/// their ways.
pub const DEFAULT_WAY_BATCH_SIZE: usize = 5_000;

/// How many entities [`build_geo_store`](super::build_geo_store) buffers
/// before writing a batch transaction.
///
/// Sizes below one are raised to one.
///
/// # Examples
/// ```
/// use radlnavi_data::IngestOptions;
///
/// let options = IngestOptions::default().with_node_batch_size(0).with_way_batch_size(250);
/// assert_eq!(options.node_batch_size(), 1);
/// assert_eq!(options.way_batch_size(), 250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    node_batch_size: usize,
    way_batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            node_batch_size: DEFAULT_NODE_BATCH_SIZE,
            way_batch_size: DEFAULT_WAY_BATCH_SIZE,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn with_node_batch_size(mut self, size: usize) -> Self {
        self.node_batch_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_way_batch_size(mut self, size: usize) -> Self {
        self.way_batch_size = size.max(1);
        self
    }

    #[must_use]
    pub const fn node_batch_size(&self) -> usize {
        self.node_batch_size
    }

    #[must_use]
    pub const fn way_batch_size(&self) -> usize {
        self.way_batch_size
    }
}
