//! Dot-segmented path resolution.
//!
//! Both entry points start at an explicit parent, or Root when `None`, and
//! walk `.`-separated segments left to right. An empty path resolves to the
//! parent itself. A Sink start point absorbs the whole path.

use datasource_core::NodeId;
use tracing::{error, warn};

use crate::pool::DatasourcePool;

impl DatasourcePool {
    /// Resolve `path` under `parent`, creating every missing segment.
    ///
    /// New nodes are spliced at the head of their parent's child list. When
    /// the pool runs out of slots the walk stops and the Sink
    /// ([`NodeId::INVALID`]) is returned, so callers degrade to no-op writes.
    pub fn find_or_create(&mut self, parent: Option<NodeId>, path: &str) -> NodeId {
        let mut current = parent.unwrap_or(NodeId::ROOT);
        if self.node(current).is_sink() {
            return NodeId::INVALID;
        }

        if path.is_empty() {
            return current;
        }

        for segment in path.split('.') {
            let name = self.names_mut().intern(segment);
            current = match self.child_named(current, name) {
                Some(child) => child,
                None => match self.attach_child(current, name) {
                    Ok(child) => child,
                    Err(err) => {
                        error!(%err, path, "failed to create datasource, falling back to the sink");
                        return NodeId::INVALID;
                    }
                },
            };
        }
        current
    }

    /// Resolve `path` under `parent` without creating anything.
    ///
    /// Returns `None` as soon as a segment has no matching child. A segment
    /// that was never interned fails without scanning, since no node can
    /// carry that name. A Sink start point yields `Some(NodeId::INVALID)`.
    pub fn find(&self, parent: Option<NodeId>, path: &str) -> Option<NodeId> {
        let mut current = parent.unwrap_or(NodeId::ROOT);
        if self.node(current).is_sink() {
            return Some(NodeId::INVALID);
        }

        if path.is_empty() {
            return Some(current);
        }

        for segment in path.split('.') {
            let name = self.names().lookup(segment)?;
            current = self.child_named(current, name)?;
        }
        Some(current)
    }

    /// Single-segment [`find_or_create`](Self::find_or_create).
    ///
    /// The name is taken verbatim, dots included. An empty name yields the
    /// Sink.
    pub fn find_or_create_child(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        if name.is_empty() {
            warn!("refusing to create a datasource with an empty name");
            return NodeId::INVALID;
        }

        let parent = parent.unwrap_or(NodeId::ROOT);
        if self.node(parent).is_sink() {
            return NodeId::INVALID;
        }

        let symbol = self.names_mut().intern(name);
        if let Some(child) = self.child_named(parent, symbol) {
            return child;
        }
        match self.attach_child(parent, symbol) {
            Ok(child) => child,
            Err(err) => {
                error!(%err, name, "failed to create datasource, falling back to the sink");
                NodeId::INVALID
            }
        }
    }

    /// Single-segment [`find`](Self::find). An empty name yields `None`.
    pub fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }

        let parent = parent.unwrap_or(NodeId::ROOT);
        if self.node(parent).is_sink() {
            return Some(NodeId::INVALID);
        }

        let symbol = self.names().lookup(name)?;
        self.child_named(parent, symbol)
    }
}
