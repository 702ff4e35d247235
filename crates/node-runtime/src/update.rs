//! Cancellable notifications delivered to `on_update` hooks

use crate::types::{Connection, ConnectionId};

/// What changed around a node
#[derive(Debug, Clone)]
pub enum NodeUpdateKind {
    /// A connection is about to be created
    NewConnection {
        connection: Connection,
        /// Type id of the source port
        source_type: String,
        /// Type id of the target port
        target_type: String,
    },
    /// A connection has just been removed
    RemoveConnection {
        id: ConnectionId,
        connection: Connection,
    },
}

/// Event handed to `on_update`. Any hook may cancel it.
#[derive(Debug, Clone)]
pub struct NodeUpdateEvent {
    pub kind: NodeUpdateKind,
    cancelled: bool,
}

impl NodeUpdateEvent {
    pub fn new(kind: NodeUpdateKind) -> Self {
        Self {
            kind,
            cancelled: false,
        }
    }

    pub fn new_connection(
        connection: Connection,
        source_type: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self::new(NodeUpdateKind::NewConnection {
            connection,
            source_type: source_type.into(),
            target_type: target_type.into(),
        })
    }

    pub fn remove_connection(id: ConnectionId, connection: Connection) -> Self {
        Self::new(NodeUpdateKind::RemoveConnection { id, connection })
    }

    /// Veto the change
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The connection this event is about
    pub fn connection(&self) -> &Connection {
        match &self.kind {
            NodeUpdateKind::NewConnection { connection, .. } => connection,
            NodeUpdateKind::RemoveConnection { connection, .. } => connection,
        }
    }

    /// Whether the given node is the receiving end of the connection
    pub fn targets(&self, node: &str) -> bool {
        self.connection().target == node
    }
}
