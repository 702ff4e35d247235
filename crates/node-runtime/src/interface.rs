//! Port instances owned by node instances

use serde_json::Value;

use crate::interface_type::{BaseTypes, InterfaceTypeRef};

/// One typed input or output slot on a node instance.
///
/// Every node instance owns its own interfaces; definitions hand out
/// factories so that `value` and `interface_type` stay per-instance.
#[derive(Debug, Clone)]
pub struct NodeInterface {
    /// Data type, may be changed at runtime by the owning node
    pub interface_type: InterfaceTypeRef,
    /// Human-readable label
    pub title: String,
    /// Whether the interface renders and accepts a wire
    pub has_port: bool,
    /// Whether the UI shows the title next to the editor
    pub display_default_title: bool,
    /// Current value, used as the input when no connection feeds the port
    pub value: Option<Value>,
    /// Presentation hint only, never consulted during execution
    pub hide_when_connected: bool,
}

impl NodeInterface {
    pub fn new(title: impl Into<String>, interface_type: InterfaceTypeRef) -> Self {
        Self {
            interface_type,
            title: title.into(),
            has_port: true,
            display_default_title: true,
            value: None,
            hide_when_connected: true,
        }
    }

    /// Number port with a default of 0
    pub fn number(title: impl Into<String>) -> Self {
        Self::new(title, BaseTypes::number()).with_default_value(Value::from(0))
    }

    pub fn text(title: impl Into<String>) -> Self {
        Self::new(title, BaseTypes::string())
    }

    pub fn boolean(title: impl Into<String>) -> Self {
        Self::new(title, BaseTypes::boolean())
    }

    pub fn any(title: impl Into<String>) -> Self {
        Self::new(title, BaseTypes::any())
    }

    /// Output carrying a flow capability
    pub fn flow(title: impl Into<String>) -> Self {
        Self::new(title, BaseTypes::flow())
    }

    pub fn set_port(mut self, has_port: bool) -> Self {
        self.has_port = has_port;
        self
    }

    pub fn hide_default_title(mut self) -> Self {
        self.display_default_title = false;
        self
    }

    pub fn show_when_connected(mut self) -> Self {
        self.hide_when_connected = false;
        self
    }

    pub fn with_default_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Swap the data type of this interface
    pub fn set_type(&mut self, interface_type: InterfaceTypeRef) {
        self.interface_type = interface_type;
    }

    pub fn type_id(&self) -> &str {
        self.interface_type.id()
    }

    pub fn is_flow(&self) -> bool {
        self.interface_type.id() == BaseTypes::flow().id()
    }

    /// Current value, or null when none is configured
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}
