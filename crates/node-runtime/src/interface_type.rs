//! Interface types and their conversion rules
//!
//! A [`NodeInterfaceType`] identifies the logical data type of a port.
//! Compatibility between two types is one-way and is resolved into a
//! [`Compatibility`] value so the wildcard rules can be inspected on
//! their own:
//!
//! - equal ids are always compatible
//! - a target of type `ANY` accepts everything, and an `ANY` source
//!   feeds everything
//! - a type may declare conversions to named target ids
//! - a declared conversion to `ANY` makes the type pass through to any target
//!
//! Types are shared by reference ([`InterfaceTypeRef`]). Edits to the
//! conversion table are visible to every interface holding the type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;

/// Id of the wildcard type
pub const ANY_TYPE_ID: &str = "ANY";

/// Shared handle to an interface type
pub type InterfaceTypeRef = Arc<NodeInterfaceType>;

/// A value conversion registered on a source type
pub type ConversionFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// One entry in a type's conversion table
#[derive(Clone)]
pub enum ConversionRule {
    /// Values are handed over unchanged
    PassThrough,
    /// Values are transformed by the function
    Convert(ConversionFn),
}

impl fmt::Debug for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThrough => write!(f, "PassThrough"),
            Self::Convert(_) => write!(f, "Convert(..)"),
        }
    }
}

/// How a value of one type reaches a port of another
#[derive(Clone)]
pub enum Compatibility {
    /// Same type id
    Identical,
    /// One side is `ANY`
    Wildcard,
    /// The source declares a conversion to the target id
    Converted(ConversionFn),
    /// The source declares a conversion to `ANY`, values pass unchanged
    PassThrough,
    /// No rule connects the two types
    Incompatible,
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Compatibility::Incompatible)
    }
}

impl fmt::Debug for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical => write!(f, "Identical"),
            Self::Wildcard => write!(f, "Wildcard"),
            Self::Converted(_) => write!(f, "Converted(..)"),
            Self::PassThrough => write!(f, "PassThrough"),
            Self::Incompatible => write!(f, "Incompatible"),
        }
    }
}

/// The logical data type of a port
pub struct NodeInterfaceType {
    id: String,
    color: String,
    conversions: RwLock<HashMap<String, ConversionRule>>,
}

impl NodeInterfaceType {
    /// Create a type with no conversions
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: "#fff".to_string(),
            conversions: RwLock::new(HashMap::new()),
        }
    }

    /// Set the display color (ignored by the runtime)
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Declare a conversion to the target type id
    pub fn with_conversion(
        self,
        target: impl Into<String>,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.add_conversion(target, f);
        self
    }

    /// Declare that values of this type may feed any port unchanged
    pub fn with_passthrough(self) -> Self {
        self.conversions
            .write()
            .insert(ANY_TYPE_ID.to_string(), ConversionRule::PassThrough);
        self
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> InterfaceTypeRef {
        Arc::new(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn is_any(&self) -> bool {
        self.id == ANY_TYPE_ID
    }

    /// Register (or replace) a conversion on a live type
    pub fn add_conversion(
        &self,
        target: impl Into<String>,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) {
        self.conversions
            .write()
            .insert(target.into(), ConversionRule::Convert(Arc::new(f)));
    }

    /// Drop a conversion; returns whether one existed
    pub fn remove_conversion(&self, target: &str) -> bool {
        self.conversions.write().remove(target).is_some()
    }

    /// Ids this type declares conversions to
    pub fn conversion_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.conversions.read().keys().cloned().collect();
        targets.sort();
        targets
    }

    /// Resolve how values of this type reach a port of `target`
    pub fn compatibility_with(&self, target: &NodeInterfaceType) -> Compatibility {
        if self.id == target.id {
            return Compatibility::Identical;
        }
        if target.is_any() {
            return Compatibility::Wildcard;
        }

        let conversions = self.conversions.read();
        if let Some(rule) = conversions.get(&target.id) {
            return match rule {
                ConversionRule::PassThrough => Compatibility::PassThrough,
                ConversionRule::Convert(f) => Compatibility::Converted(f.clone()),
            };
        }
        if self.is_any() {
            return Compatibility::Wildcard;
        }
        if conversions.contains_key(ANY_TYPE_ID) {
            return Compatibility::PassThrough;
        }
        Compatibility::Incompatible
    }

    pub fn can_connect_with(&self, target: &NodeInterfaceType) -> bool {
        self.compatibility_with(target).is_compatible()
    }

    /// Convert a value of this type for a port of `target`.
    ///
    /// Returns `Value::Null` when the pair is incompatible.
    pub fn convert_to(&self, target: &NodeInterfaceType, value: Value) -> Value {
        match self.compatibility_with(target) {
            Compatibility::Identical | Compatibility::Wildcard | Compatibility::PassThrough => value,
            Compatibility::Converted(f) => f(value),
            Compatibility::Incompatible => Value::Null,
        }
    }
}

impl fmt::Debug for NodeInterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInterfaceType")
            .field("id", &self.id)
            .field("color", &self.color)
            .field("conversions", &self.conversion_targets())
            .finish()
    }
}

impl PartialEq for NodeInterfaceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

fn value_to_string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        Value::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

static ANY: Lazy<InterfaceTypeRef> = Lazy::new(|| NodeInterfaceType::new(ANY_TYPE_ID).shared());

static NUMBER: Lazy<InterfaceTypeRef> = Lazy::new(|| {
    NodeInterfaceType::new("number")
        .with_color("#2f904b")
        .with_conversion("string", value_to_string)
        .shared()
});

static STRING: Lazy<InterfaceTypeRef> =
    Lazy::new(|| NodeInterfaceType::new("string").with_color("#eeab2c").shared());

static BOOLEAN: Lazy<InterfaceTypeRef> = Lazy::new(|| {
    NodeInterfaceType::new("boolean")
        .with_color("#c0392b")
        .with_conversion("string", value_to_string)
        .with_conversion("number", |v| match v.as_bool() {
            Some(b) => Value::from(if b { 1 } else { 0 }),
            None => Value::Null,
        })
        .shared()
});

static FLOW: Lazy<InterfaceTypeRef> =
    Lazy::new(|| NodeInterfaceType::new("flow").with_color("#ffffff").shared());

/// The interface types every tree understands
pub struct BaseTypes;

impl BaseTypes {
    pub fn any() -> InterfaceTypeRef {
        ANY.clone()
    }

    pub fn number() -> InterfaceTypeRef {
        NUMBER.clone()
    }

    pub fn string() -> InterfaceTypeRef {
        STRING.clone()
    }

    pub fn boolean() -> InterfaceTypeRef {
        BOOLEAN.clone()
    }

    /// Type of flow pseudo-ports and flow-capability outputs
    pub fn flow() -> InterfaceTypeRef {
        FLOW.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_and_wildcard() {
        let a = NodeInterfaceType::new("a");
        let a2 = NodeInterfaceType::new("a");
        let any = NodeInterfaceType::new(ANY_TYPE_ID);

        assert!(matches!(a.compatibility_with(&a2), Compatibility::Identical));
        assert!(matches!(a.compatibility_with(&any), Compatibility::Wildcard));
        assert!(matches!(any.compatibility_with(&a), Compatibility::Wildcard));
        assert_eq!(a.convert_to(&any, json!(3)), json!(3));
        assert_eq!(any.convert_to(&a, json!("x")), json!("x"));
    }

    #[test]
    fn test_conversions_are_one_way() {
        let num = NodeInterfaceType::new("num").with_conversion("str", |v| json!(format!("#{}", v)));
        let s = NodeInterfaceType::new("str");

        assert!(num.can_connect_with(&s));
        assert!(!s.can_connect_with(&num));
        assert_eq!(num.convert_to(&s, json!(4)), json!("#4"));
        assert_eq!(s.convert_to(&num, json!("4")), Value::Null);
    }

    #[test]
    fn test_conversion_to_any_passes_through() {
        let loose = NodeInterfaceType::new("loose").with_passthrough();
        let strict = NodeInterfaceType::new("strict");

        assert!(matches!(loose.compatibility_with(&strict), Compatibility::PassThrough));
        assert_eq!(loose.convert_to(&strict, json!([1, 2])), json!([1, 2]));

        let with_fn = NodeInterfaceType::new("fn").with_conversion(ANY_TYPE_ID, |_| json!("ignored"));
        assert!(with_fn.can_connect_with(&strict));
        assert_eq!(with_fn.convert_to(&strict, json!(7)), json!(7));
    }

    #[test]
    fn test_named_conversion_wins_over_any_passthrough() {
        let t = NodeInterfaceType::new("t")
            .with_passthrough()
            .with_conversion("u", |_| json!("converted"));
        let u = NodeInterfaceType::new("u");
        assert_eq!(t.convert_to(&u, json!(1)), json!("converted"));
    }

    #[test]
    fn test_live_table_edits_affect_shared_handles() {
        let src = NodeInterfaceType::new("src").shared();
        let dst = NodeInterfaceType::new("dst");
        let held_by_port = src.clone();

        assert!(!held_by_port.can_connect_with(&dst));
        src.add_conversion("dst", |v| v);
        assert!(held_by_port.can_connect_with(&dst));
        assert!(src.remove_conversion("dst"));
        assert!(!held_by_port.can_connect_with(&dst));
        assert!(!src.remove_conversion("dst"));
    }

    #[test]
    fn test_base_types() {
        let number = BaseTypes::number();
        let string = BaseTypes::string();
        assert!(number.can_connect_with(&string));
        assert!(!string.can_connect_with(&number));
        assert_eq!(number.convert_to(&string, json!(5)), json!("5"));
        assert_eq!(BaseTypes::boolean().convert_to(&number, json!(true)), json!(1));
        assert!(Arc::ptr_eq(&BaseTypes::any(), &BaseTypes::any()));
        assert!(!BaseTypes::flow().can_connect_with(&number));
    }
}
