//! Typed result context shared between the steps of one flow run.
//!
//! The context holds at most one value per [`ValueKind`]. Storing a value of
//! a kind that is already present replaces it, so readers always see the
//! latest value written by an earlier step.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Payment, Product, ProductMetadata};

use super::error::FlowError;

/// Kinds of values a step may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Product,
    Payment,
    Metadata,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Payment => write!(f, "payment"),
            Self::Metadata => write!(f, "metadata"),
        }
    }
}

/// A value produced by a step, tagged with its kind
#[derive(Debug, Clone)]
pub enum FlowValue {
    Product(Product),
    Payment(Payment),
    Metadata(ProductMetadata),
}

impl FlowValue {
    /// The kind this value is stored under
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Product(_) => ValueKind::Product,
            Self::Payment(_) => ValueKind::Payment,
            Self::Metadata(_) => ValueKind::Metadata,
        }
    }
}

/// Maps a Rust type onto its slot in the context.
pub trait ContextValue: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> FlowValue;

    fn from_value(value: &FlowValue) -> Option<&Self>;

    fn from_owned(value: FlowValue) -> Option<Self>;
}

impl ContextValue for Product {
    const KIND: ValueKind = ValueKind::Product;

    fn into_value(self) -> FlowValue {
        FlowValue::Product(self)
    }

    fn from_value(value: &FlowValue) -> Option<&Self> {
        match value {
            FlowValue::Product(product) => Some(product),
            _ => None,
        }
    }

    fn from_owned(value: FlowValue) -> Option<Self> {
        match value {
            FlowValue::Product(product) => Some(product),
            _ => None,
        }
    }
}

impl ContextValue for Payment {
    const KIND: ValueKind = ValueKind::Payment;

    fn into_value(self) -> FlowValue {
        FlowValue::Payment(self)
    }

    fn from_value(value: &FlowValue) -> Option<&Self> {
        match value {
            FlowValue::Payment(payment) => Some(payment),
            _ => None,
        }
    }

    fn from_owned(value: FlowValue) -> Option<Self> {
        match value {
            FlowValue::Payment(payment) => Some(payment),
            _ => None,
        }
    }
}

impl ContextValue for ProductMetadata {
    const KIND: ValueKind = ValueKind::Metadata;

    fn into_value(self) -> FlowValue {
        FlowValue::Metadata(self)
    }

    fn from_value(value: &FlowValue) -> Option<&Self> {
        match value {
            FlowValue::Metadata(metadata) => Some(metadata),
            _ => None,
        }
    }

    fn from_owned(value: FlowValue) -> Option<Self> {
        match value {
            FlowValue::Metadata(metadata) => Some(metadata),
            _ => None,
        }
    }
}

/// In-memory relay of step results, keyed by value kind
#[derive(Debug, Default)]
pub struct ResultContext {
    values: HashMap<ValueKind, FlowValue>,
}

impl ResultContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a typed value, replacing any earlier value of the same kind
    pub fn store<T: ContextValue>(&mut self, value: T) {
        self.store_value(value.into_value());
    }

    /// Store an already tagged value
    pub fn store_value(&mut self, value: FlowValue) {
        self.values.insert(value.kind(), value);
    }

    /// Get the latest value of type `T`
    pub fn get<T: ContextValue>(&self) -> Result<&T, FlowError> {
        self.values
            .get(&T::KIND)
            .and_then(T::from_value)
            .ok_or(FlowError::MissingContextValue(T::KIND))
    }

    /// Whether a value of type `T` has been stored
    pub fn contains<T: ContextValue>(&self) -> bool {
        self.values.contains_key(&T::KIND)
    }

    /// Take ownership of the latest value of type `T`
    pub fn take<T: ContextValue>(&mut self) -> Result<T, FlowError> {
        self.values
            .remove(&T::KIND)
            .and_then(T::from_owned)
            .ok_or(FlowError::MissingContextValue(T::KIND))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
