use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

type Encoder = fn(&(dyn Any + Send + Sync + 'static)) -> Option<serde_json::Value>;

/// A type-erased, reference-counted state value.
///
/// Wraps `Arc<dyn Any + Send + Sync>` for zero-copy sharing across
/// readers. Values built with [`StateValue::new`] also remember how to
/// encode themselves as JSON, which is what crosses the FFI boundary to
/// the mobile shells.
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn Any + Send + Sync>,
    encode: Option<Encoder>,
}

impl StateValue {
    /// Wrap a serializable state value.
    pub fn new<T: Any + Send + Sync + Serialize>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            encode: Some(encode_as::<T>),
        }
    }

    /// Wrap a value that never leaves the process (no JSON form).
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            encode: None,
        }
    }

    /// Try to downcast to a concrete type reference.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check if the stored value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Get the `TypeId` of the stored value.
    pub fn type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// JSON form of the value, or `None` for opaque values.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        self.encode.and_then(|encode| encode(&*self.inner))
    }

    /// Number of strong references to the underlying value.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

fn encode_as<T: Any + Serialize>(value: &(dyn Any + Send + Sync + 'static)) -> Option<serde_json::Value> {
    value
        .downcast_ref::<T>()
        .and_then(|v| serde_json::to_value(v).ok())
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type_id", &(*self.inner).type_id())
            .field("json", &self.encode.is_some())
            .finish()
    }
}
