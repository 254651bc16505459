use std::{
    any::Any,
    fmt::Debug,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    errors::FieldInputError,
    types::{FieldType, TypeDescriptor},
    virtual_array::GVArray,
};

/// Identity of an externally supplied field input.
///
/// Two keys are equal iff they are of the same concrete kind and
/// [`is_same_as`](Self::is_same_as) agrees. Equal hashes alone mean nothing.
pub trait FieldInputKey: Any + Send + Sync + Debug {
    fn key_hash(&self) -> u64;
    fn type_descriptor(&self) -> &'static TypeDescriptor;
    fn is_same_as(&self, other: &dyn FieldInputKey) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl dyn FieldInputKey + '_ {
    pub fn downcast_ref<K: FieldInputKey>(&self) -> Option<&K> {
        self.as_any().downcast_ref()
    }
}

impl PartialEq for dyn FieldInputKey + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_as(other)
    }
}

impl Eq for dyn FieldInputKey + '_ {}

/// A named attribute of a specific type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeFieldInputKey {
    name: String,
    ty: &'static TypeDescriptor,
}

impl AttributeFieldInputKey {
    pub fn new(name: impl Into<String>, ty: &'static TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
    pub fn of<T: FieldType>(name: impl Into<String>) -> Self {
        Self::new(name, T::type_descriptor())
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FieldInputKey for AttributeFieldInputKey {
    fn key_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.ty.hash(&mut hasher);
        hasher.finish()
    }
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.ty
    }
    fn is_same_as(&self, other: &dyn FieldInputKey) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| other == self)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An attribute without a user visible name, identified by a numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnonymousAttributeFieldInputKey {
    id: u64,
    ty: &'static TypeDescriptor,
}

impl AnonymousAttributeFieldInputKey {
    pub fn new(id: u64, ty: &'static TypeDescriptor) -> Self {
        Self { id, ty }
    }
    pub fn of<T: FieldType>(id: u64) -> Self {
        Self::new(id, T::type_descriptor())
    }
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl FieldInputKey for AnonymousAttributeFieldInputKey {
    fn key_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        self.ty.hash(&mut hasher);
        hasher.finish()
    }
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.ty
    }
    fn is_same_as(&self, other: &dyn FieldInputKey) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| other == self)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Payload bound to a [`FieldInputKey`] for one evaluation.
pub trait FieldInputValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl dyn FieldInputValue + '_ {
    pub fn downcast_ref<V: FieldInputValue>(&self) -> Option<&V> {
        self.as_any().downcast_ref()
    }
}

enum VArrayStorage {
    Owned(Box<dyn GVArray>),
    Shared(Arc<dyn GVArray>),
}

/// Binds a virtual array, e.g. attribute data, to an input key.
pub struct GVArrayFieldInputValue {
    varray: VArrayStorage,
}

impl GVArrayFieldInputValue {
    pub fn new(varray: impl GVArray + 'static) -> Self {
        Self {
            varray: VArrayStorage::Owned(Box::new(varray)),
        }
    }
    pub fn shared(varray: Arc<dyn GVArray>) -> Self {
        Self {
            varray: VArrayStorage::Shared(varray),
        }
    }
    pub fn varray(&self) -> &dyn GVArray {
        match &self.varray {
            VArrayStorage::Owned(v) => &**v,
            VArrayStorage::Shared(v) => &**v,
        }
    }
}

impl FieldInputValue for GVArrayFieldInputValue {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Copy)]
struct FieldInputKeyRef<'a>(&'a dyn FieldInputKey);

impl Hash for FieldInputKeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.key_hash());
    }
}

impl PartialEq for FieldInputKeyRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.is_same_as(other.0)
    }
}

impl Eq for FieldInputKeyRef<'_> {}

/// Maps the input keys of a field graph to their bound values.
///
/// The key set is fixed by `prepare_inputs`. Keys that are known but not
/// bound yet map to `None`, which is distinct from a key being absent.
#[derive(Default, Clone)]
pub struct FieldInputs<'a> {
    inputs: IndexMap<FieldInputKeyRef<'a>, Option<&'a dyn FieldInputValue>>,
}

impl<'a> FieldInputs<'a> {
    pub(crate) fn add_key(&mut self, key: &'a dyn FieldInputKey) {
        self.inputs.entry(FieldInputKeyRef(key)).or_insert(None);
    }

    fn index_of(&self, key: &dyn FieldInputKey) -> Option<usize> {
        self.inputs.get_index_of(&FieldInputKeyRef(key))
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Collected keys in the order they were first encountered.
    pub fn keys(&self) -> impl Iterator<Item = &'a dyn FieldInputKey> + '_ {
        self.inputs.keys().map(|k| k.0)
    }

    pub fn contains(&self, key: &dyn FieldInputKey) -> bool {
        self.index_of(key).is_some()
    }

    pub fn is_resolved(&self, key: &dyn FieldInputKey) -> bool {
        self.get(key).is_some()
    }

    pub fn set_input(
        &mut self,
        key: &dyn FieldInputKey,
        value: &'a dyn FieldInputValue,
    ) -> Result<(), FieldInputError> {
        let Some(idx) = self.index_of(key) else {
            return Err(FieldInputError::UnknownKey {
                key: format!("{key:?}"),
            });
        };
        self.inputs[idx] = Some(value);
        Ok(())
    }

    pub fn get(
        &self,
        key: &dyn FieldInputKey,
    ) -> Option<&'a dyn FieldInputValue> {
        self.inputs[self.index_of(key)?]
    }

    /// Returns `None` both for unbound keys and for values of another kind.
    pub fn get_as<V: FieldInputValue>(
        &self,
        key: &dyn FieldInputKey,
    ) -> Option<&'a V> {
        self.get(key)?.downcast_ref()
    }
}

assert_impl_all!(FieldInputs<'static>: Send, Sync);
