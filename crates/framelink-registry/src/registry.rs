use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use framelink_frame::{Encoding, MAX_NAME_LEN};

use crate::error::{CodecError, RegistryError, Result};
use crate::message::Message;

/// Erased decoder built from a registered type's [`Message`] impl.
pub type DecodeFn = fn(&[u8]) -> std::result::Result<Box<dyn Any + Send + Sync>, CodecError>;

/// One registered (type, wire name) binding plus its codec capability.
pub struct Entry {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    encoding: Encoding,
    decode: DecodeFn,
}

impl Entry {
    /// The wire name this type travels under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered type's identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The wire encoding this type declared at registration.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode a payload into an erased value of the registered type.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<Box<dyn Any + Send + Sync>, CodecError> {
        (self.decode)(bytes)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Bijective mapping between application message types and wire names.
///
/// Populated once at setup; each type maps to exactly one name and vice
/// versa, and registering a duplicate on either side fails without touching
/// the maps. A populated registry holds no per-connection state, so one
/// `Arc<Registry>` can serve any number of adapters.
#[derive(Debug, Default)]
pub struct Registry {
    by_type: HashMap<TypeId, Arc<Entry>>,
    by_name: HashMap<String, Arc<Entry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind message type `M` to a wire name.
    pub fn register<M: Message>(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(RegistryError::NameTooLong { len: name.len() });
        }

        let type_id = TypeId::of::<M>();
        if self.by_type.contains_key(&type_id) {
            return Err(RegistryError::DuplicateType {
                type_name: std::any::type_name::<M>(),
            });
        }
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }

        let entry = Arc::new(Entry {
            name: name.clone(),
            type_id,
            type_name: std::any::type_name::<M>(),
            encoding: M::encoding(),
            decode: decode_erased::<M>,
        });

        self.by_type.insert(type_id, Arc::clone(&entry));
        self.by_name.insert(name, entry);
        Ok(())
    }

    /// Look up the entry registered for type `M`.
    pub fn entry_of<M: Message>(&self) -> Option<&Arc<Entry>> {
        self.by_type.get(&TypeId::of::<M>())
    }

    /// Look up the entry registered under a wire name.
    pub fn entry_named(&self, name: &str) -> Option<&Arc<Entry>> {
        self.by_name.get(name)
    }

    /// The wire name registered for type `M`, if any.
    pub fn name_of<M: Message>(&self) -> Option<&str> {
        self.entry_of::<M>().map(|entry| entry.name())
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn decode_erased<M: Message>(
    bytes: &[u8],
) -> std::result::Result<Box<dyn Any + Send + Sync>, CodecError> {
    M::decode_payload(bytes).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
}
