//! Identifier generators.

use switchyard_core::IdGenerator;
use uuid::Uuid;

/// Random v4 UUIDs in simple (hyphen-free) form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Short random identifiers, suitable for tool call ids.
#[derive(Debug, Clone, Copy)]
pub struct ShortIdGenerator {
    len: usize,
}

impl ShortIdGenerator {
    /// Identifiers of `len` hex characters (at most 32).
    pub fn new(len: usize) -> Self {
        Self { len: len.min(32) }
    }
}

impl Default for ShortIdGenerator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl IdGenerator for ShortIdGenerator {
    fn generate_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(self.len);
        id
    }
}
