//! Externally safe identifiers for new entities.

use uuid::Uuid;

/// Source of external identifiers
pub trait IdGenerator: Send + Sync {
    fn random_id(&self) -> String;
}

/// Random UUID v4 tokens without hyphens
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn random_id(&self) -> String {
        random_id()
    }
}

/// A fresh 32 character hex token
pub fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_format() {
        let id = RandomIdGenerator.random_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(random_id(), random_id());
    }
}
