// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique provider ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Yields `provider-1`, `provider-2`, ...
    #[derive(Default)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl SequentialIds {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl IdProvider for SequentialIds {
        fn generate_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            format!("provider-{}", n)
        }
    }
}
