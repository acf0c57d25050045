use async_trait::async_trait;
use uuid::Uuid;

use super::errors::AuthError;

/// Creates the initial cart of a freshly registered account.
#[async_trait]
pub trait CartProvisioner: Send + Sync {
    async fn create_cart(&self, account_id: Uuid) -> Result<(), AuthError>;
}

pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCartProvisioner {
        carts: Mutex<Vec<Uuid>>,
        fail: AtomicBool,
    }

    impl MockCartProvisioner {
        pub fn failing() -> Self {
            let p = Self::default();
            p.fail.store(true, Ordering::SeqCst);
            p
        }

        pub fn carts(&self) -> Vec<Uuid> {
            self.carts.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl CartProvisioner for MockCartProvisioner {
        async fn create_cart(&self, account_id: Uuid) -> Result<(), AuthError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("cart provisioning unavailable".into()));
            }
            self.carts
                .lock()
                .map_err(|_| AuthError::Repository("mock cart store poisoned".into()))?
                .push(account_id);
            Ok(())
        }
    }
}
