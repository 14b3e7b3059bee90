//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use mpesa_lib::prelude::*;
//! ```

// Error handling
pub use crate::errors::{MpesaError, MpesaErrorCode};
pub use crate::Result;

// Gateway client
pub use crate::gateway::{C2bPaymentRequest, MpesaClient, MpesaConfig, ResponseEnvelope};

// Session keys and storage
pub use crate::secure_storage::{
    InMemoryKeyStorage, SecureKeyStorage, SecureKeyStorageExt, StoreOptions,
};
pub use crate::session::{SessionKey, SessionKeyCache, SESSION_KEY_STORAGE_KEY};

// Navigation
pub use crate::navigation::{
    evaluate, AuthSnapshot, AuthState, GuardOutcome, GuardPhase, NavigationGuard, TabsLayout,
};
