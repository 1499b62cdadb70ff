//! Mock authentication: token codec, storage sync across namespaces and the session store.
//! Keep the public surface thin and split implementation across sub-modules.

mod user;
pub mod token;
pub mod sync;
mod store;

pub use user::{AuthResponse, Credentials, DemoAccount, DEMO_ACCOUNT, RegisteredUser, RegistrationData, User};
pub use token::{TokenClaims, TokenError};
pub use sync::{AuthSync, PersistedSession};
pub use store::{AuthEvent, AuthOutcome, SessionSnapshot, SessionStatus, SessionStore, TOKEN_TYPE};
