//! Authentication gateway: credential issuance and verification, the session
//! cookie, the request gate, and identity propagation to remote services.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod error;
mod clock;
mod codec;
mod session;
mod cookie_policy;
mod scheme;
mod gateway;
mod middleware;
mod propagation;

pub use principal::{Authenticated, SubjectIdentity};
pub use error::{AuthError, AuthResult, Severity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CredentialClaims, CredentialCodec, IssuedCredential, TOKEN_ISSUER};
pub use session::{generate_session_key, MemorySessionStore, Session, SessionStore};
pub use cookie_policy::{build_cookie, build_expired_cookie, set_cookie_header, CookiePolicy, DEFAULT_COOKIE_NAME, DEFAULT_COOKIE_PATH};
pub use scheme::{CredentialScheme, IssuedCookieValue, SchemeKind};
pub use gateway::{AuthGateway, DEFAULT_CREDENTIAL_TTL_HOURS, MAX_CREDENTIAL_TTL_HOURS};
pub use middleware::require_auth;
pub use propagation::SubjectCall;
