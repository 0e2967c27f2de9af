pub mod authenticator;
pub mod factory;
pub mod http;
pub mod resolver;
pub mod types;

pub use authenticator::{Authenticator, RequestDeadline, caller_id, client_id, is_public};
pub use factory::build_authenticator;
pub use http::HttpTokenResolver;
pub use resolver::{ResolveError, ResolveResult, TokenResolver};
pub use types::{AccessToken, AuthCtx, RemoteError};
