/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - AuthCtx の型は services::oauth 側 (Authenticator だけが insert する)
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;

pub use crate::services::oauth::AuthCtx;
pub use core::AuthCtxExtractor;
