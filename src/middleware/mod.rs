/*
 * Responsibility
 * - middlware の公開インターフェース (re-export)
 */
pub mod auth;
pub mod http;
