/*
 * Responsibility
 * - 外部サービス (OAuth access token lookup) とのやり取りをまとめる
 */
pub mod oauth;
