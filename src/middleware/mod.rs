/*!
 * Middleware Module
 *
 * Cross-cutting HTTP concerns: CORS, principal resolution, request
 * context extraction, and per-IP rate limiting for the public router.
 */

// CORS configuration
pub mod cors;

// Principal resolution (§11)
pub mod principal;

// Request context extraction (IP, user agent, request id)
pub mod request_context;

// Governor-backed rate limiting (§13)
pub mod rate_limit;
