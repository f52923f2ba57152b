/*!
 * Principal Resolution Middleware
 *
 * Reads the trusted upstream headers `x-principal-role` and
 * `x-principal-worker-id`, validates them, and inserts a `Principal` into
 * the request's extensions for handlers to pull out via
 * `Extension<Principal>` (§11). Verifying the principal itself — JWTs,
 * sessions, whatever the gateway in front of this service uses — is out of
 * scope; this layer only trusts what it's handed, the way the teacher's
 * `jwt_auth_middleware` trusts a verified token's claims.
 */

use axum::{extract::Request, middleware::Next, response::Response};

use crate::models::{Principal, Role};
use crate::utils::errors::AppError;

const ROLE_HEADER: &str = "x-principal-role";
const WORKER_ID_HEADER: &str = "x-principal-worker-id";

/// Parses the principal headers and inserts a `Principal` into the request
/// extensions. Missing or malformed headers reject the request with
/// `AppError::Unauthorized`; route-level role gating (staff-only, worker-
/// bound) happens afterwards in the handler/service layer.
pub async fn principal_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let role_header = request
        .headers()
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {ROLE_HEADER} header")))?;

    let role = match role_header {
        "PUBLIC" => Role::Public,
        "WORKER" => Role::Worker,
        "STAFF" => Role::Staff,
        "ADMIN" => Role::Admin,
        other => {
            return Err(AppError::Unauthorized(format!(
                "unrecognized {ROLE_HEADER} value '{other}'"
            )))
        }
    };

    let worker_id = match role {
        Role::Worker => {
            let raw = request
                .headers()
                .get(WORKER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AppError::Unauthorized(format!("WORKER role requires {WORKER_ID_HEADER} header"))
                })?;
            let id = raw
                .parse()
                .map_err(|_| AppError::Unauthorized(format!("{WORKER_ID_HEADER} is not a valid UUID")))?;
            Some(id)
        }
        _ => None,
    };

    request.extensions_mut().insert(Principal { role, worker_id });

    Ok(next.run(request).await)
}
