use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, Responder, web};
use sandbox::{ExecRequest, Sandbox};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Per-process shared state: the sandbox plus the immutable limit values the
/// boundary layer enforces before anything reaches it.
pub struct AppState {
    pub sandbox: Arc<dyn Sandbox>,
    pub max_timeout_ms: u64,
    pub default_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    code: String,
    #[serde(default)]
    stdin: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    timed_out: bool,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz))
        .service(web::scope("/v1").route("/execute", web::post().to(execute)));
}

async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Execute a snippet synchronously inside the sandbox.
///
/// Bad user code, non-zero exits, and timeouts are 200s with the outcome in
/// the body; only configuration/infrastructure failures surface as 5xx.
async fn execute(state: web::Data<AppState>, body: web::Json<ExecuteBody>) -> HttpResponse {
    let body = body.into_inner();

    let timeout_ms = body.timeout_ms.unwrap_or(state.default_timeout_ms);
    if timeout_ms == 0 {
        return unprocessable("timeout_ms must be positive".to_string());
    }
    if timeout_ms > state.max_timeout_ms {
        return unprocessable(format!(
            "timeout_ms exceeds maximum of {} ms",
            state.max_timeout_ms
        ));
    }

    let request = ExecRequest {
        code: body.code,
        stdin: body.stdin,
        timeout: Duration::from_millis(timeout_ms),
    };

    match state.sandbox.execute(&request).await {
        Ok(result) => HttpResponse::Ok().json(ExecuteResponse {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            duration_ms: result.duration_ms,
        }),
        Err(e) => {
            error!(error = %e, "execution backend failure");
            HttpResponse::InternalServerError().json(ErrorBody {
                detail: "execution backend unavailable".to_string(),
            })
        }
    }
}

fn unprocessable(detail: String) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ErrorBody { detail })
}
