//! reqwest-backed [`Backend`] implementation.
//!
//! Every call follows the same shape: require a token from the
//! [`AuthStore`] (no token means no request goes out), send with the
//! configured timeout, translate transport and status failures into
//! [`BackendError`], then decode the JSON body into a wire DTO and validate
//! it into a domain type. FastAPI error bodies carry a `detail` field; it is
//! surfaced in [`BackendError::Status`] so screens can show the backend's
//! own message ("Saldo insuficiente", "Stock insuficiente para …").

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::debug;

use ctn_backend::{Backend, BackendError, BackendResult, CatalogFilter, NewPreorder};
use ctn_schemas::wire::{
    AlimentoDto, BloqueadoDto, DescargaSaldoDto, EstudianteDto, PrecompraDto, PrecompraItemDto,
    PrecompraNuevaDto,
};
use ctn_schemas::{CatalogItem, Money, Preorder, Student};
use ctn_session::AuthStore;

use crate::ClientConfig;

/// Live REST implementation of [`Backend`].
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthStore>,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestBackend {
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed (TLS
    /// backend initialization).
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Token or fail before any request is issued.
    fn bearer(&self) -> BackendResult<String> {
        self.auth.token().ok_or(BackendError::NotAuthenticated)
    }

    async fn send(&self, req: RequestBuilder) -> BackendResult<Response> {
        let resp = req.send().await.map_err(map_transport)?;
        check_status(resp).await
    }
}

fn map_transport(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(e.to_string())
    }
}

/// Map non-success statuses, pulling FastAPI's `detail` out of the body.
async fn check_status(resp: Response) -> BackendResult<Response> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BackendError::NotAuthenticated);
    }
    if status.is_success() {
        return Ok(resp);
    }

    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let detail = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    };
    debug!(status = status.as_u16(), detail, "backend rejected request");
    Err(BackendError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    async fn fetch_catalog(&self, filter: &CatalogFilter) -> BackendResult<Vec<CatalogItem>> {
        let token = self.bearer()?;
        let mut req = self
            .http
            .get(self.url("/api/alimentos/"))
            .bearer_auth(&token);
        if let Some(ref name) = filter.name {
            req = req.query(&[("nombre", name)]);
        }
        if let Some(ref category) = filter.category {
            req = req.query(&[("categoria", category)]);
        }
        let resp = self.send(req).await?;
        let rows: Vec<AlimentoDto> = resp.json().await.map_err(map_transport)?;
        rows.into_iter()
            .map(|dto| dto.into_domain().map_err(BackendError::from))
            .collect()
    }

    async fn fetch_blocked_items(&self, student_id: i64) -> BackendResult<Vec<i64>> {
        let token = self.bearer()?;
        let resp = self
            .send(
                self.http
                    .get(self.url(&format!("/estudiantes/{student_id}/alimentosBloqueados")))
                    .bearer_auth(&token),
            )
            .await?;
        let rows: Vec<BloqueadoDto> = resp.json().await.map_err(map_transport)?;
        Ok(rows.into_iter().map(|b| b.id_alimento).collect())
    }

    async fn find_student_by_cedula(&self, cedula: &str) -> BackendResult<Student> {
        let token = self.bearer()?;
        let resp = self
            .send(
                self.http
                    .get(self.url(&format!("/estudiantes/cedula/{cedula}")))
                    .bearer_auth(&token),
            )
            .await?;
        let dto: EstudianteDto = resp.json().await.map_err(map_transport)?;
        Ok(dto.into_domain()?)
    }

    async fn create_preorder(&self, req: &NewPreorder) -> BackendResult<Preorder> {
        let token = self.bearer()?;
        let body = PrecompraNuevaDto {
            estudiante_id: req.student_id,
            items: req
                .lines
                .iter()
                .map(|l| PrecompraItemDto {
                    producto_id: l.item_id,
                    cantidad: l.quantity,
                })
                .collect(),
            costo_adicional: req.surcharge.to_decimal(),
        };
        let resp = self
            .send(
                self.http
                    .post(self.url("/api/precompras/nueva"))
                    .bearer_auth(&token)
                    .json(&body),
            )
            .await?;
        let dto: PrecompraDto = resp.json().await.map_err(map_transport)?;
        Ok(dto.into_domain()?)
    }

    async fn debit_balance(&self, student_id: i64, amount: Money) -> BackendResult<Student> {
        let token = self.bearer()?;
        let body = DescargaSaldoDto {
            monto: amount.to_decimal(),
        };
        let resp = self
            .send(
                self.http
                    .post(self.url(&format!("/estudiantes/{student_id}/descargaSaldo")))
                    .bearer_auth(&token)
                    .json(&body),
            )
            .await?;
        let dto: EstudianteDto = resp.json().await.map_err(map_transport)?;
        Ok(dto.into_domain()?)
    }

    async fn pending_preorders(&self, student_id: i64) -> BackendResult<Vec<Preorder>> {
        let token = self.bearer()?;
        let resp = self
            .send(
                self.http
                    .get(self.url(&format!(
                        "/api/precompras/estudiante/{student_id}/pendientes"
                    )))
                    .bearer_auth(&token),
            )
            .await?;
        let rows: Vec<PrecompraDto> = resp.json().await.map_err(map_transport)?;
        rows.into_iter()
            .map(|dto| dto.into_domain().map_err(BackendError::from))
            .collect()
    }

    async fn mark_delivered(&self, preorder_id: i64) -> BackendResult<Preorder> {
        let token = self.bearer()?;
        let resp = self
            .send(
                self.http
                    .patch(self.url(&format!("/api/precompras/{preorder_id}/entregar")))
                    .bearer_auth(&token),
            )
            .await?;
        let dto: PrecompraDto = resp.json().await.map_err(map_transport)?;
        Ok(dto.into_domain()?)
    }
}

// ---------------------------------------------------------------------------
// Tests (no network)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ctn_testkit::MemoryAuthStore;

    fn client(auth: MemoryAuthStore) -> RestBackend {
        RestBackend::new(
            ClientConfig::new("http://invalid.localdomain:1/"),
            Arc::new(auth),
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = client(MemoryAuthStore::logged_out());
        assert_eq!(
            backend.url("/api/alimentos/"),
            "http://invalid.localdomain:1/api/alimentos/"
        );
    }

    #[tokio::test]
    async fn missing_token_fails_without_issuing_a_request() {
        // The base URL is unroutable; reaching the network would fail with
        // a different error than NotAuthenticated.
        let backend = client(MemoryAuthStore::logged_out());
        let err = backend
            .fetch_catalog(&CatalogFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::NotAuthenticated);

        let err = backend
            .debit_balance(3, Money::from_pesos(1_000))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::NotAuthenticated);
    }
}
