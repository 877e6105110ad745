// src/typed.rs

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::coordinator::Coordinator;
use crate::error::IdemError;

/// Thin typed convenience layer over the byte-oriented `Coordinator`.
///
/// Marshals `Req` to bytes with `serde_json`, invokes the coordinator,
/// unmarshals the result back into `Resp`. Errors pass through unchanged.
///
/// `Req`'s `Serialize` impl must produce byte-identical output for
/// logically identical values (stable field ordering, fixed float
/// precision), or equivalent requests will spuriously collide on the
/// mismatch error.
pub struct TypedCoordinator<Req, Resp> {
    coordinator: Coordinator,
    _req: PhantomData<fn() -> Req>,
    _resp: PhantomData<fn() -> Resp>,
}

impl<Req, Resp> TypedCoordinator<Req, Resp>
where
    Req: Serialize + Send + 'static,
    Resp: Serialize + DeserializeOwned,
{
    pub fn new(coordinator: Coordinator) -> Self {
        TypedCoordinator {
            coordinator,
            _req: PhantomData,
            _resp: PhantomData,
        }
    }

    pub async fn handle<F, Fut>(
        &self,
        ctx: CancellationToken,
        key: &str,
        req: Req,
        work: F,
    ) -> Result<(Resp, bool), IdemError>
    where
        F: FnOnce(CancellationToken, Req) -> Fut,
        Fut: Future<Output = Result<Resp, IdemError>> + Send,
    {
        let payload = serde_json::to_vec(&req)
            .map_err(|e| IdemError::Decode(format!("failed to marshal request: {e}")))?;

        let (result_bytes, shared) = self
            .coordinator
            .do_idempotent(ctx, key, &payload, move |work_ctx, _payload| async move {
                let resp = work(work_ctx, req).await?;
                serde_json::to_vec(&resp)
                    .map_err(|e| IdemError::Decode(format!("failed to marshal response: {e}")))
            })
            .await?;

        let resp: Resp = serde_json::from_slice(&result_bytes)
            .map_err(|e| IdemError::Decode(format!("failed to unmarshal response: {e}")))?;

        Ok((resp, shared))
    }
}
