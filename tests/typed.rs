use idem_redis::{CancellationToken, CoordinatorConfig, TypedCoordinator};
use serde::{Deserialize, Serialize};

#[path = "common.rs"]
mod common;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
struct Req {
    order_id: String,
    amount_cents: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Resp {
    charge_id: String,
}

#[tokio::test]
async fn typed_adapter_replays_without_rerunning_work() {
    let harness = common::start(CoordinatorConfig::new()).await;
    let typed: TypedCoordinator<Req, Resp> = TypedCoordinator::new(harness.coordinator.clone());

    let req = Req {
        order_id: "ord-1".to_string(),
        amount_cents: 1999,
    };

    let (resp, shared) = typed
        .handle(CancellationToken::new(), "charge:ord-1", req.clone(), |_ctx, req| async move {
            Ok(Resp {
                charge_id: format!("ch_{}", req.order_id),
            })
        })
        .await
        .unwrap();

    assert_eq!(resp.charge_id, "ch_ord-1");
    assert!(!shared);

    let (resp2, shared2) = typed
        .handle(CancellationToken::new(), "charge:ord-1", req, |_ctx, _req| async {
            panic!("work must not run on replay");
        })
        .await
        .unwrap();

    assert_eq!(resp2, resp);
    assert!(shared2);
}
