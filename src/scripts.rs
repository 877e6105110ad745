// src/scripts.rs

use redis::aio::MultiplexedConnection;
use redis::Script;

use crate::error::IdemError;

/// Lua script for `cas_swap`: replace `old` with `new` and reset the
/// expiry, only if the current value still equals `old`.
const CAS_SWAP_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    redis.call("set", KEYS[1], ARGV[2], "PX", ARGV[3])
    return 1
else
    return 0
end
"#;

/// Lua script for `cas_extend`: reset the expiry of the current value
/// if it still equals `value`, using "GT" semantics (never shrinks a
/// longer existing TTL).
const CAS_EXTEND_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    redis.call("pexpire", KEYS[1], ARGV[2], "GT")
    return 1
else
    return 0
end
"#;

/// Lua script for `cas_delete`: delete the key if and only if it still
/// holds `value`.
const CAS_DELETE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    redis.call("del", KEYS[1])
    return 1
else
    return 0
end
"#;

/// Result of `load_or_store`: either we stored our own value (we are
/// the writer), or we observed the value already present.
pub struct LoadOrStore {
    pub loaded: bool,
    pub value: Option<String>,
}

/// Atomically store `new_value` under `key` with expiry `ttl_ms` if
/// `key` is currently absent; otherwise return the current value
/// unchanged. A single `SET key new_value NX GET PX ttl_ms` round-trip.
pub async fn load_or_store(
    conn: &mut MultiplexedConnection,
    key: &str,
    new_value: &str,
    ttl_ms: u64,
) -> Result<LoadOrStore, IdemError> {
    let prior: Option<String> = redis::cmd("SET")
        .arg(key)
        .arg(new_value)
        .arg("NX")
        .arg("GET")
        .arg("PX")
        .arg(ttl_ms)
        .query_async(conn)
        .await?;

    match prior {
        Some(existing) => Ok(LoadOrStore {
            loaded: true,
            value: Some(existing),
        }),
        None => Ok(LoadOrStore {
            loaded: false,
            value: None,
        }),
    }
}

/// Compare-and-swap: if the current value equals `old_value`, replace
/// it with `new_value` and set expiry `ttl_ms`. Returns `true` on
/// success, `false` on mismatch (lease lost).
pub async fn cas_swap(
    conn: &mut MultiplexedConnection,
    key: &str,
    old_value: &str,
    new_value: &str,
    ttl_ms: u64,
) -> Result<bool, IdemError> {
    let result: i32 = Script::new(CAS_SWAP_SCRIPT)
        .key(key)
        .arg(old_value)
        .arg(new_value)
        .arg(ttl_ms)
        .invoke_async(conn)
        .await?;
    Ok(result == 1)
}

/// Compare-and-extend: if the current value equals `value`, reset its
/// expiry to `ttl_ms` (GT semantics). Returns `true` on success,
/// `false` on mismatch (lease lost).
pub async fn cas_extend(
    conn: &mut MultiplexedConnection,
    key: &str,
    value: &str,
    ttl_ms: u64,
) -> Result<bool, IdemError> {
    let result: i32 = Script::new(CAS_EXTEND_SCRIPT)
        .key(key)
        .arg(value)
        .arg(ttl_ms)
        .invoke_async(conn)
        .await?;
    Ok(result == 1)
}

/// Compare-and-delete: if the current value equals `value`, delete the
/// key. Returns `true` on success, `false` on mismatch.
pub async fn cas_delete(
    conn: &mut MultiplexedConnection,
    key: &str,
    value: &str,
) -> Result<bool, IdemError> {
    let result: i32 = Script::new(CAS_DELETE_SCRIPT)
        .key(key)
        .arg(value)
        .invoke_async(conn)
        .await?;
    Ok(result == 1)
}
