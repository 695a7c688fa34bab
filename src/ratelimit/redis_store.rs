//! Redis-backed counter store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Pipeline, Value};
use tracing::{debug, info};

use super::store::{Batch, Command, CounterStore, Reply};
use crate::error::{HitwindowError, Result};

/// Counter store executing each batch as a Redis `MULTI`/`EXEC` transaction.
///
/// The connection manager is shared; every batch runs on a clone of it, and
/// reconnection after a dropped link is left to the manager.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Wrap an existing connection manager.
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Open a connection to `url` and check it with a `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|error| {
            HitwindowError::Config(format!("invalid redis url {url:?}: {error}"))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|error| {
            HitwindowError::StoreUnavailable(format!("failed to connect to redis: {error}"))
        })?;

        let mut probe = connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut probe)
            .await
            .map_err(|error| {
                HitwindowError::StoreUnavailable(format!("failed to ping redis: {error}"))
            })?;

        info!("Connected to redis counter store");
        Ok(Self::new(connection))
    }
}

/// Translate a batch into a transactional pipeline.
pub(crate) fn build_pipeline(batch: &Batch) -> Pipeline {
    let mut pipeline = redis::pipe();
    pipeline.atomic();

    for command in batch.commands() {
        match command {
            Command::Incr { key } => {
                pipeline.cmd("INCR").arg(key);
            }
            Command::Expire { key, seconds } => {
                pipeline.cmd("EXPIRE").arg(key).arg(*seconds);
            }
            Command::ZAdd { key, score, member } => {
                pipeline.cmd("ZADD").arg(key).arg(*score).arg(member);
            }
            Command::ZRemRangeByScoreBelow { key, below } => {
                pipeline
                    .cmd("ZREMRANGEBYSCORE")
                    .arg(key)
                    .arg("-inf")
                    .arg(format!("({below}"));
            }
            Command::ZCard { key } => {
                pipeline.cmd("ZCARD").arg(key);
            }
        }
    }

    pipeline
}

fn to_reply(value: Value) -> Result<Reply> {
    match value {
        Value::Int(value) => Ok(Reply::Integer(value)),
        Value::BulkString(bytes) => Ok(Reply::Text(String::from_utf8_lossy(&bytes).into_owned())),
        Value::SimpleString(text) => Ok(Reply::Text(text)),
        Value::Okay => Ok(Reply::Text("OK".to_owned())),
        Value::Nil => Ok(Reply::Nil),
        Value::ServerError(error) => Err(HitwindowError::StoreUnavailable(format!(
            "redis rejected a batched command: {error:?}"
        ))),
        other => Ok(Reply::Other(format!("{other:?}"))),
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn execute(&self, batch: Batch) -> Result<Vec<Reply>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = build_pipeline(&batch);
        let mut connection = self.connection.clone();

        let values: Vec<Value> = pipeline
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                HitwindowError::StoreUnavailable(format!(
                    "failed to execute redis transaction: {error}"
                ))
            })?;

        if values.len() != batch.len() {
            return Err(HitwindowError::MalformedResponse(format!(
                "redis transaction returned {} replies for {} commands",
                values.len(),
                batch.len()
            )));
        }

        debug!(commands = batch.len(), "Executed redis transaction");
        values.into_iter().map(to_reply).collect()
    }
}
