//! Counter store trait and the atomic batch it executes.

use async_trait::async_trait;

use crate::error::{HitwindowError, Result};

/// A single store command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `INCR key`
    Incr { key: String },
    /// `EXPIRE key seconds`
    Expire { key: String, seconds: u64 },
    /// `ZADD key score member`
    ZAdd {
        key: String,
        score: i64,
        member: String,
    },
    /// `ZREMRANGEBYSCORE key -inf (below`: removes every member scored strictly below `below`.
    ZRemRangeByScoreBelow { key: String, below: i64 },
    /// `ZCARD key`
    ZCard { key: String },
}

/// Commands executed as one indivisible unit.
///
/// No other batch touching the same keys interleaves with this one, and the
/// store answers with one reply per command in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Start an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(mut self, key: &str) -> Self {
        self.commands.push(Command::Incr {
            key: key.to_owned(),
        });
        self
    }

    pub fn expire(mut self, key: &str, seconds: u64) -> Self {
        self.commands.push(Command::Expire {
            key: key.to_owned(),
            seconds,
        });
        self
    }

    pub fn zadd(mut self, key: &str, score: i64, member: impl Into<String>) -> Self {
        self.commands.push(Command::ZAdd {
            key: key.to_owned(),
            score,
            member: member.into(),
        });
        self
    }

    pub fn zrem_range_by_score_below(mut self, key: &str, below: i64) -> Self {
        self.commands.push(Command::ZRemRangeByScoreBelow {
            key: key.to_owned(),
            below,
        });
        self
    }

    pub fn zcard(mut self, key: &str) -> Self {
        self.commands.push(Command::ZCard {
            key: key.to_owned(),
        });
        self
    }

    /// Commands in submission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One command's reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Integer(i64),
    Text(String),
    Nil,
    /// Any reply kind the limiters never expect (arrays, maps, doubles...).
    Other(String),
}

impl Reply {
    /// Read the reply as a non-negative count.
    ///
    /// Integers are taken as is and text replies are parsed as base-10 numbers.
    /// Anything else is a [`HitwindowError::MalformedResponse`].
    pub fn as_count(&self) -> Result<u64> {
        let value = match self {
            Reply::Integer(value) => *value,
            Reply::Text(text) => text.trim().parse::<i64>().map_err(|error| {
                HitwindowError::MalformedResponse(format!(
                    "expected a numeric reply, got {text:?}: {error}"
                ))
            })?,
            other => {
                return Err(HitwindowError::MalformedResponse(format!(
                    "expected a numeric reply, got {other:?}"
                )))
            }
        };

        u64::try_from(value).map_err(|_| {
            HitwindowError::MalformedResponse(format!("expected a non-negative count, got {value}"))
        })
    }
}

/// Read the count at `index` of a batch's replies.
pub(crate) fn count_at(replies: &[Reply], index: usize) -> Result<u64> {
    replies
        .get(index)
        .ok_or_else(|| {
            HitwindowError::MalformedResponse(format!(
                "expected at least {} replies, got {}",
                index + 1,
                replies.len()
            ))
        })?
        .as_count()
}

/// A shared key-value store able to run atomic batches.
///
/// Implementations obtain a connection per call and must never partially
/// apply a batch. Any transport or server-side failure is reported as
/// [`HitwindowError::StoreUnavailable`].
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Execute `batch` atomically and return one reply per command.
    async fn execute(&self, batch: Batch) -> Result<Vec<Reply>>;
}
