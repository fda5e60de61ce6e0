//! Connection pooling and round-scoring core for a search-driven quiz game
//! backend.
//!
//! Two independent subsystems:
//! - [`pool`]: a bounded database connection pool kept warm by a background
//!   producer task, handed to request handlers as an explicit [`ConnectionPool`]
//!   value rather than a global.
//! - [`scoring`]: a pure engine turning one completed round's metrics into an
//!   integer experience award, with every intermediate component exposed.
//!
//! The pool knows nothing about scoring and scoring performs no I/O; the
//! embedding web layer wires the two together.

pub mod config;
pub mod error;
pub mod pool;
pub mod postgres;
pub mod scoring;

pub use config::PoolConfig;
pub use error::QuizEngineError;
pub use pool::{ConnectionPool, ConnectionSlot, Connector, PooledConnection};
pub use postgres::{PgConnection, PgConnector, PgSettings};
pub use scoring::{
    ASK_QUESTION_XP, MAX_LIVES, RATE_QUESTION_XP, RoundMetrics, ScoreBreakdown, UserLevel,
    rate_question_award, score_round,
};
