//! Round-scoring engine: converts one completed round's metrics into an
//! integer experience award.
//!
//! Pure and total: no I/O, no error paths once a [`RoundMetrics`] exists, and
//! identical inputs always yield an identical [`ScoreBreakdown`]. The
//! intermediate components are exposed so the web layer can show players where
//! their award came from.

use std::fmt;

use serde::Serialize;

use crate::error::QuizEngineError;

/// Flat award for asking a new question.
pub const ASK_QUESTION_XP: i32 = 14;

/// Flat award for rating somebody else's question.
pub const RATE_QUESTION_XP: i32 = 2;

/// Incorrect guesses allowed per round; every round starts with this many
/// lives.
pub const MAX_LIVES: u8 = 3;

const BASE_PASS_SCORE: f64 = 10.0;
const AWARD_DIVISOR: f64 = 1.3;
const QUERY_POINTS: f64 = 2.5;
const FILTER_POINTS: i32 = 3;

/// Metrics recorded over one completed round of play.
///
/// Built by the game controller from the persisted round and question data;
/// consumed once by [`score_round`] and never stored by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundMetrics {
    duration_secs: f64,
    lives_left: u8,
    queries_issued: u32,
    filters_applied: u16,
    difficulty: f32,
}

impl RoundMetrics {
    /// Difficulty is the question's 1-5 crowd-adjusted rating; values outside
    /// that range are accepted and score a zero time and query component.
    ///
    /// # Errors
    /// Returns [`QuizEngineError::InvalidMetrics`] for a non-finite or
    /// negative duration, or more lives than a round starts with.
    pub fn new(
        duration_secs: f64,
        lives_left: u8,
        queries_issued: u32,
        filters_applied: u16,
        difficulty: f32,
    ) -> Result<Self, QuizEngineError> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(QuizEngineError::InvalidMetrics(format!(
                "duration must be a non-negative number of seconds, got {duration_secs}"
            )));
        }
        if lives_left > MAX_LIVES {
            return Err(QuizEngineError::InvalidMetrics(format!(
                "lives left must be 0-{MAX_LIVES}, got {lives_left}"
            )));
        }
        Ok(Self {
            duration_secs,
            lives_left,
            queries_issued,
            filters_applied,
            difficulty,
        })
    }

    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    #[must_use]
    pub fn lives_left(&self) -> u8 {
        self.lives_left
    }

    #[must_use]
    pub fn queries_issued(&self) -> u32 {
        self.queries_issued
    }

    #[must_use]
    pub fn filters_applied(&self) -> u16 {
        self.filters_applied
    }

    #[must_use]
    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }
}

/// Per-component result of scoring one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub life_score: i32,
    pub time_score: f64,
    pub query_score: f64,
    /// Tracked for the breakdown only; not part of the final award.
    pub filter_score: i32,
    /// Final integer experience award for the round.
    pub awarded_xp: i32,
}

/// Score one completed round.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn score_round(metrics: &RoundMetrics) -> ScoreBreakdown {
    let life_score = life_score(metrics.lives_left);
    let time_score = time_score(metrics.difficulty, metrics.duration_secs);
    let query_score = query_score(metrics.difficulty, metrics.queries_issued);
    let filter_score = i32::from(metrics.filters_applied) * FILTER_POINTS;

    // The filter component is left out of the sum; see DESIGN.md.
    let awarded_xp =
        ((f64::from(life_score) + query_score + time_score + BASE_PASS_SCORE) / AWARD_DIVISOR)
            as i32;

    ScoreBreakdown {
        life_score,
        time_score,
        query_score,
        filter_score,
        awarded_xp,
    }
}

/// Award for rating a question. Rating your own question earns nothing; the
/// caller supplies the ownership check.
#[must_use]
pub fn rate_question_award(rater_owns_question: bool) -> i32 {
    if rater_owns_question {
        0
    } else {
        RATE_QUESTION_XP
    }
}

fn life_score(lives_left: u8) -> i32 {
    // Fixed step table over the three-guess allowance.
    match lives_left {
        0 => 0,
        1 => 5,
        2 => 10,
        _ => 15,
    }
}

fn time_score(difficulty: f32, duration_secs: f64) -> f64 {
    let allowance = expected_time_secs(difficulty);
    if allowance >= duration_secs {
        // Finishing inside the allowance scores the full allowance; there is
        // no extra bonus for raw speed.
        allowance
    } else {
        (allowance - duration_secs).max(0.0)
    }
}

fn query_score(difficulty: f32, queries_issued: u32) -> f64 {
    let expected = f64::from(expected_queries(difficulty));
    let used = f64::from(queries_issued);
    if expected >= used {
        expected * QUERY_POINTS
    } else {
        ((expected - used) * QUERY_POINTS).max(0.0)
    }
}

/// Queries a player is expected to need, by integer-bucketed difficulty.
fn expected_queries(difficulty: f32) -> u32 {
    match bucket(difficulty) {
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 5,
        5 => 8,
        _ => 0,
    }
}

/// Seconds a player is allowed, by integer-bucketed difficulty.
fn expected_time_secs(difficulty: f32) -> f64 {
    match bucket(difficulty) {
        1 => 10.0,
        2 => 20.0,
        3 => 30.0,
        4 => 45.0,
        5 => 55.0,
        _ => 0.0,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bucket(difficulty: f32) -> i32 {
    difficulty as i32
}

/// Level ladder driven by cumulative experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum UserLevel {
    Questling,
    Questionnaire,
    QuestionMark,
    BachelorOfQuestions,
    MasterOfQuestions,
}

impl UserLevel {
    /// Highest level whose threshold the XP total has reached.
    #[must_use]
    pub fn from_xp(xp: i32) -> Self {
        if xp >= Self::MasterOfQuestions.threshold_xp() {
            Self::MasterOfQuestions
        } else if xp >= Self::BachelorOfQuestions.threshold_xp() {
            Self::BachelorOfQuestions
        } else if xp >= Self::QuestionMark.threshold_xp() {
            Self::QuestionMark
        } else if xp >= Self::Questionnaire.threshold_xp() {
            Self::Questionnaire
        } else {
            Self::Questling
        }
    }

    /// Cumulative XP needed to reach this level.
    #[must_use]
    pub fn threshold_xp(self) -> i32 {
        match self {
            Self::Questling => 0,
            Self::Questionnaire => 100,
            Self::QuestionMark => 300,
            Self::BachelorOfQuestions => 550,
            Self::MasterOfQuestions => 800,
        }
    }

    /// The next rung of the ladder, or `None` at the top.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Questling => Some(Self::Questionnaire),
            Self::Questionnaire => Some(Self::QuestionMark),
            Self::QuestionMark => Some(Self::BachelorOfQuestions),
            Self::BachelorOfQuestions => Some(Self::MasterOfQuestions),
            Self::MasterOfQuestions => None,
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Questling => "Questling",
            Self::Questionnaire => "Questionnaire",
            Self::QuestionMark => "Question Mark",
            Self::BachelorOfQuestions => "Bachelor of Questions",
            Self::MasterOfQuestions => "Master of Questions",
        };
        f.write_str(name)
    }
}
