use chrono::{NaiveDate, Utc};
use exemplar::Model;
use rusqlite::{Connection, TransactionBehavior};
use sea_query::{enum_def, Expr, Order, Query, SelectStatement, SimpleExpr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::ResultContext,
    model::{
        fetch, query_all,
        validators::{non_negative_count, non_negative_decimal},
        Identity, NextStep, Record, Workout, WorkoutExercise,
    },
    DomainError, Object, ValidationError,
};

/// One logged attempt at an exercise within a workout. Append only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("exercise_progress")]
#[check("../../../migrations/008-exercise_progress/up.sql")]
#[enum_def]
pub struct ExerciseProgress {
    pub id: i64,
    pub profile_id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub date: NaiveDate,
    pub repetitions: u32,
    pub sets: u32,
    pub weight: f64,
}

const EXERCISE_PROGRESS_STAR: [ExerciseProgressIden; 8] = [
    ExerciseProgressIden::Id,
    ExerciseProgressIden::ProfileId,
    ExerciseProgressIden::WorkoutId,
    ExerciseProgressIden::ExerciseId,
    ExerciseProgressIden::Date,
    ExerciseProgressIden::Repetitions,
    ExerciseProgressIden::Sets,
    ExerciseProgressIden::Weight,
];

impl Record for ExerciseProgress {
    const OBJECT: Object = Object::ExerciseProgress;

    fn select_star() -> SelectStatement {
        Query::select()
            .columns(EXERCISE_PROGRESS_STAR)
            .from(ExerciseProgressIden::Table)
            .to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(ExerciseProgressIden::Id).eq(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("exercise_progress")]
pub struct NewExerciseProgress {
    pub profile_id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub date: NaiveDate,
    pub repetitions: u32,
    pub sets: u32,
    pub weight: f64,
}

/// Raw submitted numbers. Signed so negative input reaches validation
/// instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgressForm {
    pub repetitions: i64,
    pub sets: i64,
    pub weight: f64,
}

impl ExerciseProgressForm {
    /// Returns (repetitions, sets, weight)
    pub fn clean(&self) -> Result<(u32, u32, f64), ValidationError> {
        let mut errors = ValidationError::default();
        let repetitions = non_negative_count(&mut errors, "repetitions", self.repetitions);
        let sets = non_negative_count(&mut errors, "sets", self.sets);
        non_negative_decimal(&mut errors, "weight", self.weight);
        errors.into_result((repetitions, sets, self.weight))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLogged {
    pub progress: ExerciseProgress,
    pub next: NextStep,
}

impl ExerciseProgress {
    /// Records one attempt at `exercise_id` and points at the exercise that
    /// follows it in the workout, or at the summary after the last one.
    #[instrument(skip(conn, form))]
    pub fn log(
        conn: &mut Connection,
        identity: &Identity,
        workout_id: i64,
        exercise_id: i64,
        form: &ExerciseProgressForm,
    ) -> Result<ProgressLogged, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let logged = {
            let requester = identity.profile(&tx)?;
            let workout = fetch::<Workout>(&tx, workout_id)?;
            workout.authorize_view(&requester, "log progress for this workout")?;

            let ordered = WorkoutExercise::ordered_exercise_ids(&tx, workout.id)?;
            let index = ordered
                .iter()
                .position(|id| *id == exercise_id)
                .ok_or_else(|| DomainError::not_found(Object::WorkoutExercise, exercise_id))?;

            let (repetitions, sets, weight) = form.clean()?;

            NewExerciseProgress {
                profile_id: requester.id,
                workout_id: workout.id,
                exercise_id,
                date: Utc::now().date_naive(),
                repetitions,
                sets,
                weight,
            }
            .insert(&tx)
            .context("ExerciseProgress::log")?;
            let progress = fetch::<ExerciseProgress>(&tx, tx.last_insert_rowid())?;

            let next = match ordered.get(index + 1) {
                Some(next_id) => NextStep::LogProgress {
                    workout_id: workout.id,
                    exercise_id: *next_id,
                },
                None => NextStep::WorkoutSummary {
                    workout_id: workout.id,
                },
            };
            debug!(?next);

            ProgressLogged { progress, next }
        };

        tx.commit()?;

        info!(progress_id = logged.progress.id, "Logged progress");
        Ok(logged)
    }

    pub fn fetch_for_workout(
        conn: &Connection,
        workout_id: i64,
        profile_id: i64,
    ) -> Result<Vec<ExerciseProgress>, DomainError> {
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(ExerciseProgressIden::WorkoutId).eq(workout_id))
                .and_where(Expr::col(ExerciseProgressIden::ProfileId).eq(profile_id))
                .order_by(ExerciseProgressIden::Date, Order::Asc)
                .order_by(ExerciseProgressIden::Id, Order::Asc),
        )
    }

    /// Every attempt at the exercise, whoever logged it
    pub fn fetch_for_exercise(conn: &Connection, exercise_id: i64) -> Result<Vec<ExerciseProgress>, DomainError> {
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(ExerciseProgressIden::ExerciseId).eq(exercise_id))
                .order_by(ExerciseProgressIden::Date, Order::Asc)
                .order_by(ExerciseProgressIden::Id, Order::Asc),
        )
    }
}
