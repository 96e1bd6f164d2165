use exemplar::Model;
use rusqlite::{Connection, TransactionBehavior};
use sea_query::{enum_def, Expr, Order, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    error::ResultContext,
    model::{
        authorize_owner, delete, fetch, fetch_optional, query_all, ExerciseChanges, ExerciseForm,
        ExerciseProgress, ExerciseType, Identity, Owned, Record,
    },
    DomainError, Object,
};

/// A reusable movement template. Workouts reference exercises; progress is
/// logged against an exercise within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("exercise")]
#[check("../../../migrations/005-exercise/up.sql")]
#[enum_def]
pub struct Exercise {
    pub id: i64,
    pub profile_id: i64,
    pub exercise_type_id: Option<i64>,
    pub name: String,
    pub description: String,
}

pub(crate) const EXERCISE_STAR: [ExerciseIden; 5] = [
    ExerciseIden::Id,
    ExerciseIden::ProfileId,
    ExerciseIden::ExerciseTypeId,
    ExerciseIden::Name,
    ExerciseIden::Description,
];

impl Record for Exercise {
    const OBJECT: Object = Object::Exercise;

    fn select_star() -> SelectStatement {
        Query::select()
            .columns(EXERCISE_STAR)
            .from(ExerciseIden::Table)
            .to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(ExerciseIden::Id).eq(id)
    }
}

impl Owned for Exercise {
    fn owner_profile_id(&self) -> i64 {
        self.profile_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("exercise")]
pub struct NewExercise {
    pub profile_id: i64,
    pub exercise_type_id: Option<i64>,
    pub name: String,
    pub description: String,
}

/// An exercise with its category and every logged attempt at it,
/// including those other users made through public workouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDetail {
    pub exercise: Exercise,
    pub exercise_type: Option<ExerciseType>,
    pub progress: Vec<ExerciseProgress>,
}

impl Exercise {
    #[instrument(skip(conn, form))]
    pub fn create(
        conn: &mut Connection,
        identity: &Identity,
        form: &ExerciseForm,
    ) -> Result<Exercise, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exercise = {
            let requester = identity.profile(&tx)?;
            let ExerciseChanges {
                exercise_type_id,
                name,
                description,
            } = form.clean(&tx)?;

            NewExercise {
                profile_id: requester.id,
                exercise_type_id: Some(exercise_type_id),
                name,
                description,
            }
            .insert(&tx)
            .context("Exercise::create")?;
            fetch::<Exercise>(&tx, tx.last_insert_rowid())?
        };

        tx.commit()?;

        info!(exercise_id = exercise.id, "Created exercise");
        Ok(exercise)
    }

    #[instrument(skip(conn, form))]
    pub fn update(
        conn: &mut Connection,
        identity: &Identity,
        id: i64,
        form: &ExerciseForm,
    ) -> Result<Exercise, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exercise = {
            let requester = identity.profile(&tx)?;
            let mut exercise = fetch::<Exercise>(&tx, id)?;
            authorize_owner(&requester, &exercise, "edit this exercise")?;

            let changes = form.clean(&tx)?;
            exercise.exercise_type_id = Some(changes.exercise_type_id);
            exercise.name = changes.name;
            exercise.description = changes.description;

            let (sql, values) = Query::update()
                .table(ExerciseIden::Table)
                .values([
                    (ExerciseIden::ExerciseTypeId, exercise.exercise_type_id.into()),
                    (ExerciseIden::Name, exercise.name.clone().into()),
                    (ExerciseIden::Description, exercise.description.clone().into()),
                ])
                .and_where(Expr::col(ExerciseIden::Id).eq(exercise.id))
                .build_rusqlite(SqliteQueryBuilder);
            tx.prepare_cached(&sql)?.execute(&*values.as_params())?;
            exercise
        };

        tx.commit()?;
        Ok(exercise)
    }

    /// Also drops the exercise from every workout and its logged progress
    #[instrument(skip(conn))]
    pub fn delete(conn: &mut Connection, identity: &Identity, id: i64) -> Result<(), DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let requester = identity.profile(&tx)?;
            let exercise = fetch::<Exercise>(&tx, id)?;
            authorize_owner(&requester, &exercise, "delete this exercise")?;
            delete::<Exercise>(&tx, id)?;
        }
        tx.commit()?;

        info!(exercise_id = id, "Deleted exercise");
        Ok(())
    }

    /// The requester's own exercises, by name
    pub fn fetch_for_profile(conn: &Connection, identity: &Identity) -> Result<Vec<Exercise>, DomainError> {
        let requester = identity.profile(conn)?;
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(ExerciseIden::ProfileId).eq(requester.id))
                .order_by(ExerciseIden::Name, Order::Asc)
                .order_by(ExerciseIden::Id, Order::Asc),
        )
    }

    pub fn detail(conn: &Connection, identity: &Identity, id: i64) -> Result<ExerciseDetail, DomainError> {
        let requester = identity.profile(conn)?;
        let exercise = fetch::<Exercise>(conn, id)?;
        authorize_owner(&requester, &exercise, "view this exercise")?;

        let exercise_type = match exercise.exercise_type_id {
            Some(type_id) => fetch_optional::<ExerciseType>(conn, type_id)?,
            None => None,
        };
        let progress = ExerciseProgress::fetch_for_exercise(conn, exercise.id)?;

        Ok(ExerciseDetail {
            exercise,
            exercise_type,
            progress,
        })
    }
}
