use exemplar::Model;
use rusqlite::Connection;
use sea_query::{enum_def, Expr, Func, Order, Query, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DomainError;

/// Membership of an exercise in a workout. `position` orders the members;
/// ties are broken by exercise id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("workout_exercise")]
#[check("../../../migrations/007-workout_exercise/up.sql")]
#[enum_def]
pub struct WorkoutExercise {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub position: i64,
}

impl WorkoutExercise {
    pub fn ordered_exercise_ids(conn: &Connection, workout_id: i64) -> Result<Vec<i64>, DomainError> {
        let (sql, values) = Query::select()
            .column(WorkoutExerciseIden::ExerciseId)
            .from(WorkoutExerciseIden::Table)
            .and_where(Expr::col(WorkoutExerciseIden::WorkoutId).eq(workout_id))
            .order_by(WorkoutExerciseIden::Position, Order::Asc)
            .order_by(WorkoutExerciseIden::ExerciseId, Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let res = stmt
            .query_map(&*values.as_params(), |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(res)
    }

    fn max_position(conn: &Connection, workout_id: i64) -> Result<Option<i64>, DomainError> {
        let (sql, values) = Query::select()
            .expr(Func::max(Expr::col(WorkoutExerciseIden::Position)))
            .from(WorkoutExerciseIden::Table)
            .and_where(Expr::col(WorkoutExerciseIden::WorkoutId).eq(workout_id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        Ok(stmt.query_row(&*values.as_params(), |row| row.get(0))?)
    }

    /// Adds the exercises after the current last one, in the given order.
    /// Ids already in the workout, or repeated in `exercise_ids`, are skipped.
    /// Returns how many were added.
    pub fn append(conn: &Connection, workout_id: i64, exercise_ids: &[i64]) -> Result<usize, DomainError> {
        let mut existing = Self::ordered_exercise_ids(conn, workout_id)?;
        let mut position = Self::max_position(conn, workout_id)?.unwrap_or(0);
        let mut added = 0;

        for &exercise_id in exercise_ids {
            if existing.contains(&exercise_id) {
                continue;
            }
            position += 1;
            WorkoutExercise {
                workout_id,
                exercise_id,
                position,
            }
            .insert(conn)?;
            existing.push(exercise_id);
            added += 1;
        }

        debug!(workout_id, added);
        Ok(added)
    }

    /// Makes the membership exactly `exercise_ids`, renumbered in that order
    pub fn set(conn: &Connection, workout_id: i64, exercise_ids: &[i64]) -> Result<(), DomainError> {
        let (sql, values) = Query::delete()
            .from_table(WorkoutExerciseIden::Table)
            .and_where(Expr::col(WorkoutExerciseIden::WorkoutId).eq(workout_id))
            .build_rusqlite(SqliteQueryBuilder);
        let removed = conn.prepare_cached(&sql)?.execute(&*values.as_params())?;
        debug!(workout_id, removed);

        Self::append(conn, workout_id, exercise_ids)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        model::{Exercise, ExerciseForm, Workout, WorkoutForm},
        test_utils,
    };

    #[test]
    fn test_append_skips_members_and_set_reorders() {
        let mut conn = test_utils::connection();
        let (user, _) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let ids: Vec<i64> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|name| {
                let form = ExerciseForm {
                    name: name.into(),
                    category: "Core".into(),
                    description: String::new(),
                };
                Exercise::create(&mut conn, &identity, &form).unwrap().id
            })
            .collect();
        let form = WorkoutForm {
            name: "Abs".into(),
            duration: Some(20),
            ..Default::default()
        };
        let workout = Workout::create(&mut conn, &identity, &form).unwrap();

        assert_eq!(WorkoutExercise::append(&conn, workout.id, &[ids[2], ids[0]]).unwrap(), 2);
        assert_eq!(WorkoutExercise::append(&conn, workout.id, &[ids[0], ids[1], ids[1]]).unwrap(), 1);
        assert_eq!(
            WorkoutExercise::ordered_exercise_ids(&conn, workout.id).unwrap(),
            vec![ids[2], ids[0], ids[1]]
        );

        WorkoutExercise::set(&conn, workout.id, &[ids[3], ids[1], ids[2]]).unwrap();
        assert_eq!(
            WorkoutExercise::ordered_exercise_ids(&conn, workout.id).unwrap(),
            vec![ids[3], ids[1], ids[2]]
        );

        WorkoutExercise::set(&conn, workout.id, &[]).unwrap();
        assert!(WorkoutExercise::ordered_exercise_ids(&conn, workout.id)
            .unwrap()
            .is_empty());
    }
}
