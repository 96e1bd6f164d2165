use chrono::{NaiveDate, Utc};
use exemplar::Model;
use rusqlite::{Connection, TransactionBehavior};
use sea_query::{enum_def, Expr, Order, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::ResultContext,
    model::{
        authorize_owner, delete, exercise::EXERCISE_STAR, fetch, query_all, Exercise,
        ExerciseIden, ExerciseProgress, Identity, Owned, Profile, Record, WorkoutChanges,
        WorkoutExercise, WorkoutExerciseIden, WorkoutForm,
    },
    DomainError, Object, ValidationError,
};

use super::form::clean_exercise_choices;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("workout")]
#[check("../../../migrations/006-workout/up.sql")]
#[enum_def]
pub struct Workout {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
    pub creation_date: NaiveDate,
    /// Minutes
    pub duration: u32,
    pub description: String,
    pub completed: bool,
    pub public: bool,
}

const WORKOUT_STAR: [WorkoutIden; 8] = [
    WorkoutIden::Id,
    WorkoutIden::ProfileId,
    WorkoutIden::Name,
    WorkoutIden::CreationDate,
    WorkoutIden::Duration,
    WorkoutIden::Description,
    WorkoutIden::Completed,
    WorkoutIden::Public,
];

impl Record for Workout {
    const OBJECT: Object = Object::Workout;

    fn select_star() -> SelectStatement {
        Query::select().columns(WORKOUT_STAR).from(WorkoutIden::Table).to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(WorkoutIden::Id).eq(id)
    }
}

impl Owned for Workout {
    fn owner_profile_id(&self) -> i64 {
        self.profile_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("workout")]
pub struct NewWorkout {
    pub profile_id: i64,
    pub name: String,
    pub creation_date: NaiveDate,
    pub duration: u32,
    pub description: String,
    pub public: bool,
}

/// The workout with its exercises in order and the requester's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub exercises: Vec<Exercise>,
    pub progress: Vec<ExerciseProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub exercise: Exercise,
    /// First attempt logged for this exercise in the workout, if any
    pub progress: Option<ExerciseProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub workout: Workout,
    pub exercises: Vec<ExerciseSummary>,
}

impl Workout {
    /// Owners may always look; anyone may look at a public workout
    pub fn authorize_view(&self, requester: &Profile, action: &str) -> Result<(), DomainError> {
        if self.public {
            Ok(())
        } else {
            authorize_owner(requester, self, action)
        }
    }

    /// Nothing is written unless the whole form is valid
    #[instrument(skip(conn, form))]
    pub fn create(
        conn: &mut Connection,
        identity: &Identity,
        form: &WorkoutForm,
    ) -> Result<Workout, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let workout = {
            let requester = identity.profile(&tx)?;
            let WorkoutChanges {
                name,
                duration,
                description,
                public,
                exercises,
            } = form.clean(&tx, requester.id)?;

            NewWorkout {
                profile_id: requester.id,
                name,
                creation_date: Utc::now().date_naive(),
                duration,
                description,
                public,
            }
            .insert(&tx)
            .context("Workout::create")?;
            let workout = fetch::<Workout>(&tx, tx.last_insert_rowid())?;

            WorkoutExercise::append(&tx, workout.id, &exercises)
                .context("Workout::create(WorkoutExercise)")?;
            workout
        };

        tx.commit()?;

        info!(workout_id = workout.id, "Created workout");
        Ok(workout)
    }

    /// Replaces the editable fields and the exercise set. The exercises are
    /// renumbered in the order submitted.
    #[instrument(skip(conn, form))]
    pub fn update(
        conn: &mut Connection,
        identity: &Identity,
        id: i64,
        form: &WorkoutForm,
    ) -> Result<Workout, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let workout = {
            let requester = identity.profile(&tx)?;
            let mut workout = fetch::<Workout>(&tx, id)?;
            authorize_owner(&requester, &workout, "edit this workout")?;

            let changes = form.clean(&tx, requester.id)?;
            workout.name = changes.name;
            workout.duration = changes.duration;
            workout.description = changes.description;
            workout.public = changes.public;

            let (sql, values) = Query::update()
                .table(WorkoutIden::Table)
                .values([
                    (WorkoutIden::Name, workout.name.clone().into()),
                    (WorkoutIden::Duration, workout.duration.into()),
                    (WorkoutIden::Description, workout.description.clone().into()),
                    (WorkoutIden::Public, workout.public.into()),
                ])
                .and_where(Expr::col(WorkoutIden::Id).eq(workout.id))
                .build_rusqlite(SqliteQueryBuilder);
            tx.prepare_cached(&sql)?.execute(&*values.as_params())?;

            WorkoutExercise::set(&tx, workout.id, &changes.exercises)
                .context("Workout::update(WorkoutExercise)")?;
            workout
        };

        tx.commit()?;
        Ok(workout)
    }

    #[instrument(skip(conn))]
    pub fn delete(conn: &mut Connection, identity: &Identity, id: i64) -> Result<(), DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let requester = identity.profile(&tx)?;
            let workout = fetch::<Workout>(&tx, id)?;
            authorize_owner(&requester, &workout, "delete this workout")?;
            delete::<Workout>(&tx, id)?;
        }
        tx.commit()?;

        info!(workout_id = id, "Deleted workout");
        Ok(())
    }

    /// Appends the requester's exercises to the end of the workout. Ids
    /// already in the workout are skipped.
    #[instrument(skip(conn))]
    pub fn add_exercises(
        conn: &mut Connection,
        identity: &Identity,
        id: i64,
        exercise_ids: &[i64],
    ) -> Result<Vec<Exercise>, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exercises = {
            let requester = identity.profile(&tx)?;
            let workout = fetch::<Workout>(&tx, id)?;
            authorize_owner(&requester, &workout, "add exercises to this workout")?;

            let mut errors = ValidationError::default();
            let cleaned = clean_exercise_choices(&tx, &mut errors, requester.id, exercise_ids)?;
            if !errors.is_empty() {
                return Err(errors.into());
            }

            let added = WorkoutExercise::append(&tx, workout.id, &cleaned)?;
            debug!(added);
            workout.exercises(&tx)?
        };

        tx.commit()?;
        Ok(exercises)
    }

    /// Marks the workout done. Completing twice is fine.
    #[instrument(skip(conn))]
    pub fn complete(conn: &mut Connection, identity: &Identity, id: i64) -> Result<Workout, DomainError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let workout = {
            let requester = identity.profile(&tx)?;
            let mut workout = fetch::<Workout>(&tx, id)?;
            authorize_owner(&requester, &workout, "complete this workout")?;

            if !workout.completed {
                let (sql, values) = Query::update()
                    .table(WorkoutIden::Table)
                    .value(WorkoutIden::Completed, true)
                    .and_where(Expr::col(WorkoutIden::Id).eq(workout.id))
                    .build_rusqlite(SqliteQueryBuilder);
                tx.prepare_cached(&sql)?.execute(&*values.as_params())?;
                workout.completed = true;
                info!(workout_id = workout.id, "Completed workout");
            }
            workout
        };

        tx.commit()?;
        Ok(workout)
    }

    /// The requester's own workouts, newest first
    pub fn fetch_for_profile(conn: &Connection, identity: &Identity) -> Result<Vec<Workout>, DomainError> {
        let requester = identity.profile(conn)?;
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(WorkoutIden::ProfileId).eq(requester.id))
                .order_by(WorkoutIden::CreationDate, Order::Desc)
                .order_by(WorkoutIden::Id, Order::Desc),
        )
    }

    pub fn fetch_public(conn: &Connection) -> Result<Vec<Workout>, DomainError> {
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(WorkoutIden::Public).eq(true))
                .order_by(WorkoutIden::CreationDate, Order::Desc)
                .order_by(WorkoutIden::Id, Order::Desc),
        )
    }

    /// Member exercises ordered by position, then exercise id
    pub fn exercises(&self, conn: &Connection) -> Result<Vec<Exercise>, DomainError> {
        query_all(
            conn,
            Query::select()
                .columns(EXERCISE_STAR.map(|c| (ExerciseIden::Table, c)))
                .from(ExerciseIden::Table)
                .inner_join(
                    WorkoutExerciseIden::Table,
                    Expr::col((WorkoutExerciseIden::Table, WorkoutExerciseIden::ExerciseId))
                        .equals((ExerciseIden::Table, ExerciseIden::Id)),
                )
                .and_where(
                    Expr::col((WorkoutExerciseIden::Table, WorkoutExerciseIden::WorkoutId)).eq(self.id),
                )
                .order_by((WorkoutExerciseIden::Table, WorkoutExerciseIden::Position), Order::Asc)
                .order_by((ExerciseIden::Table, ExerciseIden::Id), Order::Asc),
        )
    }

    pub fn detail(conn: &Connection, identity: &Identity, id: i64) -> Result<WorkoutDetail, DomainError> {
        let requester = identity.profile(conn)?;
        let workout = fetch::<Workout>(conn, id)?;
        workout.authorize_view(&requester, "view this workout")?;

        let exercises = workout.exercises(conn)?;
        let progress = ExerciseProgress::fetch_for_workout(conn, workout.id, requester.id)?;

        Ok(WorkoutDetail {
            workout,
            exercises,
            progress,
        })
    }

    pub fn summary(conn: &Connection, identity: &Identity, id: i64) -> Result<WorkoutSummary, DomainError> {
        let requester = identity.profile(conn)?;
        let workout = fetch::<Workout>(conn, id)?;
        authorize_owner(&requester, &workout, "view this workout summary")?;

        let progress = ExerciseProgress::fetch_for_workout(conn, workout.id, workout.profile_id)?;
        let exercises = workout
            .exercises(conn)?
            .into_iter()
            .map(|exercise| {
                let progress = progress
                    .iter()
                    .find(|p| p.exercise_id == exercise.id)
                    .cloned();
                ExerciseSummary { exercise, progress }
            })
            .collect();

        Ok(WorkoutSummary { workout, exercises })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        model::{fetch_optional, ExerciseForm, ExerciseProgressForm},
        test_utils, FieldErrorKind,
    };

    fn exercise(conn: &mut Connection, identity: &Identity, name: &str) -> Exercise {
        let form = ExerciseForm {
            name: name.into(),
            category: "Upper Body".into(),
            description: String::new(),
        };
        Exercise::create(conn, identity, &form).unwrap()
    }

    fn form(name: &str, exercises: Vec<i64>) -> WorkoutForm {
        WorkoutForm {
            name: name.into(),
            duration: Some(30),
            exercises,
            ..Default::default()
        }
    }

    fn workout_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM workout", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_missing_or_zero_duration_is_required() {
        let mut conn = test_utils::connection();
        let (user, _) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        for duration in [None, Some(0)] {
            let mut f = form("Push", vec![]);
            f.duration = duration;
            let e = Workout::create(&mut conn, &identity, &f).unwrap_err();
            let v = e.validation().unwrap();
            assert!(v.has("duration", FieldErrorKind::Required));
            assert_eq!(v.for_field("duration").next().unwrap().message, "Duration is required.");
        }
        assert_eq!(workout_count(&conn), 0);
    }

    #[test]
    fn test_create_keeps_submitted_order() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let a = exercise(&mut conn, &identity, "A");
        let b = exercise(&mut conn, &identity, "B");
        let c = exercise(&mut conn, &identity, "C");

        let workout =
            Workout::create(&mut conn, &identity, &form("Push", vec![c.id, a.id, c.id, b.id])).unwrap();
        assert_eq!(workout.profile_id, profile.id);
        assert!(!workout.completed);
        assert!(!workout.public);
        assert_eq!(workout.creation_date, Utc::now().date_naive());

        let names: Vec<_> = workout
            .exercises(&conn)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_foreign_exercises_are_not_a_choice() {
        let mut conn = test_utils::connection();
        let (alice, _) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");
        let alice = test_utils::identity(&alice);
        let bob = test_utils::identity(&bob);

        let theirs = exercise(&mut conn, &bob, "Curl");
        let e = Workout::create(&mut conn, &alice, &form("Arms", vec![theirs.id, 9999])).unwrap_err();
        let v = e.validation().unwrap();
        assert_eq!(v.for_field("exercises").count(), 2);
        assert!(v.has("exercises", FieldErrorKind::Choice));
        assert_eq!(workout_count(&conn), 0);

        let mine = exercise(&mut conn, &alice, "Row");
        let w = Workout::create(&mut conn, &alice, &form("Back", vec![mine.id])).unwrap();
        let e = Workout::add_exercises(&mut conn, &alice, w.id, &[theirs.id]).unwrap_err();
        assert!(e.validation().unwrap().has("exercises", FieldErrorKind::Choice));
    }

    #[test]
    fn test_non_owner_cannot_complete() {
        let mut conn = test_utils::connection();
        let (alice, _) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");
        let alice = test_utils::identity(&alice);
        let bob = test_utils::identity(&bob);

        let w = Workout::create(&mut conn, &alice, &form("Legs", vec![])).unwrap();

        let e = Workout::complete(&mut conn, &bob, w.id).unwrap_err();
        assert!(e.is_authorization());
        assert!(!fetch::<Workout>(&conn, w.id).unwrap().completed);

        assert!(Workout::complete(&mut conn, &alice, w.id).unwrap().completed);
        assert!(Workout::complete(&mut conn, &alice, w.id).unwrap().completed);
        assert!(fetch::<Workout>(&conn, w.id).unwrap().completed);
    }

    #[test]
    fn test_update_replaces_fields_and_exercises() {
        let mut conn = test_utils::connection();
        let (user, _) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let a = exercise(&mut conn, &identity, "A");
        let b = exercise(&mut conn, &identity, "B");
        let c = exercise(&mut conn, &identity, "C");
        let w = Workout::create(&mut conn, &identity, &form("Push", vec![a.id, b.id])).unwrap();
        Workout::complete(&mut conn, &identity, w.id).unwrap();

        let mut f = form("Push v2", vec![c.id, b.id]);
        f.public = true;
        f.duration = Some(50);
        let updated = Workout::update(&mut conn, &identity, w.id, &f).unwrap();

        assert_eq!(updated.name, "Push v2");
        assert_eq!(updated.duration, 50);
        assert!(updated.public);
        assert!(updated.completed);
        assert_eq!(fetch::<Workout>(&conn, w.id).unwrap(), updated);

        let ids: Vec<_> = updated.exercises(&conn).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);
    }

    #[test]
    fn test_listings_are_scoped() {
        let mut conn = test_utils::connection();
        let (alice, _) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");
        let alice = test_utils::identity(&alice);
        let bob = test_utils::identity(&bob);

        let private = Workout::create(&mut conn, &alice, &form("Mine", vec![])).unwrap();
        let mut f = form("Shared", vec![]);
        f.public = true;
        let public = Workout::create(&mut conn, &alice, &f).unwrap();

        let ids: Vec<_> = Workout::fetch_for_profile(&conn, &alice)
            .unwrap()
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![public.id, private.id]);
        assert!(Workout::fetch_for_profile(&conn, &bob).unwrap().is_empty());
        assert_eq!(Workout::fetch_public(&conn).unwrap(), vec![public.clone()]);

        assert!(Workout::detail(&conn, &bob, private.id).unwrap_err().is_authorization());
        assert_eq!(Workout::detail(&conn, &bob, public.id).unwrap().workout, public);
        assert!(Workout::summary(&conn, &bob, public.id).unwrap_err().is_authorization());
    }

    #[test]
    fn test_summary_shows_first_attempt_per_exercise() {
        let mut conn = test_utils::connection();
        let (user, _) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let a = exercise(&mut conn, &identity, "A");
        let b = exercise(&mut conn, &identity, "B");
        let w = Workout::create(&mut conn, &identity, &form("Push", vec![a.id, b.id])).unwrap();

        for reps in [8, 10] {
            let f = ExerciseProgressForm {
                repetitions: reps,
                sets: 3,
                weight: 40.0,
            };
            ExerciseProgress::log(&mut conn, &identity, w.id, a.id, &f).unwrap();
        }

        let summary = Workout::summary(&conn, &identity, w.id).unwrap();
        assert_eq!(summary.exercises.len(), 2);
        assert_eq!(summary.exercises[0].exercise.id, a.id);
        assert_eq!(summary.exercises[0].progress.as_ref().unwrap().repetitions, 8);
        assert_eq!(summary.exercises[1].progress, None);

        let detail = Workout::detail(&conn, &identity, w.id).unwrap();
        assert_eq!(detail.progress.len(), 2);
    }

    #[test]
    fn test_delete_cascades_to_memberships() {
        let mut conn = test_utils::connection();
        let (alice, _) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");
        let alice = test_utils::identity(&alice);
        let bob = test_utils::identity(&bob);

        let a = exercise(&mut conn, &alice, "A");
        let w = Workout::create(&mut conn, &alice, &form("Push", vec![a.id])).unwrap();

        assert!(Workout::delete(&mut conn, &bob, w.id).unwrap_err().is_authorization());
        Workout::delete(&mut conn, &alice, w.id).unwrap();

        assert!(fetch_optional::<Workout>(&conn, w.id).unwrap().is_none());
        assert!(WorkoutExercise::ordered_exercise_ids(&conn, w.id).unwrap().is_empty());
        assert!(fetch_optional::<Exercise>(&conn, a.id).unwrap().is_some());
    }
}
