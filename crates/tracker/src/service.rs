//! Async face of the domain. Each call checks a connection out of the pool
//! and runs one domain operation on it through `interact`.

use deadpool_sqlite::Pool;
use domain::model::{
    Account, Exercise, ExerciseDetail, ExerciseForm, ExerciseProgress, ExerciseProgressForm,
    ExerciseType, Identity, NewUser, NextStep, Profile, ProfileForm, ProfileHistory,
    ProgressLogged, User, Workout, WorkoutDetail, WorkoutForm, WorkoutSummary,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    #[serde(flatten)]
    pub account: Account,
    pub next: NextStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdated {
    pub profile: Profile,
    pub history: ProfileHistory,
}

#[derive(Debug, Clone)]
pub struct Tracker {
    pool: Pool,
}

impl Tracker {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn interact<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await?;
        conn.interact(f).await?
    }

    #[instrument(skip(self))]
    pub async fn register(&self, username: String) -> Result<Registered, AppError> {
        self.interact(move |conn| {
            let (user, profile) = NewUser::new(username).create(conn)?;
            let next = NewUser::next_step(&profile);
            Ok(Registered {
                account: Account { user, profile },
                next,
            })
        })
        .await
    }

    /// Resolves the acting user. The username is matched case-insensitively.
    #[instrument(skip(self))]
    pub async fn login(&self, username: String) -> Result<Session, AppError> {
        let user = self
            .interact(move |conn| {
                User::fetch_by_username(conn, &username)?.ok_or(AppError::UnknownUser(username))
            })
            .await?;
        debug!(user_id = user.id, "Acting as");

        Ok(Session {
            tracker: self.clone(),
            identity: Identity::from(&user),
        })
    }

    pub async fn exercise_types(&self) -> Result<Vec<ExerciseType>, AppError> {
        self.interact(|conn| Ok(ExerciseType::fetch_choices(conn)?)).await
    }

    pub async fn public_workouts(&self) -> Result<Vec<Workout>, AppError> {
        self.interact(|conn| Ok(Workout::fetch_public(conn)?)).await
    }
}

/// Operations performed on behalf of one resolved user
#[derive(Debug, Clone)]
pub struct Session {
    tracker: Tracker,
    identity: Identity,
}

impl Session {
    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection, &Identity) -> Result<T, domain::DomainError> + Send + 'static,
        T: Send + 'static,
    {
        let identity = self.identity;
        self.tracker
            .interact(move |conn| Ok(f(conn, &identity)?))
            .await
    }

    pub async fn account(&self) -> Result<Account, AppError> {
        self.run(|conn, identity| User::account(conn, identity)).await
    }

    pub async fn delete_account(self) -> Result<(), AppError> {
        self.run(|conn, identity| User::delete_account(conn, identity)).await
    }

    /// Starts from the current profile values so `edit` only has to touch
    /// the fields being changed.
    pub async fn update_profile<F>(&self, edit: F) -> Result<ProfileUpdated, AppError>
    where
        F: FnOnce(&mut ProfileForm) + Send + 'static,
    {
        self.run(move |conn, identity| {
            let profile_id = identity.profile(conn)?.id;
            let (profile, history) = Profile::edit_with_history(conn, identity, profile_id, edit)?;
            Ok(ProfileUpdated { profile, history })
        })
        .await
    }

    pub async fn profile_history(&self) -> Result<Vec<ProfileHistory>, AppError> {
        self.run(|conn, identity| {
            let profile = identity.profile(conn)?;
            ProfileHistory::fetch_for_profile(conn, identity, profile.id)
        })
        .await
    }

    pub async fn create_exercise(&self, form: ExerciseForm) -> Result<Exercise, AppError> {
        self.run(move |conn, identity| Exercise::create(conn, identity, &form)).await
    }

    pub async fn update_exercise(&self, id: i64, form: ExerciseForm) -> Result<Exercise, AppError> {
        self.run(move |conn, identity| Exercise::update(conn, identity, id, &form)).await
    }

    pub async fn delete_exercise(&self, id: i64) -> Result<(), AppError> {
        self.run(move |conn, identity| Exercise::delete(conn, identity, id)).await
    }

    pub async fn exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.run(|conn, identity| Exercise::fetch_for_profile(conn, identity)).await
    }

    pub async fn exercise(&self, id: i64) -> Result<ExerciseDetail, AppError> {
        self.run(move |conn, identity| Exercise::detail(conn, identity, id)).await
    }

    pub async fn create_workout(&self, form: WorkoutForm) -> Result<Workout, AppError> {
        self.run(move |conn, identity| Workout::create(conn, identity, &form)).await
    }

    pub async fn update_workout(&self, id: i64, form: WorkoutForm) -> Result<Workout, AppError> {
        self.run(move |conn, identity| Workout::update(conn, identity, id, &form)).await
    }

    pub async fn delete_workout(&self, id: i64) -> Result<(), AppError> {
        self.run(move |conn, identity| Workout::delete(conn, identity, id)).await
    }

    pub async fn add_exercises(&self, id: i64, exercise_ids: Vec<i64>) -> Result<Vec<Exercise>, AppError> {
        self.run(move |conn, identity| Workout::add_exercises(conn, identity, id, &exercise_ids))
            .await
    }

    pub async fn complete_workout(&self, id: i64) -> Result<Workout, AppError> {
        self.run(move |conn, identity| Workout::complete(conn, identity, id)).await
    }

    pub async fn workouts(&self) -> Result<Vec<Workout>, AppError> {
        self.run(|conn, identity| Workout::fetch_for_profile(conn, identity)).await
    }

    pub async fn workout(&self, id: i64) -> Result<WorkoutDetail, AppError> {
        self.run(move |conn, identity| Workout::detail(conn, identity, id)).await
    }

    pub async fn workout_summary(&self, id: i64) -> Result<WorkoutSummary, AppError> {
        self.run(move |conn, identity| Workout::summary(conn, identity, id)).await
    }

    pub async fn log_progress(
        &self,
        workout_id: i64,
        exercise_id: i64,
        form: ExerciseProgressForm,
    ) -> Result<ProgressLogged, AppError> {
        self.run(move |conn, identity| {
            ExerciseProgress::log(conn, identity, workout_id, exercise_id, &form)
        })
        .await
    }
}
