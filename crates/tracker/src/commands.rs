use std::fmt::Debug;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{
    cli::{progress_form, Cli, Command, ExerciseCommand, ProfileCommand, WorkoutCommand},
    service::{Session, Tracker},
    AppError,
};

fn to_json<T: Serialize + Debug>(value: T) -> Result<Value, AppError> {
    debug!(?value);
    Ok(serde_json::to_value(value)?)
}

fn deleted(object: &str, id: i64) -> Value {
    json!({ "deleted": object, "id": id })
}

async fn login(tracker: &Tracker, args: &Cli) -> Result<Session, AppError> {
    let username = args.username.clone().ok_or(AppError::MissingUsername)?;
    tracker.login(username).await
}

/// Runs one parsed command and returns what should be printed
#[instrument(skip(tracker))]
pub async fn run(tracker: &Tracker, args: &Cli) -> Result<Value, AppError> {
    match args.command.clone() {
        Command::Register { new_username } => to_json(tracker.register(new_username).await?),
        Command::ExerciseTypes => to_json(tracker.exercise_types().await?),
        Command::Workout(WorkoutCommand::Public) => to_json(tracker.public_workouts().await?),
        Command::Account => to_json(login(tracker, args).await?.account().await?),
        Command::DeleteAccount => {
            let session = login(tracker, args).await?;
            let user_id = session.identity().user_id;
            session.delete_account().await?;
            Ok(deleted("user", user_id))
        }
        Command::Profile(command) => run_profile(&login(tracker, args).await?, command).await,
        Command::Exercise(command) => run_exercise(&login(tracker, args).await?, command).await,
        Command::Workout(command) => run_workout(&login(tracker, args).await?, command).await,
        Command::LogProgress {
            workout_id,
            exercise_id,
            repetitions,
            sets,
            weight,
        } => to_json(
            login(tracker, args)
                .await?
                .log_progress(workout_id, exercise_id, progress_form(repetitions, sets, weight))
                .await?,
        ),
    }
}

async fn run_profile(session: &Session, command: ProfileCommand) -> Result<Value, AppError> {
    match command {
        ProfileCommand::Update(args) => to_json(session.update_profile(move |form| args.apply(form)).await?),
        ProfileCommand::History => to_json(session.profile_history().await?),
    }
}

async fn run_exercise(session: &Session, command: ExerciseCommand) -> Result<Value, AppError> {
    match command {
        ExerciseCommand::Create(args) => to_json(session.create_exercise(args.into()).await?),
        ExerciseCommand::Update { id, exercise } => {
            to_json(session.update_exercise(id, exercise.into()).await?)
        }
        ExerciseCommand::Delete { id } => {
            session.delete_exercise(id).await?;
            Ok(deleted("exercise", id))
        }
        ExerciseCommand::List => to_json(session.exercises().await?),
        ExerciseCommand::Show { id } => to_json(session.exercise(id).await?),
    }
}

async fn run_workout(session: &Session, command: WorkoutCommand) -> Result<Value, AppError> {
    match command {
        WorkoutCommand::Create(args) => to_json(session.create_workout(args.into()).await?),
        WorkoutCommand::Update { id, workout } => {
            to_json(session.update_workout(id, workout.into()).await?)
        }
        WorkoutCommand::Delete { id } => {
            session.delete_workout(id).await?;
            Ok(deleted("workout", id))
        }
        WorkoutCommand::AddExercises { id, exercises } => {
            to_json(session.add_exercises(id, exercises).await?)
        }
        WorkoutCommand::Complete { id } => to_json(session.complete_workout(id).await?),
        WorkoutCommand::List => to_json(session.workouts().await?),
        WorkoutCommand::Public => to_json(session.tracker().public_workouts().await?),
        WorkoutCommand::Show { id } => to_json(session.workout(id).await?),
        WorkoutCommand::Summary { id } => to_json(session.workout_summary(id).await?),
    }
}
