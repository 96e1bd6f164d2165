use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use domain::model::{ExerciseForm, ExerciseProgressForm, ProfileForm, WorkoutForm};

#[derive(Debug, Clone, Parser)]
#[clap(name = "tracker", about = "Personal workout and progress tracker")]
pub struct Cli {
    #[clap(long, env, default_value = "tracker.sqlite")]
    pub sqlite_connection_string: String,
    /// The acting user. Matched case-insensitively
    #[clap(long, env = "TRACKER_USERNAME")]
    pub username: Option<String>,
    #[clap(long, env, default_value = "5000")]
    pub busy_timeout_ms: u64,
    #[clap(long, env, default_value = "4")]
    pub pool_size: usize,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a user together with an empty profile
    Register {
        #[arg(value_name = "USERNAME")]
        new_username: String,
    },
    /// Show the acting user and their profile
    Account,
    /// Delete the acting user and everything they own
    DeleteAccount,
    #[clap(subcommand)]
    Profile(ProfileCommand),
    /// List the categories exercises can be filed under
    ExerciseTypes,
    #[clap(subcommand)]
    Exercise(ExerciseCommand),
    #[clap(subcommand)]
    Workout(WorkoutCommand),
    /// Record an attempt at one exercise of a workout
    LogProgress {
        workout_id: i64,
        exercise_id: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        repetitions: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        sets: i64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        weight: f64,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileCommand {
    /// Change profile fields. Fields not given keep their current value
    Update(ProfileArgs),
    /// Height and weight after each update, oldest first
    History,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub email: Option<String>,
    /// M, F, O or Male, Female, Other
    #[arg(long)]
    pub gender: Option<String>,
    /// e.g. 5'4"
    #[arg(long)]
    pub height: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub weight: Option<f64>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub birthdate: Option<NaiveDate>,
    #[arg(long)]
    pub fitness_goal: Option<String>,
}

impl ProfileArgs {
    pub fn apply(self, form: &mut ProfileForm) {
        let ProfileArgs {
            first_name,
            last_name,
            age,
            email,
            gender,
            height,
            weight,
            birthdate,
            fitness_goal,
        } = self;

        if first_name.is_some() {
            form.first_name = first_name;
        }
        if last_name.is_some() {
            form.last_name = last_name;
        }
        if age.is_some() {
            form.age = age;
        }
        if email.is_some() {
            form.email = email;
        }
        if gender.is_some() {
            form.gender = gender;
        }
        if height.is_some() {
            form.height = height;
        }
        if weight.is_some() {
            form.weight = weight;
        }
        if birthdate.is_some() {
            form.birthdate = birthdate;
        }
        if fitness_goal.is_some() {
            form.fitness_goal = fitness_goal;
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum ExerciseCommand {
    Create(ExerciseArgs),
    Update {
        id: i64,
        #[clap(flatten)]
        exercise: ExerciseArgs,
    },
    Delete {
        id: i64,
    },
    /// The acting user's exercises
    List,
    /// One exercise with its logged progress
    Show {
        id: i64,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ExerciseArgs {
    #[arg(long)]
    pub name: String,
    /// Upper Body, Core, Lower Body or Full Body
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

impl From<ExerciseArgs> for ExerciseForm {
    fn from(args: ExerciseArgs) -> Self {
        Self {
            name: args.name,
            category: args.category,
            description: args.description,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum WorkoutCommand {
    Create(WorkoutArgs),
    /// Replace a workout's fields and exercises
    Update {
        id: i64,
        #[clap(flatten)]
        workout: WorkoutArgs,
    },
    Delete {
        id: i64,
    },
    /// Append exercises to the end of a workout
    AddExercises {
        id: i64,
        #[arg(required = true)]
        exercises: Vec<i64>,
    },
    Complete {
        id: i64,
    },
    /// The acting user's workouts
    List,
    /// Workouts anyone may follow
    Public,
    Show {
        id: i64,
    },
    /// First logged attempt per exercise
    Summary {
        id: i64,
    },
}

#[derive(Debug, Clone, Args)]
pub struct WorkoutArgs {
    #[arg(long)]
    pub name: String,
    /// Minutes
    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub public: bool,
    /// Exercise id, repeat in the order they should be performed
    #[arg(long = "exercise")]
    pub exercises: Vec<i64>,
}

impl From<WorkoutArgs> for WorkoutForm {
    fn from(args: WorkoutArgs) -> Self {
        Self {
            name: args.name,
            duration: args.duration,
            description: args.description,
            public: args.public,
            exercises: args.exercises,
        }
    }
}

pub fn progress_form(repetitions: i64, sets: i64, weight: f64) -> ExerciseProgressForm {
    ExerciseProgressForm {
        repetitions,
        sets,
        weight,
    }
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_workout_exercises_keep_order() {
        let cli = Cli::try_parse_from([
            "tracker",
            "--username",
            "alice",
            "workout",
            "create",
            "--name",
            "Legs",
            "--duration",
            "30",
            "--exercise",
            "3",
            "--exercise",
            "1",
        ])
        .unwrap();

        let Command::Workout(WorkoutCommand::Create(args)) = cli.command else {
            panic!("expected workout create");
        };
        let form = WorkoutForm::from(args);
        assert_eq!(form.exercises, vec![3, 1]);
        assert_eq!(form.duration, Some(30));
        assert!(!form.public);
    }

    #[test]
    fn test_profile_args_only_override_given_fields() {
        let mut form = ProfileForm {
            email: Some("a@example.com".into()),
            age: Some(30),
            ..Default::default()
        };
        ProfileArgs {
            height: Some("5'4".into()),
            ..Default::default()
        }
        .apply(&mut form);

        assert_eq!(form.email.as_deref(), Some("a@example.com"));
        assert_eq!(form.age, Some(30));
        assert_eq!(form.height.as_deref(), Some("5'4"));
    }

    #[test]
    fn test_negative_progress_reaches_validation() {
        let cli = Cli::try_parse_from([
            "tracker",
            "log-progress",
            "1",
            "2",
            "--repetitions",
            "-3",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::LogProgress { repetitions: -3, .. }));
    }
}
