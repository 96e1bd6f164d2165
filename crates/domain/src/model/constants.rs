pub const USERNAME_MIN_LENGTH: usize = 1;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 100;
pub const FITNESS_GOAL_MAX_LENGTH: usize = 200;

pub const DEFAULT_AGE: u32 = 18;

/// The only exercise categories an exercise may be filed under
pub const EXERCISE_CATEGORIES: [&str; 4] = ["Upper Body", "Core", "Lower Body", "Full Body"];
