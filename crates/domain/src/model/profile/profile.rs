use chrono::NaiveDate;
use exemplar::Model;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use sea_query::{enum_def, Expr, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::ResultContext,
    model::{
        authorize_owner, constants::DEFAULT_AGE, exists_where, fetch, Identity, NewProfileHistory,
        Owned, ProfileChanges, ProfileForm, ProfileHistory, Record,
    },
    types::{Gender, Height},
    DomainError, Object,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("profile")]
#[check("../../../migrations/002-profile/up.sql")]
#[enum_def]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: u32,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub height: Option<Height>,
    pub weight: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub fitness_goal: String,
}

const PROFILE_STAR: [ProfileIden; 11] = [
    ProfileIden::Id,
    ProfileIden::UserId,
    ProfileIden::FirstName,
    ProfileIden::LastName,
    ProfileIden::Age,
    ProfileIden::Email,
    ProfileIden::Gender,
    ProfileIden::Height,
    ProfileIden::Weight,
    ProfileIden::Birthdate,
    ProfileIden::FitnessGoal,
];

impl Record for Profile {
    const OBJECT: Object = Object::Profile;

    fn select_star() -> SelectStatement {
        Query::select().columns(PROFILE_STAR).from(ProfileIden::Table).to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(ProfileIden::Id).eq(id)
    }
}

impl Owned for Profile {
    fn owner_profile_id(&self) -> i64 {
        self.id
    }
}

/// The profile every new user starts with; all other columns take their
/// schema defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("profile")]
pub struct NewProfile {
    pub user_id: i64,
    pub age: u32,
}

impl NewProfile {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            age: DEFAULT_AGE,
        }
    }
}

impl Profile {
    pub fn fetch_by_user_id(conn: &Connection, user_id: i64) -> Result<Profile, DomainError> {
        let (sql, values) = Self::select_star()
            .and_where(Expr::col(ProfileIden::UserId).eq(user_id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_row(&*values.as_params(), Profile::from_row)
            .optional()?
            .ok_or_else(|| DomainError::not_found(Object::Profile, user_id))
            .context(format!("Profile for user {user_id}"))
    }

    /// Whether a profile other than `exclude` already uses this email.
    /// Comparison is case sensitive.
    pub fn email_taken(conn: &Connection, email: &str, exclude: i64) -> Result<bool, DomainError> {
        exists_where::<Profile>(
            conn,
            Expr::col(ProfileIden::Email)
                .eq(email)
                .and(Expr::col(ProfileIden::Id).ne(exclude)),
        )
    }

    pub fn apply(&mut self, changes: ProfileChanges) {
        let ProfileChanges {
            first_name,
            last_name,
            age,
            email,
            gender,
            height,
            weight,
            birthdate,
            fitness_goal,
        } = changes;

        self.first_name = first_name;
        self.last_name = last_name;
        self.age = age;
        self.email = email;
        self.gender = gender;
        self.height = height;
        self.weight = weight;
        self.birthdate = birthdate;
        self.fitness_goal = fitness_goal;
    }

    fn save(&self, conn: &Connection) -> Result<(), DomainError> {
        let (sql, values) = Query::update()
            .table(ProfileIden::Table)
            .values([
                (ProfileIden::FirstName, self.first_name.clone().into()),
                (ProfileIden::LastName, self.last_name.clone().into()),
                (ProfileIden::Age, self.age.into()),
                (ProfileIden::Email, self.email.clone().into()),
                (ProfileIden::Gender, self.gender.map(|g| g.code().to_owned()).into()),
                (ProfileIden::Height, self.height.map(|h| h.inches()).into()),
                (ProfileIden::Weight, self.weight.into()),
                (ProfileIden::Birthdate, self.birthdate.into()),
                (ProfileIden::FitnessGoal, self.fitness_goal.clone().into()),
            ])
            .and_where(Expr::col(ProfileIden::Id).eq(self.id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(&*values.as_params())?;

        Ok(())
    }

    /// Saves the submitted form and appends a history snapshot of the new
    /// height and weight. Both writes share one immediate transaction so a
    /// concurrent update can never see one without the other.
    #[instrument(skip(conn, form))]
    pub fn update_with_history(
        conn: &mut Connection,
        identity: &Identity,
        profile_id: i64,
        form: &ProfileForm,
    ) -> Result<(Profile, ProfileHistory), DomainError> {
        Self::save_with_history(conn, identity, profile_id, |tx, profile| form.clean(tx, profile.id))
    }

    /// Like [`Profile::update_with_history`], but `edit` changes a form
    /// prefilled from the profile as read inside the transaction, so fields
    /// it leaves alone keep whatever a concurrent update stored.
    #[instrument(skip(conn, edit))]
    pub fn edit_with_history<F>(
        conn: &mut Connection,
        identity: &Identity,
        profile_id: i64,
        edit: F,
    ) -> Result<(Profile, ProfileHistory), DomainError>
    where
        F: FnOnce(&mut ProfileForm),
    {
        Self::save_with_history(conn, identity, profile_id, |tx, profile| {
            let mut form = ProfileForm::from(profile);
            edit(&mut form);
            form.clean(tx, profile.id)
        })
    }

    fn save_with_history<F>(
        conn: &mut Connection,
        identity: &Identity,
        profile_id: i64,
        changes: F,
    ) -> Result<(Profile, ProfileHistory), DomainError>
    where
        F: FnOnce(&Connection, &Profile) -> Result<ProfileChanges, DomainError>,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (profile, history) = {
            let requester = identity.profile(&tx)?;
            let mut profile = fetch::<Profile>(&tx, profile_id)?;
            authorize_owner(&requester, &profile, "update this profile")?;

            let changes = changes(&tx, &profile)?;
            profile.apply(changes);
            profile.save(&tx).context("Profile::save")?;

            let history = NewProfileHistory::snapshot(&profile)
                .create(&tx)
                .context("Profile::update_with_history(ProfileHistory)")?;
            (profile, history)
        };

        tx.commit()?;

        debug!(?profile);
        info!(profile_id = profile.id, history_id = history.id, "Updated profile");
        Ok((profile, history))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_utils, FieldErrorKind};

    fn form_for(profile: &Profile) -> ProfileForm {
        ProfileForm::from(profile)
    }

    #[test]
    fn test_update_parses_height_and_appends_history() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let mut form = form_for(&profile);
        form.height = Some("5'4\"".into());
        form.weight = Some(61.5);
        form.gender = Some("female".into());

        let (updated, history) =
            Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap();

        assert_eq!(updated.height, Some(Height::from_inches(64)));
        assert_eq!(updated.weight, Some(61.5));
        assert_eq!(updated.gender, Some(Gender::Female));
        assert_eq!(fetch::<Profile>(&conn, profile.id).unwrap(), updated);

        assert_eq!(history.profile_id, profile.id);
        assert_eq!(history.height, Some(Height::from_inches(64)));
        assert_eq!(history.weight, Some(61.5));

        let stored: i64 = conn
            .query_row("SELECT height FROM profile WHERE id = ?1", [profile.id], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, 64);
    }

    #[test]
    fn test_each_update_appends_one_snapshot() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        for (height, weight) in [("5'10", 80.0), ("5'10", 78.5), ("5'11", 77.0)] {
            let mut form = form_for(&profile);
            form.height = Some(height.into());
            form.weight = Some(weight);
            Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap();
        }

        let history = ProfileHistory::fetch_for_profile(&conn, &identity, profile.id).unwrap();
        let weights: Vec<_> = history.iter().map(|h| h.weight).collect();
        assert_eq!(weights, vec![Some(80.0), Some(78.5), Some(77.0)]);
        assert_eq!(history[2].height, Some(Height::from_inches(71)));
    }

    #[test]
    fn test_email_must_be_unique_across_profiles() {
        let mut conn = test_utils::connection();
        let (alice, alice_profile) = test_utils::register(&mut conn, "alice");
        let (bob, bob_profile) = test_utils::register(&mut conn, "bob");

        let mut form = form_for(&alice_profile);
        form.email = Some("shared@example.com".into());
        Profile::update_with_history(&mut conn, &test_utils::identity(&alice), alice_profile.id, &form)
            .unwrap();

        let mut form = form_for(&bob_profile);
        form.email = Some("shared@example.com".into());
        let e = Profile::update_with_history(&mut conn, &test_utils::identity(&bob), bob_profile.id, &form)
            .unwrap_err();
        assert!(e.validation().unwrap().has("email", FieldErrorKind::Uniqueness));

        // Nothing was written for bob
        assert_eq!(fetch::<Profile>(&conn, bob_profile.id).unwrap(), bob_profile);
        let history = ProfileHistory::fetch_for_profile(&conn, &test_utils::identity(&bob), bob_profile.id)
            .unwrap();
        assert!(history.is_empty());

        // Differing only by case is a different email
        form.email = Some("Shared@example.com".into());
        Profile::update_with_history(&mut conn, &test_utils::identity(&bob), bob_profile.id, &form)
            .unwrap();
    }

    #[test]
    fn test_resaving_own_email_succeeds() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let mut form = form_for(&profile);
        form.email = Some("alice@example.com".into());
        let (profile, _) = Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap();

        let mut form = form_for(&profile);
        form.fitness_goal = Some("Run a marathon".into());
        let (profile, _) = Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap();
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
        assert_eq!(profile.fitness_goal, "Run a marathon");
    }

    #[test]
    fn test_all_field_errors_are_reported_together() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let mut form = form_for(&profile);
        form.height = Some("tall".into());
        form.age = Some(0);
        form.email = Some("not-an-email".into());
        form.gender = Some("unknown".into());

        let e = Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap_err();
        let v = e.validation().unwrap();
        assert!(v.has("height", FieldErrorKind::Format));
        assert!(v.has("age", FieldErrorKind::Invalid));
        assert!(v.has("email", FieldErrorKind::Format));
        assert!(v.has("gender", FieldErrorKind::Choice));
        assert_eq!(fetch::<Profile>(&conn, profile.id).unwrap(), profile);
    }

    #[test]
    fn test_only_owner_may_update() {
        let mut conn = test_utils::connection();
        let (_, alice_profile) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");

        let mut form = form_for(&alice_profile);
        form.age = Some(40);
        let e = Profile::update_with_history(&mut conn, &test_utils::identity(&bob), alice_profile.id, &form)
            .unwrap_err();
        assert!(e.is_authorization());
        assert_eq!(fetch::<Profile>(&conn, alice_profile.id).unwrap().age, 18);
    }

    #[test]
    fn test_missing_profile_is_not_found() {
        let mut conn = test_utils::connection();
        let (user, profile) = test_utils::register(&mut conn, "alice");
        let e = Profile::update_with_history(
            &mut conn,
            &test_utils::identity(&user),
            profile.id + 100,
            &form_for(&profile),
        )
        .unwrap_err();
        assert!(e.is_not_found());
    }

    #[test]
    fn test_edit_keeps_fields_changed_since_read() {
        let mut conn = test_utils::connection();
        let (user, stale) = test_utils::register(&mut conn, "alice");
        let identity = test_utils::identity(&user);

        let mut form = form_for(&stale);
        form.email = Some("alice@example.com".into());
        Profile::update_with_history(&mut conn, &identity, stale.id, &form).unwrap();

        let (updated, _) = Profile::edit_with_history(&mut conn, &identity, stale.id, |form| {
            form.fitness_goal = Some("Run a 10k".into())
        })
        .unwrap();

        assert_eq!(updated.email.as_deref(), Some("alice@example.com"));
        assert_eq!(updated.fitness_goal, "Run a 10k");
        assert_eq!(fetch::<Profile>(&conn, stale.id).unwrap(), updated);
    }

    #[test]
    fn test_edit_rejects_other_users_profile() {
        let mut conn = test_utils::connection();
        let (_, alice_profile) = test_utils::register(&mut conn, "alice");
        let (bob, _) = test_utils::register(&mut conn, "bob");

        let e = Profile::edit_with_history(&mut conn, &test_utils::identity(&bob), alice_profile.id, |form| {
            form.first_name = Some("Mallory".into())
        })
        .unwrap_err();
        assert!(e.is_authorization());
        assert_eq!(fetch::<Profile>(&conn, alice_profile.id).unwrap(), alice_profile);
    }
}
