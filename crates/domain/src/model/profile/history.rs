use chrono::{NaiveDate, Utc};
use exemplar::Model;
use rusqlite::Connection;
use sea_query::{enum_def, Expr, Order, Query, SelectStatement, SimpleExpr};
use serde::{Deserialize, Serialize};

use crate::{
    model::{authorize_owner, fetch, query_all, Identity, Profile, Record},
    types::Height,
    DomainError, Object,
};

/// Height and weight as they were right after a profile update. Rows are
/// only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("profile_history")]
#[check("../../../migrations/003-profile_history/up.sql")]
#[enum_def]
pub struct ProfileHistory {
    pub id: i64,
    pub profile_id: i64,
    pub height: Option<Height>,
    pub weight: Option<f64>,
    pub recorded_date: NaiveDate,
}

const PROFILE_HISTORY_STAR: [ProfileHistoryIden; 5] = [
    ProfileHistoryIden::Id,
    ProfileHistoryIden::ProfileId,
    ProfileHistoryIden::Height,
    ProfileHistoryIden::Weight,
    ProfileHistoryIden::RecordedDate,
];

impl Record for ProfileHistory {
    const OBJECT: Object = Object::ProfileHistory;

    fn select_star() -> SelectStatement {
        Query::select()
            .columns(PROFILE_HISTORY_STAR)
            .from(ProfileHistoryIden::Table)
            .to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(ProfileHistoryIden::Id).eq(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("profile_history")]
pub struct NewProfileHistory {
    pub profile_id: i64,
    pub height: Option<Height>,
    pub weight: Option<f64>,
    pub recorded_date: NaiveDate,
}

impl NewProfileHistory {
    /// Snapshot of the profile as it is now, dated today
    pub fn snapshot(profile: &Profile) -> Self {
        Self {
            profile_id: profile.id,
            height: profile.height,
            weight: profile.weight,
            recorded_date: Utc::now().date_naive(),
        }
    }

    pub fn create(&self, conn: &Connection) -> Result<ProfileHistory, DomainError> {
        self.insert(conn)?;
        fetch(conn, conn.last_insert_rowid())
    }
}

impl ProfileHistory {
    /// Oldest first
    pub fn fetch_for_profile(
        conn: &Connection,
        identity: &Identity,
        profile_id: i64,
    ) -> Result<Vec<ProfileHistory>, DomainError> {
        let requester = identity.profile(conn)?;
        let profile = fetch::<Profile>(conn, profile_id)?;
        authorize_owner(&requester, &profile, "view this profile's history")?;

        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(ProfileHistoryIden::ProfileId).eq(profile_id))
                .order_by(ProfileHistoryIden::RecordedDate, Order::Asc)
                .order_by(ProfileHistoryIden::Id, Order::Asc),
        )
    }
}
