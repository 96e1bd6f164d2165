use chrono::{DateTime, Utc};
use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{enum_def, Expr, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    model::{delete, Identity, Profile, Record},
    DomainError, Object,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("user")]
#[check("../../../migrations/001-user/up.sql")]
#[enum_def]
pub struct User {
    pub id: i64,
    pub username: String,
    pub registration_date: DateTime<Utc>,
}

const USER_STAR: [UserIden; 3] = [UserIden::Id, UserIden::Username, UserIden::RegistrationDate];

impl Record for User {
    const OBJECT: Object = Object::User;

    fn select_star() -> SelectStatement {
        Query::select().columns(USER_STAR).from(UserIden::Table).to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(UserIden::Id).eq(id)
    }
}

/// A user together with their profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user: User,
    pub profile: Profile,
}

impl User {
    /// Username comparison ignores case
    pub fn fetch_by_username<T: AsRef<str>>(
        conn: &Connection,
        username: T,
    ) -> Result<Option<User>, DomainError> {
        let (sql, values) = Self::select_star()
            .and_where(Expr::col(UserIden::Username).eq(username.as_ref().trim()))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let user = stmt.query_row(&*values.as_params(), User::from_row).optional()?;
        Ok(user)
    }

    pub fn account(conn: &Connection, identity: &Identity) -> Result<Account, DomainError> {
        let user = identity.user(conn)?;
        let profile = identity.profile(conn)?;
        Ok(Account { user, profile })
    }

    /// Deletes the requester's own account. The profile and everything it
    /// owns goes with it.
    #[instrument(skip(conn))]
    pub fn delete_account(conn: &mut Connection, identity: &Identity) -> Result<(), DomainError> {
        let tx = conn.transaction()?;
        delete::<User>(&tx, identity.user_id)?;
        tx.commit()?;

        info!("Deleted account");
        Ok(())
    }
}
