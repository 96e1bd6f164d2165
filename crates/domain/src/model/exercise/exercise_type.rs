use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{enum_def, Expr, Order, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};

use crate::{
    model::{constants::EXERCISE_CATEGORIES, query_all, Record},
    DomainError, Object,
};

/// Catalog entry used to tag exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("exercise_type")]
#[check("../../../migrations/004-exercise_type/up.sql")]
#[enum_def]
pub struct ExerciseType {
    pub id: i64,
    pub name: String,
    pub description: String,
}

const EXERCISE_TYPE_STAR: [ExerciseTypeIden; 3] = [
    ExerciseTypeIden::Id,
    ExerciseTypeIden::Name,
    ExerciseTypeIden::Description,
];

impl Record for ExerciseType {
    const OBJECT: Object = Object::ExerciseType;

    fn select_star() -> SelectStatement {
        Query::select()
            .columns(EXERCISE_TYPE_STAR)
            .from(ExerciseTypeIden::Table)
            .to_owned()
    }

    fn id_eq(id: i64) -> SimpleExpr {
        Expr::col(ExerciseTypeIden::Id).eq(id)
    }
}

impl ExerciseType {
    /// Whether exercises may be filed under this category name
    pub fn is_allowed_category(name: &str) -> bool {
        EXERCISE_CATEGORIES.contains(&name)
    }

    pub fn fetch_by_name(conn: &Connection, name: &str) -> Result<Option<ExerciseType>, DomainError> {
        let (sql, values) = Self::select_star()
            .and_where(Expr::col(ExerciseTypeIden::Name).eq(name))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        Ok(stmt.query_row(&*values.as_params(), ExerciseType::from_row).optional()?)
    }

    /// The catalog entries exercises can be filed under
    pub fn fetch_choices(conn: &Connection) -> Result<Vec<ExerciseType>, DomainError> {
        query_all(
            conn,
            Self::select_star()
                .and_where(Expr::col(ExerciseTypeIden::Name).is_in(EXERCISE_CATEGORIES))
                .order_by(ExerciseTypeIden::Id, Order::Asc),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{model::fetch_all, test_utils};

    #[test]
    fn test_choices_are_the_seeded_categories() {
        let conn = test_utils::connection();
        let names: Vec<_> = ExerciseType::fetch_choices(&conn)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, EXERCISE_CATEGORIES);
    }

    #[test]
    fn test_catalog_entries_outside_allow_list_are_not_choices() {
        let conn = test_utils::connection();
        conn.execute(
            "INSERT INTO exercise_type (name, description) VALUES ('Cardio', '')",
            [],
        )
        .unwrap();

        assert_eq!(fetch_all::<ExerciseType>(&conn).unwrap().len(), 5);
        assert_eq!(ExerciseType::fetch_choices(&conn).unwrap().len(), 4);

        let cardio = ExerciseType::fetch_by_name(&conn, "Cardio").unwrap().unwrap();
        assert!(!ExerciseType::is_allowed_category(&cardio.name));
    }
}
