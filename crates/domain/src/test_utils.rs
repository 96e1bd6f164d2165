use rusqlite::Connection;

use crate::{
    db,
    model::{Identity, NewUser, Profile, User},
};

/// Fresh in-memory database at the latest schema
pub fn connection() -> Connection {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    db::run_pragmas(&conn).expect("pragmas");
    db::migrate(&mut conn).expect("migrations");
    conn
}

pub fn register(conn: &mut Connection, username: &str) -> (User, Profile) {
    NewUser::new(username).create(conn).expect("register user")
}

pub fn identity(user: &User) -> Identity {
    Identity::from(user)
}
