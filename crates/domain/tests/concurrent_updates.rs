use std::{sync::Barrier, thread};

use domain::{
    db,
    model::{Identity, NewUser, Profile, ProfileForm, ProfileHistory},
};

#[test]
fn concurrent_profile_updates_each_append_one_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.sqlite3");
    let conn_str = path.to_str().unwrap().to_owned();

    db::run_migrations(&conn_str).unwrap();

    let mut conn = db::open(&conn_str).unwrap();
    let (user, profile) = NewUser::new("alice").create(&mut conn).unwrap();
    let identity = Identity::from(&user);

    let barrier = Barrier::new(2);
    thread::scope(|s| {
        for weight in [70.0, 72.5] {
            let barrier = &barrier;
            let conn_str = &conn_str;
            let profile = &profile;
            s.spawn(move || {
                let mut conn = db::open(conn_str).unwrap();
                let mut form = ProfileForm::from(profile);
                form.weight = Some(weight);
                barrier.wait();
                Profile::update_with_history(&mut conn, &identity, profile.id, &form).unwrap();
            });
        }
    });

    let history = ProfileHistory::fetch_for_profile(&conn, &identity, profile.id).unwrap();
    assert_eq!(history.len(), 2);

    let mut weights: Vec<f64> = history.iter().filter_map(|h| h.weight).collect();
    weights.sort_by(f64::total_cmp);
    assert_eq!(weights, vec![70.0, 72.5]);

    let stored = domain::model::fetch::<Profile>(&conn, profile.id).unwrap();
    assert!(stored.weight == Some(70.0) || stored.weight == Some(72.5));
}

#[test]
fn migrations_persist_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.sqlite3");
    let conn_str = path.to_str().unwrap();

    assert!(db::run_migrations(conn_str).unwrap() > 0);
    assert_eq!(db::run_migrations(conn_str).unwrap(), 0);
}
