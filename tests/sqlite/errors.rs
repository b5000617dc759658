use crate::common::{FailingEngine, setup_context};
use crate::context_test;
use quarry::core::SelectItem;
use quarry::prelude::*;
use quarry::sample::{self, QMember, QTeam, Team};

fn is_invalid<T>(result: Result<T>) -> bool {
    matches!(result, Err(QueryError::InvalidStatement(_)))
}

#[test]
fn builder_errors_surface_before_io() {
    let mut ctx = PersistenceContext::new(FailingEngine::queries());
    let (m, t) = (QMember::member(), QTeam::team());

    assert!(is_invalid(
        Query::select_list(Vec::<SelectItem>::new())
            .from(&m)
            .fetch(&mut ctx)
    ));
    assert!(is_invalid(Query::select_from(&m).on(t.name.eq("teamA")).fetch(&mut ctx)));
    assert!(is_invalid(Query::select_from(&m).fetch_join().fetch(&mut ctx)));
    assert!(is_invalid(
        Query::select_from(&m)
            .r#where(QTeam::new("elsewhere").name.eq("teamA"))
            .fetch(&mut ctx)
    ));
    assert_eq!(ctx.engine().calls, 0);
}

#[test]
fn fetch_join_rejects_on_condition() {
    let (m, t) = (QMember::member(), QTeam::team());

    let on_then_fetch = Query::select_from(&m)
        .join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .fetch_join()
        .build();
    assert!(is_invalid(on_then_fetch));

    let fetch_then_on = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .on(t.name.eq("teamA"))
        .build();
    assert!(is_invalid(fetch_then_on));
}

#[test]
fn fetch_join_requires_selected_owner() {
    let (m, t) = (QMember::member(), QTeam::team());

    let owner_not_selected = Query::select(m.username.clone())
        .from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .build();
    assert!(is_invalid(owner_not_selected));

    let duplicate_path = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .join(&m.team, &QTeam::new("t2"))
        .fetch_join()
        .build();
    assert!(is_invalid(duplicate_path));
}

#[test]
fn join_requires_known_owner_and_unique_alias() {
    let (m, t) = (QMember::member(), QTeam::team());
    let stranger = QMember::new("stranger");

    assert!(is_invalid(
        Query::select_from(&m).join(&stranger.team, &t).build()
    ));
    assert!(is_invalid(
        Query::select_from(&m)
            .join(&m.team, &QTeam::new("member"))
            .build()
    ));
}

#[test]
fn storage_errors_propagate() {
    let mut ctx = PersistenceContext::new(FailingEngine::queries());
    let m = QMember::member();

    let fetched = Query::select_from(&m).fetch(&mut ctx);
    assert!(matches!(fetched, Err(QueryError::StorageExecution(_))));

    let persisted = ctx.persist(Team::new("teamA"));
    assert!(matches!(persisted, Err(QueryError::StorageExecution(_))));
    assert_eq!(ctx.pending_writes(), 0);
}

#[test]
fn failed_flush_keeps_writes_staged() {
    let mut ctx = PersistenceContext::new(FailingEngine::writes());
    sample::seed(&mut ctx).unwrap();

    let flushed = ctx.flush();
    assert!(matches!(flushed, Err(QueryError::StorageExecution(_))));
    assert_eq!(ctx.pending_writes(), 6);

    let m = QMember::member();
    let fetched = Query::select_from(&m).fetch(&mut ctx);
    assert!(matches!(fetched, Err(QueryError::StorageExecution(_))));
}

#[test]
fn sqlite_errors_are_storage_errors() {
    let engine = quarry::sqlite::SqliteEngine::open_in_memory().unwrap();
    let mut ctx = PersistenceContext::new(engine);
    let m = QMember::member();

    match Query::select_from(&m).fetch(&mut ctx) {
        Err(QueryError::StorageExecution(source)) => {
            assert!(source.to_string().contains("no such table"));
        }
        other => panic!("expected a storage error, got {other:?}"),
    }
}

context_test!(tuple_lookup_of_unselected_expression, |ctx, _| {
    let m = QMember::member();
    let row = Query::select((m.username.clone(), m.age.clone()))
        .from(&m)
        .r#where(m.username.eq("member1"))
        .fetch_single(&mut ctx)?;

    assert!(matches!(row.get(&m.age.sum()), Err(QueryError::Mapping(_))));
    assert!(matches!(row.get_at::<i64>(5), Err(QueryError::Mapping(_))));
    assert!(matches!(row.get_at::<i64>(0), Err(QueryError::Mapping(_))));
});
