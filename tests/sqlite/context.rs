use std::rc::Rc;

use crate::common::{setup_context, setup_context_with};
use crate::context_test;
use quarry::core::ToSQL;
use quarry::prelude::*;
use quarry::sample::{self, Member, QMember, QTeam, Team};

context_test!(persist_assigns_sequential_identities, |ctx, data| {
    assert_eq!(data.team_a.id(), Some(1));
    assert_eq!(data.team_b.id(), Some(2));
    let ids: Vec<_> = data.members.iter().map(|member| member.id()).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert_eq!(data.members[2].team().id(), Some(2));

    assert_eq!(ctx.pending_writes(), 6);
    assert_eq!(ctx.resident_count(), 6);
    assert!(ctx.contains(&*data.members[0]));
});

context_test!(flush_writes_staged_entities, |ctx, _| {
    assert_eq!(ctx.flush()?, 6);
    assert_eq!(ctx.pending_writes(), 0);
    assert_eq!(ctx.flush()?, 0);

    let rows = ctx.native_query("SELECT COUNT(*) FROM member", &[])?;
    assert_eq!(rows, vec![vec![Value::Integer(4)]]);
});

context_test!(auto_flush_before_query, |ctx, _| {
    let m = QMember::member();
    let writes = ctx.engine().writes;
    let members = Query::select_from(&m).fetch(&mut ctx)?;
    assert_eq!(members.len(), 4);
    assert_eq!(ctx.engine().writes, writes + 6);
    assert_eq!(ctx.pending_writes(), 0);
});

#[test]
fn commit_mode_waits_for_flush() -> quarry::Result<()> {
    let mut ctx = setup_context_with(ContextConfig::new().flush_mode(FlushMode::Commit));
    assert_eq!(ctx.config().flush_mode, FlushMode::Commit);
    sample::seed(&mut ctx)?;

    let m = QMember::member();
    assert!(Query::select_from(&m).fetch(&mut ctx)?.is_empty());

    ctx.flush()?;
    assert_eq!(Query::select_from(&m).fetch(&mut ctx)?.len(), 4);
    Ok(())
}

#[test]
fn clear_discards_unflushed_writes() -> quarry::Result<()> {
    let mut ctx = setup_context_with(ContextConfig::new().flush_mode(FlushMode::Commit));
    let data = sample::seed(&mut ctx)?;

    ctx.clear();
    assert_eq!(ctx.pending_writes(), 0);
    assert_eq!(ctx.resident_count(), 0);
    assert!(!ctx.contains(&*data.members[0]));
    assert_eq!(ctx.flush()?, 0);

    let m = QMember::member();
    assert!(Query::select_from(&m).fetch(&mut ctx)?.is_empty());
    Ok(())
}

context_test!(persist_rejects_assigned_identity, |ctx, _| {
    let member = Member::new("member9", 90);
    member.identity().assign(99)?;

    let result = ctx.persist(member);
    assert!(matches!(result, Err(QueryError::Persistence(_))));
    assert_eq!(ctx.pending_writes(), 6);
});

context_test!(flush_rejects_transient_reference, |ctx, _| {
    ctx.flush()?;
    let ghost = Rc::new(Team::new("ghost"));
    ctx.persist(Member::new("haunted", 13).with_team(&ghost))?;

    let result = ctx.flush();
    assert!(matches!(result, Err(QueryError::Persistence(_))));
    assert_eq!(ctx.pending_writes(), 1);
});

context_test!(find_uses_identity_map_then_storage, |ctx, data| {
    ctx.flush()?;
    let queries = ctx.engine().queries;
    let team_a = ctx.find::<Team>(1)?.expect("teamA exists");
    assert!(Rc::ptr_eq(&team_a, &data.team_a));
    assert_eq!(ctx.engine().queries, queries);

    ctx.clear();
    let reloaded = ctx.find::<Team>(1)?.expect("teamA exists");
    assert!(!Rc::ptr_eq(&reloaded, &data.team_a));
    assert_eq!(*reloaded, *data.team_a);
    assert_eq!(reloaded.name(), "teamA");
    assert_eq!(ctx.engine().queries, queries + 1);

    assert!(ctx.find::<Team>(42)?.is_none());
});

context_test!(load_handles_empty_and_missing_targets, |ctx, _| {
    let empty = Association::<Team>::empty();
    assert!(ctx.load(&empty)?.is_none());

    let dangling = Association::<Team>::unresolved(999);
    let result = ctx.load(&dangling);
    assert!(matches!(result, Err(QueryError::Persistence(_))));
    assert!(!dangling.is_loaded());
});

context_test!(repeated_reads_share_instances, |ctx, _| {
    ctx.flush()?;
    ctx.clear();

    let t = QTeam::team();
    let first = Query::select_from(&t)
        .r#where(t.name.eq("teamA"))
        .fetch_single(&mut ctx)?;
    let second = Query::select_from(&t)
        .r#where(t.id.eq(first.id().unwrap_or_default()))
        .fetch_single(&mut ctx)?;
    assert!(Rc::ptr_eq(&first, &second));
    assert!(ctx.contains(&*first));
});

#[test]
fn sequence_continues_from_stored_rows() -> quarry::Result<()> {
    let mut ctx = setup_context();
    sample::seed(&mut ctx)?;
    ctx.flush()?;

    let mut next = PersistenceContext::new(ctx.into_engine());
    let team = next.persist(Team::new("teamC"))?;
    assert_eq!(team.id(), Some(3));
    let member = next.persist(Member::new("member5", 50).with_team(&team))?;
    assert_eq!(member.id(), Some(5));
    assert_eq!(next.flush()?, 2);
    Ok(())
}

context_test!(native_query_sees_staged_writes, |ctx, _| {
    let m = QMember::member();
    let statement = Query::select(m.username.clone())
        .from(&m)
        .r#where(m.age.ge(30))
        .order_by(m.age.asc())
        .build()?;
    let (sql, params) = statement.to_sql().build();

    let rows = ctx.native_query(&sql, &params)?;
    assert_eq!(
        rows,
        vec![vec![Value::from("member3")], vec![Value::from("member4")]]
    );
});
