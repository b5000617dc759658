use std::rc::Rc;

use crate::common::usernames;
use crate::{context_test, flush_and_clear};
use quarry::prelude::*;
use quarry::sample::{Member, QMember, QTeam};

context_test!(without_fetch_join_team_is_unresolved, |ctx, _| {
    flush_and_clear!(ctx);

    let m = QMember::member();
    let member1 = Query::select_from(&m)
        .r#where(m.username.eq("member1"))
        .fetch_single(&mut ctx)?;

    assert!(!ctx.is_loaded(&*member1, &m.team));
    assert_eq!(ctx.residency(&*member1, &m.team), Residency::Unresolved);
    assert!(!quarry::is_loaded(&*member1, &m.team));
    assert!(member1.team().get().is_none());
    assert!(member1.team().id().is_some());
});

context_test!(explicit_load_resolves_team, |ctx, _| {
    flush_and_clear!(ctx);

    let m = QMember::member();
    let member1 = Query::select_from(&m)
        .r#where(m.username.eq("member1"))
        .fetch_single(&mut ctx)?;
    assert!(!ctx.is_loaded(&*member1, &m.team));

    let team = ctx.load(member1.team())?.expect("member1 has a team");
    assert_eq!(team.name(), "teamA");
    assert!(ctx.is_loaded(&*member1, &m.team));

    let again = ctx.load(member1.team())?.expect("still resolved");
    assert!(Rc::ptr_eq(&team, &again));
});

context_test!(fetch_join_resolves_team, |ctx, _| {
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let member1 = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .r#where(m.username.eq("member1"))
        .fetch_single(&mut ctx)?;

    let statements = ctx.engine().statements();
    assert!(ctx.is_loaded(&*member1, &m.team));
    let team = member1.team().get().expect("fetch join attached the team");
    assert_eq!(team.name(), "teamA");
    assert_eq!(ctx.engine().statements(), statements);
});

context_test!(fetch_join_shares_team_instances, |ctx, _| {
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let members = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    assert_eq!(members.len(), 4);
    assert!(members.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
    let teams: Vec<_> = members
        .iter()
        .filter_map(|member| member.team().get().cloned())
        .collect();
    assert!(Rc::ptr_eq(&teams[0], &teams[1]));
    assert!(Rc::ptr_eq(&teams[2], &teams[3]));
    assert!(!Rc::ptr_eq(&teams[1], &teams[2]));
    assert_eq!(ctx.resident_count(), 6);
});

context_test!(left_fetch_join_without_team, |ctx, _| {
    ctx.persist(Member::new("loner", 50))?;
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let members = Query::select_from(&m)
        .left_join(&m.team, &t)
        .fetch_join()
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    assert_eq!(members.len(), 5);
    assert_eq!(members[0].username(), "loner");
    assert!(members[0].team().is_empty());
    assert!(members.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
});

context_test!(resident_team_resolves_without_fetch_join, |ctx, _| {
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let teams = Query::select_from(&t).fetch(&mut ctx)?;
    assert_eq!(teams.len(), 2);

    let members = Query::select_from(&m).fetch(&mut ctx)?;
    assert!(members.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
});

context_test!(managed_members_are_resolved_before_clear, |ctx, data| {
    let m = QMember::member();
    let members = Query::select_from(&m).fetch(&mut ctx)?;
    assert!(Rc::ptr_eq(&members[0], &data.members[0]));
    assert!(members.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
});

context_test!(fetch_join_resolves_already_resident_owner, |ctx, _| {
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let plain = Query::select_from(&m)
        .r#where(m.username.eq("member3"))
        .fetch_single(&mut ctx)?;
    assert!(!ctx.is_loaded(&*plain, &m.team));

    let fetched = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .r#where(m.username.eq("member3"))
        .fetch_single(&mut ctx)?;
    assert!(Rc::ptr_eq(&plain, &fetched));
    assert!(ctx.is_loaded(&*plain, &m.team));
    assert_eq!(plain.team().get().map(|team| team.name()), Some("teamB"));
});

context_test!(fetch_join_with_tuple_projection, |ctx, _| {
    flush_and_clear!(ctx);

    let (m, t) = (QMember::member(), QTeam::team());
    let rows = Query::select((&m, m.age.clone()))
        .from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .r#where(t.name.eq("teamB"))
        .order_by(m.age.asc())
        .fetch(&mut ctx)?;

    assert_eq!(rows.len(), 2);
    let member3 = rows[0].get(&m)?.expect("member selected");
    assert_eq!(rows[0].get(&m.age)?, Some(30));
    assert!(ctx.is_loaded(&*member3, &m.team));
});

context_test!(clear_resets_residency_for_new_references, |ctx, _| {
    let (m, t) = (QMember::member(), QTeam::team());
    let fetched = Query::select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .fetch(&mut ctx)?;
    assert!(fetched.iter().all(|member| ctx.is_loaded(&**member, &m.team)));

    ctx.clear();
    let reloaded = Query::select_from(&m).fetch(&mut ctx)?;
    assert_eq!(usernames(&reloaded).len(), 4);
    assert!(reloaded.iter().all(|member| !ctx.is_loaded(&**member, &m.team)));
    assert!(fetched.iter().all(|member| ctx.is_loaded(&**member, &m.team)));
});
