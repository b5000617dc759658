use std::rc::Rc;

use crate::common::usernames;
use crate::context_test;
use quarry::prelude::*;
use quarry::sample::{Member, QMember, QTeam, Team};

context_test!(inner_join_filters_by_team, |ctx, _| {
    let (m, t) = (QMember::member(), QTeam::team());
    let members = Query::select_from(&m)
        .join(&m.team, &t)
        .r#where(t.name.eq("teamA"))
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;
    assert_eq!(usernames(&members), vec!["member1", "member2"]);
});

context_test!(inner_join_drops_members_without_team, |ctx, _| {
    ctx.persist(Member::new("loner", 50))?;

    let (m, t) = (QMember::member(), QTeam::team());
    let joined = Query::select_from(&m)
        .inner_join(&m.team, &t)
        .fetch(&mut ctx)?;
    assert_eq!(joined.len(), 4);

    let all = Query::select_from(&m).left_join(&m.team, &t).fetch(&mut ctx)?;
    assert_eq!(all.len(), 5);
});

context_test!(left_join_on_keeps_every_member, |ctx, data| {
    let (m, t) = (QMember::member(), QTeam::team());
    let rows = Query::select((&m, &t))
        .from(&m)
        .left_join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    assert_eq!(rows.len(), 4);
    for (row, expected) in rows.iter().zip(&data.members) {
        let member = row.get(&m)?.expect("member side is never NULL");
        assert!(Rc::ptr_eq(&member, expected));
    }

    let teams = rows
        .iter()
        .map(|row| row.get(&t))
        .collect::<Result<Vec<Option<Rc<Team>>>>>()?;
    assert!(Rc::ptr_eq(teams[0].as_ref().unwrap(), &data.team_a));
    assert!(Rc::ptr_eq(teams[1].as_ref().unwrap(), &data.team_a));
    assert!(teams[2].is_none());
    assert!(teams[3].is_none());
});

context_test!(where_on_left_join_drops_failing_rows, |ctx, _| {
    let (m, t) = (QMember::member(), QTeam::team());
    let rows = Query::select((&m, &t))
        .from(&m)
        .left_join(&m.team, &t)
        .r#where(t.name.eq("teamA"))
        .fetch(&mut ctx)?;

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| matches!(row.get(&t), Ok(Some(_)))));
});

context_test!(inner_join_on_matches_where, |ctx, _| {
    let (m, t) = (QMember::member(), QTeam::team());

    let with_on = Query::select_from(&m)
        .join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;
    let with_where = Query::select_from(&m)
        .join(&m.team, &t)
        .r#where(t.name.eq("teamA"))
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    assert_eq!(usernames(&with_on), usernames(&with_where));
});

context_test!(multiple_on_conditions_are_conjoined, |ctx, _| {
    let (m, t) = (QMember::member(), QTeam::team());
    let rows = Query::select((m.username.clone(), t.name.clone()))
        .from(&m)
        .left_join(&m.team, &t)
        .on(t.name.eq("teamB"))
        .on(m.age.gt(30))
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    let teams = rows
        .iter()
        .map(|row| row.get(&t.name))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(teams, vec![None, None, None, Some("teamB".to_owned())]);
});

context_test!(join_with_aliases, |ctx, _| {
    let (m, t) = (QMember::new("m"), QTeam::new("t"));
    let names = Query::select(m.username.clone())
        .from(&m)
        .join(&m.team, &t)
        .r#where(t.name.eq("teamB"))
        .order_by(m.username.desc())
        .fetch(&mut ctx)?;
    assert_eq!(names, vec!["member4".to_owned(), "member3".to_owned()]);
});

context_test!(nullable_entity_projection_over_left_join, |ctx, data| {
    ctx.persist(Member::new("loner", 50))?;

    let (m, t) = (QMember::member(), QTeam::team());
    let teams: Vec<Option<Rc<Team>>> = Query::select(t.nullable())
        .from(&m)
        .left_join(&m.team, &t)
        .order_by(m.username.asc())
        .fetch(&mut ctx)?;

    assert_eq!(teams.len(), 5);
    assert!(teams[0].is_none());
    assert!(Rc::ptr_eq(teams[1].as_ref().unwrap(), &data.team_a));
    assert!(Rc::ptr_eq(teams[4].as_ref().unwrap(), &data.team_b));
});

context_test!(plain_entity_projection_rejects_unmatched_side, |ctx, _| {
    ctx.persist(Member::new("loner", 50))?;

    let (m, t) = (QMember::member(), QTeam::team());
    let result = Query::select(&t)
        .from(&m)
        .left_join(&m.team, &t)
        .r#where(m.username.eq("loner"))
        .fetch(&mut ctx);
    assert!(matches!(result, Err(QueryError::Mapping(_))));
});
