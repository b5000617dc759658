use quarry::core::builder::{SelectBuilder, SelectFromSet};
use quarry::core::projection::Projection;
use quarry::core::{SelectList, ToSQL};
use quarry::prelude::*;
use quarry::sample::{QMember, QTeam};

fn sql_of<P: Projection>(builder: SelectBuilder<P, SelectFromSet>) -> (String, Vec<Value>) {
    builder.build().unwrap().to_sql().build()
}

#[test]
fn select_entity_with_predicates() {
    let m = QMember::member();
    let (sql, params) = sql_of(
        Query::select_from(&m).r#where((m.username.eq("member1"), m.age.eq(10))),
    );
    assert_eq!(
        sql,
        r#"SELECT "member"."member_id", "member"."username", "member"."age", "member"."team_id" FROM "member" AS "member" WHERE "member"."username" = ? AND "member"."age" = ?"#
    );
    assert_eq!(params, vec![Value::from("member1"), Value::Integer(10)]);
}

#[test]
fn chained_and_renders_parenthesized() {
    let m = QMember::member();
    let (sql, _) = sql_of(
        Query::select_from(&m).r#where(m.username.eq("member1").and(m.age.between(10, 30))),
    );
    assert!(
        sql.ends_with(
            r#"WHERE ("member"."username" = ? AND "member"."age" BETWEEN ? AND ?)"#
        ),
        "{sql}"
    );
}

#[test]
fn aggregates_render_as_functions() {
    let m = QMember::member();
    let (sql, params) = sql_of(
        Query::select((m.count(), m.age.sum(), m.age.avg(), m.age.max(), m.age.min())).from(&m),
    );
    assert_eq!(
        sql,
        r#"SELECT COUNT("member"."member_id"), SUM("member"."age"), AVG("member"."age"), MAX("member"."age"), MIN("member"."age") FROM "member" AS "member""#
    );
    assert!(params.is_empty());
}

#[test]
fn group_by_joined_team() {
    let (m, t) = (QMember::member(), QTeam::team());
    let (sql, _) = sql_of(
        Query::select((t.name.clone(), m.age.avg()))
            .from(&m)
            .join(&m.team, &t)
            .group_by(&t.name),
    );
    assert_eq!(
        sql,
        r#"SELECT "team"."name", AVG("member"."age") FROM "member" AS "member" INNER JOIN "team" AS "team" ON "member"."team_id" = "team"."team_id" GROUP BY "team"."name""#
    );
}

#[test]
fn left_join_on_filter_stays_in_join() {
    let (m, t) = (QMember::member(), QTeam::team());
    let (sql, params) = sql_of(
        Query::select((&m, &t))
            .from(&m)
            .left_join(&m.team, &t)
            .on(t.name.eq("teamA")),
    );
    assert_eq!(
        sql,
        r#"SELECT "member"."member_id", "member"."username", "member"."age", "member"."team_id", "team"."team_id", "team"."name" FROM "member" AS "member" LEFT JOIN "team" AS "team" ON ("member"."team_id" = "team"."team_id" AND "team"."name" = ?)"#
    );
    assert_eq!(params, vec![Value::from("teamA")]);
}

#[test]
fn fetch_join_appends_target_columns() {
    let (m, t) = (QMember::member(), QTeam::team());
    let (sql, _) = sql_of(
        Query::select_from(&m)
            .join(&m.team, &t)
            .fetch_join()
            .r#where(m.username.eq("member1")),
    );
    assert_eq!(
        sql,
        r#"SELECT "member"."member_id", "member"."username", "member"."age", "member"."team_id", "team"."team_id", "team"."name" FROM "member" AS "member" INNER JOIN "team" AS "team" ON "member"."team_id" = "team"."team_id" WHERE "member"."username" = ?"#
    );
}

#[test]
fn order_and_paging() {
    let m = QMember::member();
    let (sql, params) = sql_of(
        Query::select_from(&m)
            .order_by((m.age.desc(), m.username.asc()))
            .offset(1)
            .limit(2),
    );
    assert!(
        sql.ends_with(r#"ORDER BY "member"."age" DESC, "member"."username" ASC LIMIT ? OFFSET ?"#),
        "{sql}"
    );
    assert_eq!(params, vec![Value::Integer(2), Value::Integer(1)]);
}

#[test]
fn offset_without_limit_is_unbounded() {
    let m = QMember::member();
    let (sql, params) = sql_of(Query::select_from(&m).offset(3));
    assert!(sql.ends_with("LIMIT ? OFFSET ?"), "{sql}");
    assert_eq!(params, vec![Value::Integer(-1), Value::Integer(3)]);
}

#[test]
fn runtime_select_list() {
    let m = QMember::member();
    let list = SelectList::new().push(&m.username).push(m.age.max());
    let (sql, _) = sql_of(Query::select(list).from(&m).group_by(&m.username));
    assert_eq!(
        sql,
        r#"SELECT "member"."username", MAX("member"."age") FROM "member" AS "member" GROUP BY "member"."username""#
    );
}

#[test]
fn statement_display_matches_sql() {
    let m = QMember::member();
    let statement = Query::select(m.username.clone())
        .from(&m)
        .r#where(m.age.in_list([10, 20]))
        .build()
        .unwrap();
    let sql = statement.to_sql().sql();
    assert!(statement.to_string().contains(&sql));
    assert!(sql.contains(r#""member"."age" IN (?, ?)"#), "{sql}");
}
