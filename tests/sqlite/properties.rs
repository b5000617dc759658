use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{TestContext, setup_context, usernames};
use quarry::prelude::*;
use quarry::sample::{self, Member, QMember};

/// Seeds the sample data plus `rows` members with random ages and teams.
/// Returns every persisted `(username, age)`.
fn seed_random(ctx: &mut TestContext, rows: usize, rng_seed: u64) -> Vec<(String, i64)> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let data = sample::seed(ctx).unwrap();
    let teams = [Some(&data.team_a), Some(&data.team_b), None];

    let mut members: Vec<(String, i64)> = data
        .members
        .iter()
        .map(|member| (member.username().to_owned(), member.age()))
        .collect();

    for i in 0..rows {
        let username = format!("random{i:03}");
        let age = rng.random_range(0..60);
        let mut member = Member::new(username.clone(), age);
        if let Some(team) = teams[rng.random_range(0..teams.len())] {
            member = member.with_team(team);
        }
        ctx.persist(member).unwrap();
        members.push((username, age));
    }
    members
}

#[test]
fn predicate_list_matches_conjunction() {
    let mut ctx = setup_context();
    let members = seed_random(&mut ctx, 40, 7);
    let mut rng = StdRng::seed_from_u64(11);
    let m = QMember::member();

    for _ in 0..20 {
        let low: i64 = rng.random_range(0..50);
        let high: i64 = rng.random_range(low..70);

        let listed = Query::select_from(&m)
            .r#where((m.age.gt(low), m.age.lt(high)))
            .order_by(m.id.asc())
            .fetch(&mut ctx)
            .unwrap();
        let chained = Query::select_from(&m)
            .r#where(m.age.gt(low).and(m.age.lt(high)))
            .order_by(m.id.asc())
            .fetch(&mut ctx)
            .unwrap();

        let expected: Vec<String> = members
            .iter()
            .filter(|(_, age)| *age > low && *age < high)
            .map(|(name, _)| name.clone())
            .collect();
        assert_eq!(usernames(&listed), usernames(&chained), "{low}..{high}");
        assert_eq!(usernames(&listed), expected, "{low}..{high}");
    }
}

#[test]
fn group_count_equals_distinct_values() {
    let mut ctx = setup_context();
    let members = seed_random(&mut ctx, 50, 42);
    let mut rng = StdRng::seed_from_u64(3);
    let m = QMember::member();

    for _ in 0..10 {
        let floor: i64 = rng.random_range(0..45);
        let groups = Query::select((m.age.clone(), m.count()))
            .from(&m)
            .r#where(m.age.ge(floor))
            .group_by(&m.age)
            .fetch(&mut ctx)
            .unwrap();

        let distinct: BTreeSet<i64> = members
            .iter()
            .map(|(_, age)| *age)
            .filter(|age| *age >= floor)
            .collect();
        assert_eq!(groups.len(), distinct.len(), "ages >= {floor}");

        let total: i64 = groups
            .iter()
            .map(|row| row.get(&m.count()).unwrap().unwrap_or_default())
            .sum();
        let matched = members.iter().filter(|(_, age)| *age >= floor).count();
        assert_eq!(total, matched as i64);
    }
}
