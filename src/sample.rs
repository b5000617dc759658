//! Member/Team sample model.
//!
//! `Member` has a many-to-one `team` association. Equality on both entities
//! compares identity only.

use std::fmt;
use std::rc::Rc;

use quarry_core::{
    Association, AssociationPath, ColumnInfo, Entity, EntityPath, Expr, Identity, Result,
    RowReader, SqlType, TableInfo, Value, impl_query_type,
};

use crate::context::PersistenceContext;
use crate::engine::StorageEngine;

static TEAM: TableInfo = TableInfo {
    name: "team",
    id_column: "team_id",
    columns: &[ColumnInfo::new("name", SqlType::Text)],
};

static MEMBER: TableInfo = TableInfo {
    name: "member",
    id_column: "member_id",
    columns: &[
        ColumnInfo::new("username", SqlType::Text),
        ColumnInfo::new("age", SqlType::Integer),
        ColumnInfo::new("team_id", SqlType::Integer)
            .nullable()
            .references("team", "team_id"),
    ],
};

/// Tables of the sample model, referenced tables first.
pub fn tables() -> [&'static TableInfo; 2] {
    [&TEAM, &MEMBER]
}

#[derive(Debug)]
pub struct Team {
    id: Identity,
    name: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identity::new(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id.get()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({:?}, {})", self.id.get(), self.name)
    }
}

impl Entity for Team {
    fn table() -> &'static TableInfo {
        &TEAM
    }

    fn identity(&self) -> &Identity {
        &self.id
    }

    fn column_values(&self) -> Result<Vec<Value>> {
        Ok(vec![Value::from(self.name.as_str())])
    }

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: Identity::new(),
            name: row.get()?,
        })
    }
}

#[derive(Debug)]
pub struct Member {
    id: Identity,
    username: String,
    age: i64,
    team: Association<Team>,
}

impl Member {
    pub fn new(username: impl Into<String>, age: i64) -> Self {
        Self {
            id: Identity::new(),
            username: username.into(),
            age,
            team: Association::empty(),
        }
    }

    pub fn with_team(mut self, team: &Rc<Team>) -> Self {
        self.team = Association::resolved(Rc::clone(team));
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id.get()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    /// The team association. Reading it never loads anything; see
    /// [`PersistenceContext::load`].
    pub fn team(&self) -> &Association<Team> {
        &self.team
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({:?}, {}, {})", self.id.get(), self.username, self.age)
    }
}

impl Entity for Member {
    fn table() -> &'static TableInfo {
        &MEMBER
    }

    fn identity(&self) -> &Identity {
        &self.id
    }

    fn column_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            Value::from(self.username.as_str()),
            Value::from(self.age),
            Value::from(self.team.foreign_key()?),
        ])
    }

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: Identity::new(),
            username: row.get()?,
            age: row.get()?,
            team: row.association()?,
        })
    }
}

fn member_team(member: &Member) -> &Association<Team> {
    &member.team
}

/// Query type for [`Team`].
#[derive(Debug, Clone)]
pub struct QTeam {
    entity: EntityPath<Team>,
    pub id: Expr<i64>,
    pub name: Expr<String>,
}

impl QTeam {
    pub fn new(alias: &str) -> Self {
        let entity = EntityPath::new(alias);
        Self {
            id: entity.id(),
            name: entity.column("name"),
            entity,
        }
    }

    /// `QTeam` at the default alias `team`.
    pub fn team() -> Self {
        Self::new("team")
    }
}

impl_query_type!(QTeam => Team, entity);

/// Query type for [`Member`].
#[derive(Debug, Clone)]
pub struct QMember {
    entity: EntityPath<Member>,
    pub id: Expr<i64>,
    pub username: Expr<String>,
    pub age: Expr<i64>,
    pub team: AssociationPath<Member, Team>,
}

impl QMember {
    pub fn new(alias: &str) -> Self {
        let entity = EntityPath::new(alias);
        Self {
            id: entity.id(),
            username: entity.column("username"),
            age: entity.column("age"),
            team: AssociationPath::new(alias, "team", "team_id", member_team),
            entity,
        }
    }

    /// `QMember` at the default alias `member`.
    pub fn member() -> Self {
        Self::new("member")
    }
}

impl_query_type!(QMember => Member, entity);

/// Managed instances created by [`seed`].
#[derive(Debug)]
pub struct SampleData {
    pub team_a: Rc<Team>,
    pub team_b: Rc<Team>,
    pub members: [Rc<Member>; 4],
}

/// Persists teamA and teamB with member1..member4 aged 10, 20, 30 and 40.
///
/// member1 and member2 join teamA, member3 and member4 join teamB. Writes
/// stay staged until the next flush.
pub fn seed<S: StorageEngine>(ctx: &mut PersistenceContext<S>) -> Result<SampleData> {
    let team_a = ctx.persist(Team::new("teamA"))?;
    let team_b = ctx.persist(Team::new("teamB"))?;

    let members = [
        ctx.persist(Member::new("member1", 10).with_team(&team_a))?,
        ctx.persist(Member::new("member2", 20).with_team(&team_a))?,
        ctx.persist(Member::new("member3", 30).with_team(&team_b))?,
        ctx.persist(Member::new("member4", 40).with_team(&team_b))?,
    ];

    Ok(SampleData {
        team_a,
        team_b,
        members,
    })
}
