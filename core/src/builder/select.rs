use core::marker::PhantomData;
use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashSet;
use paste::paste;

use super::{Expressions, OrderSpecifiers, Predicates, Statement};
use crate::entity::{AssociationPath, Entity, EntitySource, TableInfo};
use crate::error::{QueryError, Result};
use crate::executor::Executor;
use crate::expr::{Expr, IntoExpr, Node, OrderSpecifier};
use crate::join::{JoinClause, JoinType};
use crate::projection::{Projection, SelectItem};

//------------------------------------------------------------------------------
// Type State Markers
//------------------------------------------------------------------------------

/// Marker for the initial state of SelectBuilder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectInitial;

/// Marker for the state after FROM clause
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectFromSet;

//------------------------------------------------------------------------------
// SelectBuilder Definition
//------------------------------------------------------------------------------

/// The root entity of a statement.
#[derive(Debug, Clone)]
pub struct FromClause {
    pub alias: CompactString,
    pub table: &'static TableInfo,
}

/// Builds a SELECT statement.
///
/// Misuse that can only be detected mid-chain (`.on()` or `.fetch_join()`
/// without a join) is remembered and reported by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SelectBuilder<P, State> {
    projection: P,
    items: Vec<SelectItem>,
    from: Option<FromClause>,
    joins: Vec<JoinClause>,
    predicates: Vec<Arc<Node>>,
    group_by: Vec<Arc<Node>>,
    having: Vec<Arc<Node>>,
    order_by: Vec<OrderSpecifier>,
    limit: Option<u64>,
    offset: Option<u64>,
    invalid: Option<String>,
    state: PhantomData<State>,
}

impl<P: Projection> SelectBuilder<P, SelectInitial> {
    pub(crate) fn new(projection: P) -> Self {
        let items = projection.select_items();
        Self {
            projection,
            items,
            from: None,
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            invalid: None,
            state: PhantomData,
        }
    }

    /// Specifies the entity to select FROM and transitions state
    #[inline]
    pub fn from<Q: EntitySource>(self, source: &Q) -> SelectBuilder<P, SelectFromSet> {
        let path = source.entity_path();
        SelectBuilder {
            projection: self.projection,
            items: self.items,
            from: Some(FromClause {
                alias: path.alias().clone(),
                table: path.table(),
            }),
            joins: self.joins,
            predicates: self.predicates,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            invalid: self.invalid,
            state: PhantomData,
        }
    }
}

macro_rules! join_impl {
    () => {
        join_impl!(inner);
        join_impl!(left);
    };
    ($type:ident) => {
        paste! {
            /// JOIN following `path` to the entity at `target`
            pub fn [<$type _join>]<S, T, Q>(self, path: &AssociationPath<S, T>, target: &Q) -> Self
            where
                S: Entity,
                T: Entity,
                Q: EntitySource<Entity = T>,
            {
                self.push_join(JoinClause::new(
                    JoinType::[<$type:camel>],
                    path,
                    target.entity_path().alias().clone(),
                ))
            }
        }
    };
}

//------------------------------------------------------------------------------
// Post-FROM State Implementation
//------------------------------------------------------------------------------

impl<P: Projection> SelectBuilder<P, SelectFromSet> {
    /// Adds an INNER JOIN; same as [`inner_join`](Self::inner_join).
    #[inline]
    pub fn join<S, T, Q>(self, path: &AssociationPath<S, T>, target: &Q) -> Self
    where
        S: Entity,
        T: Entity,
        Q: EntitySource<Entity = T>,
    {
        self.inner_join(path, target)
    }

    join_impl!();

    fn push_join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Restricts the most recent join with an extra ON condition.
    ///
    /// For an inner join this matches the same rows as an equivalent `where`;
    /// for a left join it only nulls out the right side of rows that fail.
    pub fn on(mut self, predicate: impl IntoExpr<bool>) -> Self {
        let predicate = predicate.into_expr();
        let error = match self.joins.last_mut() {
            None => Some("on() requires a preceding join".to_owned()),
            Some(join) if join.fetch => Some(format!(
                "fetch join on {}.{} cannot carry an ON condition",
                join.owner, join.association
            )),
            Some(join) => {
                join.on = Some(match join.on.take() {
                    Some(existing) => Expr::<bool>::from_arc(existing).and(predicate).into_node(),
                    None => predicate.into_node(),
                });
                None
            }
        };
        match error {
            Some(message) => self.invalidate(message),
            None => self,
        }
    }

    /// Marks the most recent join for eager materialization of its target.
    pub fn fetch_join(mut self) -> Self {
        let error = match self.joins.last_mut() {
            None => Some("fetch_join() requires a preceding join".to_owned()),
            Some(join) if join.on.is_some() => Some(format!(
                "fetch join on {}.{} cannot carry an ON condition",
                join.owner, join.association
            )),
            Some(join) => {
                join.fetch = true;
                None
            }
        };
        match error {
            Some(message) => self.invalidate(message),
            None => self,
        }
    }

    /// Adds predicates to the WHERE clause; all of them must hold.
    #[inline]
    pub fn r#where(mut self, predicates: impl Predicates) -> Self {
        self.predicates.extend(predicates.into_predicates());
        self
    }

    /// Adds a GROUP BY clause to the query
    #[inline]
    pub fn group_by(mut self, expressions: impl Expressions) -> Self {
        self.group_by.extend(expressions.into_nodes());
        self
    }

    /// Adds predicates over groups; all of them must hold.
    #[inline]
    pub fn having(mut self, predicates: impl Predicates) -> Self {
        self.having.extend(predicates.into_predicates());
        self
    }

    /// Sorts the query results
    #[inline]
    pub fn order_by(mut self, specifiers: impl OrderSpecifiers) -> Self {
        self.order_by.extend(specifiers.into_specifiers());
        self
    }

    /// Limits the number of rows returned
    #[inline]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset for the query results
    #[inline]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn invalidate(mut self, message: impl Into<String>) -> Self {
        self.invalid.get_or_insert_with(|| message.into());
        self
    }

    /// Validates the builder and produces an executable statement.
    pub fn build(self) -> Result<Statement<P>> {
        if let Some(message) = self.invalid {
            return Err(QueryError::InvalidStatement(message));
        }
        let from = self
            .from
            .ok_or_else(|| QueryError::InvalidStatement("statement has no FROM entity".into()))?;
        if self.items.is_empty() {
            return Err(QueryError::InvalidStatement("select list is empty".into()));
        }

        let aliases = check_joins(&from, &self.items, &self.joins)?;
        for alias in self.items.iter().filter_map(SelectItem::entity_alias) {
            check_alias(&aliases, alias)?;
        }
        let nodes = self
            .items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr(node) => Some(node),
                SelectItem::Entity { .. } => None,
            })
            .chain(&self.predicates)
            .chain(&self.group_by)
            .chain(&self.having)
            .chain(self.order_by.iter().map(|spec| &spec.node));
        for node in nodes {
            check_columns(&aliases, node)?;
        }
        drop(aliases);

        Ok(Statement::new(
            self.projection,
            self.items.into(),
            from,
            self.joins,
            self.predicates,
            self.group_by,
            self.having,
            self.order_by,
            self.limit,
            self.offset,
        ))
    }

    /// Builds and runs the statement, returning every row.
    pub fn fetch<X: Executor + ?Sized>(self, executor: &mut X) -> Result<Vec<P::Output>> {
        executor.fetch(self.build()?)
    }

    /// Builds and runs the statement, expecting at most one row.
    pub fn fetch_one<X: Executor + ?Sized>(self, executor: &mut X) -> Result<Option<P::Output>> {
        executor.fetch_one(self.build()?)
    }

    /// Builds and runs the statement with `LIMIT 1`.
    pub fn fetch_first<X: Executor + ?Sized>(
        self,
        executor: &mut X,
    ) -> Result<Option<P::Output>> {
        executor.fetch_first(self.build()?)
    }

    /// Builds and runs the statement, expecting exactly one row.
    pub fn fetch_single<X: Executor + ?Sized>(self, executor: &mut X) -> Result<P::Output> {
        executor.fetch_single(self.build()?)
    }
}

/// Walks the joins in order and returns every alias they declare.
///
/// An ON predicate may only refer to aliases declared up to its own join.
fn check_joins<'a>(
    from: &'a FromClause,
    items: &'a [SelectItem],
    joins: &'a [JoinClause],
) -> Result<Vec<&'a CompactString>> {
    let mut aliases: Vec<&CompactString> = vec![&from.alias];
    let mut fetched: HashSet<(&str, &str)> = HashSet::new();
    let mut fetch_owners: Vec<&CompactString> =
        items.iter().filter_map(SelectItem::entity_alias).collect();

    for join in joins {
        if !aliases.contains(&&join.owner) {
            return Err(QueryError::InvalidStatement(format!(
                "join on {}.{} starts from alias {:?}, which is not joined yet",
                join.owner, join.association, join.owner
            )));
        }
        if aliases.contains(&&join.alias) {
            return Err(QueryError::InvalidStatement(format!(
                "alias {:?} is used twice",
                join.alias
            )));
        }
        aliases.push(&join.alias);

        if let Some(on) = &join.on {
            check_columns(&aliases, on)?;
        }

        if join.fetch {
            if !fetch_owners.contains(&&join.owner) {
                return Err(QueryError::InvalidStatement(format!(
                    "fetch join on {}.{} requires {:?} to be selected as an entity",
                    join.owner, join.association, join.owner
                )));
            }
            if !fetched.insert(join.path()) {
                return Err(QueryError::InvalidStatement(format!(
                    "association {}.{} is fetch-joined twice",
                    join.owner, join.association
                )));
            }
            fetch_owners.push(&join.alias);
        }
    }
    Ok(aliases)
}

fn check_columns(aliases: &[&CompactString], node: &Node) -> Result<()> {
    let mut unknown = None;
    node.visit_columns(&mut |qualifier, _| {
        if unknown.is_none() && !aliases.contains(&qualifier) {
            unknown = Some(qualifier.clone());
        }
    });
    match unknown {
        Some(alias) => check_alias(aliases, &alias),
        None => Ok(()),
    }
}

fn check_alias(aliases: &[&CompactString], alias: &CompactString) -> Result<()> {
    if aliases.contains(&alias) {
        Ok(())
    } else {
        Err(QueryError::InvalidStatement(format!(
            "alias {alias:?} is not part of the statement"
        )))
    }
}
