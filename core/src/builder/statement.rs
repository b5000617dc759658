use core::fmt;
use std::sync::Arc;

use super::FromClause;
use crate::expr::{Node, OrderSpecifier};
use crate::join::JoinClause;
use crate::projection::SelectItem;
use crate::sql::{SQL, SQLChunk, ToSQL, Token};

/// A validated SELECT statement, consumed once by an executor.
///
/// Fetch-joined targets are selected after the projection's own items, in
/// join order.
pub struct Statement<P> {
    projection: P,
    items: Arc<[SelectItem]>,
    from: FromClause,
    joins: Vec<JoinClause>,
    predicates: Vec<Arc<Node>>,
    group_by: Vec<Arc<Node>>,
    having: Vec<Arc<Node>>,
    order_by: Vec<OrderSpecifier>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<P> Statement<P> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        projection: P,
        items: Arc<[SelectItem]>,
        from: FromClause,
        joins: Vec<JoinClause>,
        predicates: Vec<Arc<Node>>,
        group_by: Vec<Arc<Node>>,
        having: Vec<Arc<Node>>,
        order_by: Vec<OrderSpecifier>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Self {
        Self {
            projection,
            items,
            from,
            joins,
            predicates,
            group_by,
            having,
            order_by,
            limit,
            offset,
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// The projection's select items, excluding fetch-join columns.
    pub fn items(&self) -> &Arc<[SelectItem]> {
        &self.items
    }

    pub fn from(&self) -> &FromClause {
        &self.from
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn fetch_joins(&self) -> impl Iterator<Item = &JoinClause> {
        self.joins.iter().filter(|join| join.fetch)
    }

    pub fn predicates(&self) -> &[Arc<Node>] {
        &self.predicates
    }

    pub fn group_by(&self) -> &[Arc<Node>] {
        &self.group_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Caps the row count at `limit`, keeping a smaller existing limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(self.limit.map_or(limit, |current| current.min(limit)));
        self
    }
}

impl<P> ToSQL for Statement<P> {
    fn to_sql(&self) -> SQL {
        let columns = self
            .items
            .iter()
            .map(ToSQL::to_sql)
            .chain(self.fetch_joins().map(|join| join.target.select_columns(&join.alias)));

        let mut sql = SQL::token(Token::SELECT)
            .append(SQL::join(columns, Token::COMMA))
            .push(Token::FROM)
            .push(SQLChunk::ident(self.from.table.name))
            .push(Token::AS)
            .push(SQLChunk::ident(self.from.alias.to_string()));

        for join in &self.joins {
            sql.append_mut(join.to_sql());
        }
        if !self.predicates.is_empty() {
            sql.push_mut(Token::WHERE);
            sql.append_mut(SQL::join(self.predicates.iter().map(|p| p.to_sql()), Token::AND));
        }
        if !self.group_by.is_empty() {
            sql.push_mut(Token::GROUP);
            sql.push_mut(Token::BY);
            sql.append_mut(SQL::join(self.group_by.iter().map(|g| g.to_sql()), Token::COMMA));
        }
        if !self.having.is_empty() {
            sql.push_mut(Token::HAVING);
            sql.append_mut(SQL::join(self.having.iter().map(|h| h.to_sql()), Token::AND));
        }
        if !self.order_by.is_empty() {
            sql.push_mut(Token::ORDER);
            sql.push_mut(Token::BY);
            sql.append_mut(SQL::join(&self.order_by, Token::COMMA));
        }
        match (self.limit, self.offset) {
            (None, None) => {}
            (limit, offset) => {
                // SQLite needs a LIMIT before OFFSET; -1 means unbounded
                let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
                sql.push_mut(Token::LIMIT);
                sql.push_mut(SQLChunk::Param(limit.into()));
                if let Some(offset) = offset {
                    sql.push_mut(Token::OFFSET);
                    sql.push_mut(SQLChunk::Param(
                        i64::try_from(offset).unwrap_or(i64::MAX).into(),
                    ));
                }
            }
        }
        sql
    }
}

impl<P> fmt::Debug for Statement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.to_sql().sql())
            .field("joins", &self.joins)
            .finish()
    }
}

impl<P> fmt::Display for Statement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_sql(), f)
    }
}
