//! Join clauses over associations, with optional ON-filters and fetch joins.
//!
//! A join always follows a many-to-one [`AssociationPath`]; its key condition
//! (`owner.fk = target.id`) is derived from the path. A trailing `.on()`
//! predicate is ANDed into the ON clause, which for a left join restricts the
//! right side before joining instead of filtering rows afterwards.

use core::any::Any;
use core::fmt;
use std::rc::Rc;
use std::sync::Arc;

use compact_str::CompactString;

use crate::entity::{AssociationPath, Entity, TableInfo};
use crate::error::{QueryError, Result};
use crate::expr::{CompareOp, Expr, Node, Predicate};
use crate::row::{RowReader, read_entity};
use crate::sql::{SQL, SQLChunk, ToSQL, Token};

// =============================================================================
// Join Type Enum
// =============================================================================

/// The type of JOIN operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
}

impl ToSQL for JoinType {
    fn to_sql(&self) -> SQL {
        match self {
            JoinType::Inner => SQL::from_iter([Token::INNER, Token::JOIN]),
            JoinType::Left => SQL::from_iter([Token::LEFT, Token::JOIN]),
        }
    }
}

// =============================================================================
// Fetch binding
// =============================================================================

/// Type-erased glue between a fetch join and the association it fills.
pub trait FetchBinding: fmt::Debug + Send + Sync {
    fn target_table(&self) -> &'static TableInfo;

    /// Reads the joined target out of the row.
    fn read_target(&self, row: &mut RowReader<'_>) -> Result<Option<Rc<dyn Any>>>;

    /// Resolves the owner's association to the fetched target.
    fn attach(&self, owner: &Rc<dyn Any>, target: &Rc<dyn Any>) -> Result<()>;
}

impl<S: Entity, T: Entity> FetchBinding for AssociationPath<S, T> {
    fn target_table(&self) -> &'static TableInfo {
        T::table()
    }

    fn read_target(&self, row: &mut RowReader<'_>) -> Result<Option<Rc<dyn Any>>> {
        read_entity::<T>(row)
    }

    fn attach(&self, owner: &Rc<dyn Any>, target: &Rc<dyn Any>) -> Result<()> {
        let owner = owner.downcast_ref::<S>().ok_or_else(|| {
            QueryError::Mapping(format!("fetch join owner is not a {}", S::table().name))
        })?;
        let target = Rc::clone(target).downcast::<T>().map_err(|_| {
            QueryError::Mapping(format!("fetch join target is not a {}", T::table().name))
        })?;
        self.get(owner).resolve(target)
    }
}

// =============================================================================
// Join clause
// =============================================================================

/// One join of a statement.
#[derive(Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    /// Alias the association is followed from.
    pub owner: CompactString,
    pub association: &'static str,
    pub fk_column: &'static str,
    /// Alias of the joined target.
    pub alias: CompactString,
    pub target: &'static TableInfo,
    pub on: Option<Arc<Node>>,
    pub fetch: bool,
    pub binding: Arc<dyn FetchBinding>,
}

impl JoinClause {
    pub fn new<S: Entity, T: Entity>(
        join_type: JoinType,
        path: &AssociationPath<S, T>,
        alias: impl Into<CompactString>,
    ) -> Self {
        Self {
            join_type,
            owner: path.owner().clone(),
            association: path.name(),
            fk_column: path.fk_column(),
            alias: alias.into(),
            target: T::table(),
            on: None,
            fetch: false,
            binding: Arc::new(path.clone()),
        }
    }

    /// `owner.association`, the path a fetch join is keyed by.
    pub fn path(&self) -> (&str, &'static str) {
        (self.owner.as_str(), self.association)
    }

    /// `owner.fk = alias.id`, plus the ON-filter if any.
    pub fn condition(&self) -> Predicate {
        let key = Expr::<bool>::from_node(Node::Compare {
            op: CompareOp::Eq,
            lhs: Arc::new(Node::Column {
                qualifier: self.owner.clone(),
                name: self.fk_column,
            }),
            rhs: Arc::new(Node::Column {
                qualifier: self.alias.clone(),
                name: self.target.id_column,
            }),
        });
        match &self.on {
            Some(on) => key.and(Expr::<bool>::from_arc(Arc::clone(on))),
            None => key,
        }
    }
}

impl ToSQL for JoinClause {
    fn to_sql(&self) -> SQL {
        self.join_type
            .to_sql()
            .push(SQLChunk::ident(self.target.name))
            .push(Token::AS)
            .push(SQLChunk::ident(self.alias.to_string()))
            .push(Token::ON)
            .append(self.condition().to_sql())
    }
}

impl fmt::Debug for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinClause")
            .field("join_type", &self.join_type)
            .field("path", &format_args!("{}.{}", self.owner, self.association))
            .field("alias", &self.alias)
            .field("on", &self.on)
            .field("fetch", &self.fetch)
            .finish()
    }
}
