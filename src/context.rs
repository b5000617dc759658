//! The persistence context: identity map, staged writes and flush/clear.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use quarry_core::{
    Association, Entity, EntityPath, IdentityMap, Query, QueryError, RawRow, Result, SQL,
    TableInfo, Token, Value,
};
use quarry_core::{quarry_trace_context, quarry_trace_query, quarry_warn_context};

use crate::engine::StorageEngine;

/// When staged writes reach the storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Flush before every query.
    #[default]
    Auto,
    /// Only on an explicit [`PersistenceContext::flush`].
    Commit,
}

/// Runtime options for a [`PersistenceContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextConfig {
    pub flush_mode: FlushMode,
}

impl ContextConfig {
    pub const fn new() -> Self {
        Self {
            flush_mode: FlushMode::Auto,
        }
    }

    pub const fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }
}

/// A write waiting for the next flush.
trait StagedWrite {
    fn describe(&self) -> String;
    fn insert_sql(&self) -> Result<SQL>;
}

struct Staged<E>(Rc<E>);

impl<E: Entity> StagedWrite for Staged<E> {
    fn describe(&self) -> String {
        format!("{}#{}", E::table().name, self.0.id().unwrap_or_default())
    }

    fn insert_sql(&self) -> Result<SQL> {
        let id = self.0.id().ok_or_else(|| {
            QueryError::Persistence(format!("staged {} has no identity", E::table().name))
        })?;
        E::table().insert_sql(id, self.0.column_values()?)
    }
}

/// One unit of work over a [`StorageEngine`].
///
/// Managed entities are shared as `Rc<E>`; for any `(table, id)` the context
/// hands out a single instance until [`clear`](Self::clear) is called.
/// Queries run through the [`Executor`](quarry_core::Executor) implementation
/// on this type.
pub struct PersistenceContext<S> {
    pub(crate) engine: S,
    pub(crate) identity: IdentityMap,
    pending: VecDeque<Box<dyn StagedWrite>>,
    sequences: HashMap<&'static str, i64>,
    config: ContextConfig,
}

impl<S: StorageEngine> PersistenceContext<S> {
    pub fn new(engine: S) -> Self {
        Self::with_config(engine, ContextConfig::new())
    }

    pub fn with_config(engine: S, config: ContextConfig) -> Self {
        Self {
            engine,
            identity: IdentityMap::new(),
            pending: VecDeque::new(),
            sequences: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn engine(&self) -> &S {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut S {
        &mut self.engine
    }

    pub fn into_engine(self) -> S {
        self.engine
    }

    /// Makes `entity` managed: assigns its identity and stages its insert.
    ///
    /// Returns the managed instance. An entity that already carries an
    /// identity is rejected with [`QueryError::Persistence`].
    pub fn persist<E: Entity>(&mut self, entity: E) -> Result<Rc<E>> {
        if let Some(id) = entity.id() {
            return Err(QueryError::Persistence(format!(
                "{} already has identity {id}",
                E::table().name
            )));
        }

        let id = self.next_id(E::table())?;
        entity.identity().assign(id)?;
        let managed = self.identity.insert(Rc::new(entity))?;
        self.pending.push_back(Box::new(Staged(Rc::clone(&managed))));

        quarry_trace_context!("persist", table = E::table().name, id = id);
        Ok(managed)
    }

    /// Sends every staged write to the engine, oldest first.
    ///
    /// A failed write stays staged along with everything after it.
    pub fn flush(&mut self) -> Result<usize> {
        let mut written = 0;
        while let Some(write) = self.pending.front() {
            let (sql, params) = write.insert_sql()?.build();
            quarry_trace_query!(&sql, params.len());
            self.engine.execute(&sql, &params)?;
            quarry_trace_context!("flush_write", entity = write.describe());
            self.pending.pop_front();
            written += 1;
        }
        quarry_trace_context!("flush", written = written);
        Ok(written)
    }

    /// Evicts every managed entity and discards unflushed writes.
    ///
    /// Instances handed out earlier stay valid but are no longer managed.
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            quarry_warn_context!("clear", discarded = self.pending.len());
        }
        self.pending.clear();
        self.identity.clear();
        quarry_trace_context!("clear");
    }

    /// The entity with `id`, from the identity map or else from storage.
    pub fn find<E: Entity>(&mut self, id: i64) -> Result<Option<Rc<E>>> {
        if let Some(resident) = self.identity.get::<E>(id) {
            quarry_trace_context!("identity_hit", table = E::table().name, id = id);
            return Ok(Some(resident));
        }
        let path = EntityPath::<E>::new(E::table().name);
        Query::select_from(&path)
            .r#where(path.id().eq(id))
            .fetch_one(self)
    }

    /// Resolves `association`, loading its target if it is not resident.
    ///
    /// An empty association yields `None`. A foreign key with no matching
    /// row is a [`QueryError::Persistence`] error.
    pub fn load<T: Entity>(&mut self, association: &Association<T>) -> Result<Option<Rc<T>>> {
        if let Some(target) = association.get() {
            return Ok(Some(Rc::clone(target)));
        }
        let Some(id) = association.id() else {
            return Ok(None);
        };

        let target = self.find::<T>(id)?.ok_or_else(|| {
            QueryError::Persistence(format!("{} {id} does not exist", T::table().name))
        })?;
        association.resolve(Rc::clone(&target))?;
        quarry_trace_context!("load", table = T::table().name, id = id);
        Ok(Some(target))
    }

    /// Whether this exact instance is managed by the context.
    pub fn contains<E: Entity>(&self, entity: &E) -> bool {
        entity
            .id()
            .and_then(|id| self.identity.get::<E>(id))
            .is_some_and(|resident| std::ptr::eq(Rc::as_ptr(&resident), entity))
    }

    /// Number of entities in the identity map.
    pub fn resident_count(&self) -> usize {
        self.identity.len()
    }

    /// Number of staged writes not yet flushed.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Runs raw SQL, bypassing the statement builder and the identity map.
    pub fn native_query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>> {
        self.auto_flush()?;
        quarry_trace_query!(sql, params.len());
        self.engine.query(sql, params)
    }

    pub(crate) fn auto_flush(&mut self) -> Result<()> {
        if self.config.flush_mode == FlushMode::Auto && !self.pending.is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    fn next_id(&mut self, table: &'static TableInfo) -> Result<i64> {
        let current = match self.sequences.get(table.name) {
            Some(&current) => current,
            None => self.max_id(table)?,
        };
        let next = current + 1;
        self.sequences.insert(table.name, next);
        Ok(next)
    }

    fn max_id(&mut self, table: &'static TableInfo) -> Result<i64> {
        let (sql, params) = SQL::token(Token::SELECT)
            .append(SQL::func("MAX", SQL::ident(table.id_column)))
            .push(Token::FROM)
            .append(SQL::ident(table.name))
            .build();
        quarry_trace_query!(&sql, params.len());
        let rows = self.engine.query(&sql, &params)?;
        match rows.first().and_then(|row| row.first()) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Integer(max)) => Ok(*max),
            Some(other) => Err(QueryError::Mapping(format!(
                "MAX({}) returned {other}",
                table.id_column
            ))),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for PersistenceContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceContext")
            .field("engine", &self.engine)
            .field("identity", &self.identity)
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish()
    }
}
