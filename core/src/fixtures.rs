//! Small entity model for unit tests.

use crate::entity::{Association, AssociationPath, ColumnInfo, Entity, EntityPath, Identity, TableInfo};
use crate::error::Result;
use crate::expr::Expr;
use crate::row::RowReader;
use crate::value::{SqlType, Value};

static AUTHOR: TableInfo = TableInfo {
    name: "author",
    id_column: "author_id",
    columns: &[ColumnInfo::new("name", SqlType::Text)],
};

static BOOK: TableInfo = TableInfo {
    name: "book",
    id_column: "book_id",
    columns: &[
        ColumnInfo::new("title", SqlType::Text),
        ColumnInfo::new("author_id", SqlType::Integer)
            .nullable()
            .references("author", "author_id"),
    ],
};

pub fn author_table() -> &'static TableInfo {
    &AUTHOR
}

#[derive(Debug)]
pub struct Author {
    pub id: Identity,
    pub name: String,
}

impl Author {
    pub fn new(name: &str) -> Self {
        Self {
            id: Identity::new(),
            name: name.to_owned(),
        }
    }
}

impl Entity for Author {
    fn table() -> &'static TableInfo {
        &AUTHOR
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
pub struct Book {
    pub id: Identity,
    pub title: String,
    pub author: Association<Author>,
}

impl Entity for Book {
    fn table() -> &'static TableInfo {
        &BOOK
    }

    fn identity(&self) -> &Identity {
        &self.id
    }

    fn column_values(&self) -> Result<Vec<Value>> {
        Ok(vec![Value::from(self.title.as_str()), Value::from(self.author.foreign_key()?)])
    }

    fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: Identity::new(),
            title: row.get()?,
            author: row.association()?,
        })
    }
}

fn book_author(book: &Book) -> &Association<Author> {
    &book.author
}

pub struct QAuthor {
    pub entity: EntityPath<Author>,
    pub id: Expr<i64>,
    pub name: Expr<String>,
}

impl QAuthor {
    pub fn new(alias: &str) -> Self {
        let entity = EntityPath::new(alias);
        Self {
            id: entity.id(),
            name: entity.column("name"),
            entity,
        }
    }
}

pub struct QBook {
    pub entity: EntityPath<Book>,
    pub id: Expr<i64>,
    pub title: Expr<String>,
    pub author: AssociationPath<Book, Author>,
}

impl QBook {
    pub fn new(alias: &str) -> Self {
        let entity = EntityPath::new(alias);
        Self {
            id: entity.id(),
            title: entity.column("title"),
            author: AssociationPath::new(alias, "author", "author_id", book_author),
            entity,
        }
    }
}
