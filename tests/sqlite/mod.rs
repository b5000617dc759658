mod context;
mod errors;
mod fetch_join;
mod joins;
mod properties;
mod sql_generation;
