mod backend;
mod engagement;
mod items;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, Seed, SeedItem, SeedProfile};
