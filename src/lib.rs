pub mod auth;
pub mod db;
pub mod format;
pub mod routes;

use db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub index_template: String,
}
