pub mod common;
pub mod contact;
pub mod storefront;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    services::{CatalogAdminService, CatalogService, ContactService},
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub contact: Arc<ContactService>,
    pub admin: Arc<CatalogAdminService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            contact: Arc::new(ContactService::new(db.clone())),
            admin: Arc::new(CatalogAdminService::from_config(db, config)),
        }
    }
}
