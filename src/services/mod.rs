// Storefront read side
pub mod catalog;

// Contact intake
pub mod contact;

// Administration and uploaded media
pub mod catalog_admin;
pub mod media;

pub use catalog::CatalogService;
pub use catalog_admin::CatalogAdminService;
pub use contact::ContactService;
pub use media::MediaStore;
