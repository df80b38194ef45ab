pub mod contact_message;
pub mod product;
pub mod product_image;
pub mod product_video;

pub use contact_message::{ContactSubject, Entity as ContactMessage};
pub use product::{Color, Entity as Product, Gender, ProductCategory, Season, Size};
pub use product_image::Entity as ProductImage;
pub use product_video::Entity as ProductVideo;
