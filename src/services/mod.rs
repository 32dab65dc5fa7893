//! Business logic services
//!
//! Services orchestrate the repositories and collaborators (image store,
//! email, token signing) and own the error taxonomy the API layer maps to
//! HTTP statuses.

pub mod category;
pub mod email;
pub mod images;
pub mod listing;
pub mod password;
pub mod token;
pub mod user;

pub use category::{CategoryService, CategoryServiceError};
pub use email::EmailService;
pub use images::{ImageStore, ImageStoreError};
pub use listing::{ListingService, ListingServiceError};
pub use token::{Claims, TokenError, TokenService};
pub use user::{UserService, UserServiceError};
