/// Business logic layer
///
/// - `credentials`: registration and password verification
/// - `sessions`: signed session token issue/validation
/// - `posts`: the post aggregate
/// - `views`: view event recording
pub mod credentials;
pub mod posts;
pub mod sessions;
pub mod views;

pub use credentials::{CredentialService, Registration};
pub use posts::PostService;
pub use sessions::SessionIssuer;
pub use views::ViewRecorder;
