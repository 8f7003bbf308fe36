mod error;
mod user;
mod profile;
mod restaurant;
mod approval;
mod notification;
mod menu_item;
mod offer;
mod review;

pub use error::{ApiError, ErrorResponse};
pub use user::{Role, User};
pub use profile::ProfileFields;
pub use restaurant::{Restaurant, RestaurantStatus};
pub use approval::{ApprovalStatus, RestaurantApproval};
pub use notification::{Notification, NotificationType, Recipient};
pub use menu_item::MenuItem;
pub use offer::Offer;
pub use review::Review;
