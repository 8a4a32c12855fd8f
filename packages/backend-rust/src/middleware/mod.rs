pub mod auth;

pub use auth::{require_learner, Learner, USER_ID_HEADER};
