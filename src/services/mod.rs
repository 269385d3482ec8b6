/// Input rejected before it reaches the backend; shown to the user as-is.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

pub mod assets;
pub mod auth;
pub mod backend;
pub mod catalog;
pub mod composite;
pub mod events;
pub mod guard;
pub mod hashid;
pub mod microsite;
pub mod organizations;
pub mod pagination;
pub mod providers;
pub mod slug;
pub mod upload;

/// Returns early with an [`InvalidInput`] error.
macro_rules! invalid {
    ($($arg:tt)*) => {
        return Err($crate::services::InvalidInput(format!($($arg)*)).into())
    };
}
pub(crate) use invalid;
