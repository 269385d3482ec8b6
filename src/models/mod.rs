mod asset;
mod catalog;
mod event;
mod invite;
mod organization;
mod page;
mod user;

pub use asset::*;
pub use catalog::*;
pub use event::*;
pub use invite::*;
pub use organization::*;
pub use page::*;
pub use user::*;
