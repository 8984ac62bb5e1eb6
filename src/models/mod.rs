mod category;
mod post;
mod tag;
mod user;

pub use category::*;
pub use post::*;
pub use tag::*;
pub use user::*;
