pub mod user;
pub mod event;
pub mod category;
pub mod tag;

pub use user::User;
pub use event::{Emotion, Event};
pub use category::Category;
pub use tag::{Tag, TagType};
