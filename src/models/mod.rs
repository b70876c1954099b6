//! FOSSology API model types and endpoint functions.

mod enums;
mod folder;
mod group;
mod info;
mod item;
mod job;
mod license;
mod report;
mod search;
mod upload;
mod user;

pub use enums::*;
pub use folder::*;
pub use group::*;
pub use info::*;
pub use item::*;
pub use job::*;
pub use license::*;
pub use report::*;
pub use search::*;
pub use upload::*;
pub use user::*;
