mod data;
mod debounce;
mod filter;
mod store;
mod subscription;
mod ticker;
mod timer;

pub use data::*;
pub use debounce::*;
pub use filter::*;
pub use store::*;
pub use subscription::*;
pub use ticker::*;
pub use timer::*;
