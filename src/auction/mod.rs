pub mod events;
pub mod window;

pub use window::{AuctionWindow, WindowStatus};
