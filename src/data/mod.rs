//! External data collaborators.
//!
//! The forecasting core is pure; everything that touches the outside world
//! lives here:
//!
//! - JHU CSSE death-count fetch (`jhu`)
//! - built-in lockdown-date hints (`lockdown`)
//! - seeded synthetic outbreak generation (`sample`)

pub mod jhu;
pub mod lockdown;
pub mod sample;

pub use jhu::*;
pub use lockdown::*;
pub use sample::*;
