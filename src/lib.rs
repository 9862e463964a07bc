//! Geometry of one time-axis column in a schedule view: classified time
//! frames, cropping, position/date mapping and magnet snapping.

pub mod calendar;
pub mod column;
pub mod config;
pub mod magnet;
pub mod model;

pub use calendar::{Calendar, WorkCalendar};
pub use column::Column;
pub use magnet::{Magnet, MagnetUnit, Midpoint};
pub use model::{ColumnError, FrameMode, RawTimeFrame, Size, TimeFrame};
