//! Inventory Codec
//!
//! Pure conversions between the live walkthrough tree and the report payload:
//! - [`to_report_room`] / [`build_report`]: live rooms → submission payload
//! - [`from_report_room`]: previous report → editable rooms
//! - [`reset_for_next_cycle`]: carry this cycle's photos forward as reference
//!
//! The only side effect is the injected [`ImageEncoder`]. Encoding failures
//! drop the affected photo and never abort a conversion.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod carry_forward;
pub mod convert;
pub mod encoder;

pub use carry_forward::{reset_for_next_cycle, reset_item_for_next_cycle};
pub use convert::{
    build_report, from_report_furniture, from_report_room, to_report_furniture, to_report_room,
};
pub use encoder::{encode_pictures, Base64FileEncoder, EncodingError, ImageEncoder};
