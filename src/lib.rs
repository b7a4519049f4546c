//! Operation buffers for immediate-mode UIs, pointer hit testing over them,
//! and headless windows that render them offscreen.
//!
//! A frame is described by appending operations to an [`Ops`] buffer through
//! the builders in [`pointer`]. The same buffer is used twice: a [`Router`]
//! decodes it to decide which input handlers receive a pointer event, and a
//! [`Window`] renders its paint operations on the GPU.
//!
//! ```no_run
//! use opframe::geometry::rect;
//! use opframe::pointer::{AreaOp, PaintOp};
//! use opframe::{new_offscreen_window, Color, Ops};
//!
//! let mut ops = Ops::new();
//! let area = AreaOp::rect(rect(0, 0, 2, 2)).push(&mut ops);
//! PaintOp { color: Color::rgb(255, 0, 0) }.add(&mut ops);
//! area.pop(&mut ops);
//!
//! let window = new_offscreen_window(4, 4)?;
//! window.frame(ops)?;
//! let image = window.screenshot()?;
//! assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
//! # Ok::<(), opframe::Error>(())
//! ```

pub use wgpu;

pub mod backend;
mod color;
pub mod driver;
mod error;
pub mod geometry;
mod headless;
pub mod ops;
pub mod pointer;
mod router;
pub mod wgpu_backend;

pub use color::Color;
pub use error::{CreateStep, Error};
pub use headless::{new_offscreen_window, new_offscreen_window_with, Window};
pub use ops::Ops;
pub use router::{Delivery, Hit, Router};
pub use wgpu_backend::{WgpuBackend, WgpuConfig};
