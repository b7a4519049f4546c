//! Pointer operations and the event vocabulary they route.
//!
//! Areas and pass modes are pushed onto stacks inside an [`Ops`] buffer and
//! must be popped in reverse order:
//!
//! ```
//! use opframe::geometry::rect;
//! use opframe::pointer::{AreaOp, InputOp, Kind};
//! use opframe::Ops;
//!
//! let mut ops = Ops::new();
//! let area = AreaOp::rect(rect(0, 0, 100, 40)).push(&mut ops);
//! InputOp::new("button", Kind::PRESS | Kind::RELEASE).add(&mut ops);
//! area.pop(&mut ops);
//! assert!(ops.is_balanced());
//! ```

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use bitflags::bitflags;
use thiserror::Error;

use crate::color::Color;
use crate::geometry::{Point, Rect, Vector};
use crate::ops::{put_i32, OpType, Ops, StackId, StackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AreaKind {
    Rect = 0,
    Ellipse = 1,
}

impl AreaKind {
    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AreaKind::Rect),
            1 => Some(AreaKind::Ellipse),
            _ => None,
        }
    }
}

/// Narrows the hit area to its intersection with a rectangle or the ellipse
/// inscribed in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaOp {
    kind: AreaKind,
    rect: Rect,
}

/// An [`AreaOp`] on the area stack. Pop it with [`AreaStack::pop`].
#[must_use = "an area stays active until popped"]
#[derive(Debug)]
pub struct AreaStack {
    id: StackId,
}

impl AreaOp {
    pub fn rect(rect: Rect) -> Self {
        Self {
            kind: AreaKind::Rect,
            rect,
        }
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self {
            kind: AreaKind::Ellipse,
            rect,
        }
    }

    pub fn push(self, ops: &mut Ops) -> AreaStack {
        let id = ops.push(StackKind::Area);
        let mut payload = [0u8; OpType::AREA_LEN];
        payload[0] = self.kind as u8;
        put_i32(&mut payload[1..], self.rect.min.x);
        put_i32(&mut payload[5..], self.rect.min.y);
        put_i32(&mut payload[9..], self.rect.max.x);
        put_i32(&mut payload[13..], self.rect.max.y);
        ops.write(OpType::Area, &payload);
        AreaStack { id }
    }
}

impl AreaStack {
    /// # Panics
    ///
    /// If a later area push is still open.
    pub fn pop(self, ops: &mut Ops) {
        ops.pop(self.id);
        ops.write(OpType::PopArea, &[]);
    }
}

/// Pass-through mode: handlers declared while it is pushed don't block
/// handlers of sibling areas underneath.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassOp;

#[must_use = "pass-through mode stays active until popped"]
#[derive(Debug)]
pub struct PassStack {
    id: StackId,
}

impl PassOp {
    pub fn push(self, ops: &mut Ops) -> PassStack {
        let id = ops.push(StackKind::Pass);
        ops.write(OpType::Pass, &[]);
        PassStack { id }
    }
}

impl PassStack {
    pub fn pop(self, ops: &mut Ops) {
        ops.pop(self.id);
        ops.write(OpType::PopPass, &[]);
    }
}

/// Name of a pointer cursor. The empty name is the platform default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorName(pub Cow<'static, str>);

impl CursorName {
    pub const DEFAULT: Self = Self(Cow::Borrowed(""));
    pub const TEXT: Self = Self(Cow::Borrowed("text"));
    pub const POINTER: Self = Self(Cow::Borrowed("pointer"));
    pub const CROSS_HAIR: Self = Self(Cow::Borrowed("crosshair"));
    pub const COL_RESIZE: Self = Self(Cow::Borrowed("col-resize"));
    pub const ROW_RESIZE: Self = Self(Cow::Borrowed("row-resize"));
    pub const GRAB: Self = Self(Cow::Borrowed("grab"));
    /// Hides the cursor until another name is set.
    pub const NONE: Self = Self(Cow::Borrowed("none"));

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CursorName {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CursorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Sets the cursor shown over the current area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorNameOp {
    pub name: CursorName,
}

impl CursorNameOp {
    pub fn add(&self, ops: &mut Ops) {
        ops.write_with_string(OpType::Cursor, self.name.as_str(), &[]);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("input handler tag must not be empty")]
    EmptyTag,
    #[error("invalid scroll range {bounds:?}: both axes must contain zero")]
    InvalidScrollBounds { bounds: Rect },
}

/// Declares that `tag` wants pointer events of `kinds` inside the current
/// area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOp<'a> {
    pub tag: &'a str,
    /// Request exclusive ([`Priority::Grabbed`]) delivery.
    pub grab: bool,
    pub kinds: Kind,
    /// Maximum scroll distances on both axes. Every Scroll event delivered to
    /// `tag` satisfies `min.x <= scroll.x <= max.x` and likewise for y.
    pub scroll_bounds: Rect,
}

impl<'a> InputOp<'a> {
    pub fn new(tag: &'a str, kinds: Kind) -> Self {
        Self {
            tag,
            grab: false,
            kinds,
            scroll_bounds: Rect::zero(),
        }
    }

    pub fn validate(&self) -> Result<(), OpError> {
        if self.tag.is_empty() {
            return Err(OpError::EmptyTag);
        }
        let b = self.scroll_bounds;
        if b.min.x > 0 || b.max.x < 0 || b.min.y > 0 || b.max.y < 0 {
            return Err(OpError::InvalidScrollBounds { bounds: b });
        }
        Ok(())
    }

    pub fn try_add(&self, ops: &mut Ops) -> Result<(), OpError> {
        self.validate()?;
        let mut rest = [0u8; OpType::INPUT_HANDLER_LEN - 4];
        rest[0] = self.grab as u8;
        rest[1] = self.kinds.bits();
        put_i32(&mut rest[2..], self.scroll_bounds.min.x);
        put_i32(&mut rest[6..], self.scroll_bounds.min.y);
        put_i32(&mut rest[10..], self.scroll_bounds.max.x);
        put_i32(&mut rest[14..], self.scroll_bounds.max.y);
        ops.write_with_string(OpType::InputHandler, self.tag, &rest);
        Ok(())
    }

    /// Like [`InputOp::try_add`], for handlers that are known to be valid.
    ///
    /// # Panics
    ///
    /// If the tag is empty or the scroll bounds don't contain zero.
    pub fn add(&self, ops: &mut Ops) {
        if let Err(err) = self.try_add(ops) {
            panic!("{err}");
        }
    }
}

/// Fills the current area with a solid color. Hit testing ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintOp {
    pub color: Color,
}

impl PaintOp {
    pub fn add(&self, ops: &mut Ops) {
        ops.write(OpType::Paint, &self.color.to_array());
    }
}

bitflags! {
    /// Event kinds; [`InputOp::kinds`] is a set of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Kind: u8 {
        /// The current gesture was interrupted. Delivered whether or not a
        /// handler asked for it.
        const CANCEL = 1 << 0;
        const PRESS = 1 << 1;
        const RELEASE = 1 << 2;
        const MOVE = 1 << 3;
        const DRAG = 1 << 4;
        /// The pointer entered an area watching for pointer input.
        const ENTER = 1 << 5;
        const LEAVE = 1 << 6;
        const SCROLL = 1 << 7;
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            let mut chars = name.chars();
            if let Some(head) = chars.next() {
                write!(f, "{}{}", head, chars.as_str().to_ascii_lowercase())?;
            }
        }
        Ok(())
    }
}

/// How strongly a handler holds the event it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// One of several handlers matching the event.
    #[default]
    Shared,
    /// The only handler matching the event.
    Foremost,
    /// The handler asked for exclusive delivery.
    Grabbed,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Shared => "Shared",
            Priority::Foremost => "Foremost",
            Priority::Grabbed => "Grabbed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Source {
    #[default]
    Mouse,
    Touch,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Mouse => "Mouse",
            Source::Touch => "Touch",
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        /// Usually the left button for a right-handed user.
        const PRIMARY = 1 << 0;
        const SECONDARY = 1 << 1;
        /// Usually the middle button.
        const TERTIARY = 1 << 2;
    }
}

impl fmt::Display for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .iter()
            .map(|button| {
                if button == Buttons::PRIMARY {
                    "ButtonPrimary"
                } else if button == Buttons::SECONDARY {
                    "ButtonSecondary"
                } else {
                    "ButtonTertiary"
                }
            })
            .collect();
        f.write_str(&names.join("|"))
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const COMMAND = 1 << 1;
        const SHIFT = 1 << 2;
        const ALT = 1 << 3;
        const SUPER = 1 << 4;
    }
}

/// Tracks one pointer from Press to Release or Cancel.
pub type PointerId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Event {
    pub kind: Kind,
    pub source: Source,
    pub pointer_id: PointerId,
    /// Priority of the receiving handler, filled in on delivery.
    pub priority: Priority,
    /// Relative to an unspecified base.
    pub time: Duration,
    pub buttons: Buttons,
    pub position: Point,
    pub scroll: Vector,
    pub modifiers: Modifiers,
}

impl Event {
    pub fn new(kind: Kind, position: Point) -> Self {
        Self {
            kind,
            position,
            ..Default::default()
        }
    }
}
