//! Pointer hit testing over an operation buffer.
//!
//! The buffer is decoded once per query. Areas narrow the hit region of the
//! handlers declared inside them, later declarations sit on top of earlier
//! ones, and the topmost hit handler outside pass-through mode blocks every
//! handler underneath that is not attached to its own area or one of that
//! area's ancestors.

use smallvec::SmallVec;

use crate::geometry::{ellipse_contains, intersect, rect_contains, Point, Rect};
use crate::ops::{DecodeError, Op, OpType, Ops, Reader};
use crate::pointer::{AreaKind, CursorName, Event, Kind, Priority};

/// A handler chosen to receive an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub tag: String,
    pub priority: Priority,
    pub scroll_bounds: Rect,
}

/// An event prepared for one handler: priority set and scroll clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub tag: String,
    pub event: Event,
}

#[derive(Debug, Clone, Copy)]
struct AreaEntry {
    clip: Rect,
    hit: bool,
    node: usize,
}

#[derive(Debug)]
struct Candidate<'a> {
    tag: &'a str,
    grab: bool,
    kinds: Kind,
    scroll_bounds: Rect,
    hit: bool,
    pass: bool,
    node: usize,
}

#[derive(Debug, Default)]
struct Scan<'a> {
    handlers: Vec<Candidate<'a>>,
    cursors: Vec<(&'a str, bool)>,
    active_area: Option<Rect>,
}

/// Resolves pointer events against operation buffers.
///
/// Holds scratch storage only; nothing carries over from one query to the
/// next.
#[derive(Debug, Default)]
pub struct Router {
    areas: SmallVec<[AreaEntry; 8]>,
    /// Parent of every area node; node 0 is the unbounded root.
    parents: Vec<Option<usize>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers that receive an event of `kind` at `position`, topmost first.
    ///
    /// Grabbing handlers get [`Priority::Grabbed`]. Otherwise a handler gets
    /// [`Priority::Foremost`] when it is the only one receiving the event and
    /// [`Priority::Shared`] when it competes with others.
    pub fn hits(&mut self, ops: &Ops, position: Point, kind: Kind) -> Result<Vec<Hit>, DecodeError> {
        let scan = self.scan(ops, position)?;

        let mut blocking: Option<usize> = None;
        let mut receivers: SmallVec<[&Candidate<'_>; 8]> = SmallVec::new();
        for candidate in scan.handlers.iter().rev().filter(|c| c.hit) {
            if let Some(blocking) = blocking {
                if !self.is_ancestor_or_self(candidate.node, blocking) {
                    continue;
                }
            } else if !candidate.pass {
                blocking = Some(candidate.node);
            }
            if kind == Kind::CANCEL || candidate.kinds.contains(kind) {
                receivers.push(candidate);
            }
        }

        let shared = receivers.len() > 1;
        Ok(receivers
            .into_iter()
            .map(|candidate| Hit {
                tag: candidate.tag.to_owned(),
                priority: if candidate.grab {
                    Priority::Grabbed
                } else if shared {
                    Priority::Shared
                } else {
                    Priority::Foremost
                },
                scroll_bounds: candidate.scroll_bounds,
            })
            .collect())
    }

    /// Copies `event` for every receiving handler, with the handler's priority
    /// and, for scroll events, the scroll amount clamped to its bounds.
    pub fn deliver(&mut self, ops: &Ops, event: &Event) -> Result<Vec<Delivery>, DecodeError> {
        let hits = self.hits(ops, event.position, event.kind)?;
        Ok(hits
            .into_iter()
            .map(|hit| {
                let mut event = *event;
                event.priority = hit.priority;
                if event.kind == Kind::SCROLL {
                    let bounds = hit.scroll_bounds.to_f32();
                    event.scroll.x = event.scroll.x.clamp(bounds.min.x, bounds.max.x);
                    event.scroll.y = event.scroll.y.clamp(bounds.min.y, bounds.max.y);
                }
                Delivery {
                    tag: hit.tag,
                    event,
                }
            })
            .collect())
    }

    /// The cursor of the topmost area containing `position`.
    pub fn cursor(&mut self, ops: &Ops, position: Point) -> Result<CursorName, DecodeError> {
        let scan = self.scan(ops, position)?;
        Ok(scan
            .cursors
            .iter()
            .rev()
            .find(|(_, hit)| *hit)
            .map(|(name, _)| CursorName((*name).to_owned().into()))
            .unwrap_or_default())
    }

    /// The clip of the innermost area still open at the end of the buffer,
    /// or `None` when no area is open.
    pub fn active_area(&mut self, ops: &Ops) -> Result<Option<Rect>, DecodeError> {
        Ok(self.scan(ops, Point::zero())?.active_area)
    }

    fn scan<'a>(&mut self, ops: &'a Ops, position: Point) -> Result<Scan<'a>, DecodeError> {
        self.areas.clear();
        self.parents.clear();
        self.parents.push(None);

        let mut scan = Scan::default();
        let mut pass_depth = 0usize;
        for op in Reader::new(ops) {
            match op? {
                Op::Area { kind, rect } => {
                    let parent = self.areas.last().copied();
                    let contains = match kind {
                        AreaKind::Rect => rect_contains(&rect, position),
                        AreaKind::Ellipse => ellipse_contains(&rect, position),
                    };
                    let node = self.parents.len();
                    self.parents.push(Some(parent.map_or(0, |p| p.node)));
                    self.areas.push(AreaEntry {
                        clip: parent.map_or(rect, |p| intersect(&p.clip, &rect)),
                        hit: contains && parent.map_or(true, |p| p.hit),
                        node,
                    });
                }
                Op::PopArea => {
                    self.areas
                        .pop()
                        .ok_or(DecodeError::Unbalanced { op: OpType::PopArea })?;
                }
                Op::Pass => pass_depth += 1,
                Op::PopPass => {
                    pass_depth = pass_depth
                        .checked_sub(1)
                        .ok_or(DecodeError::Unbalanced { op: OpType::PopPass })?;
                }
                Op::Cursor { name } => scan.cursors.push((name, self.current_hit())),
                Op::InputHandler {
                    tag,
                    grab,
                    kinds,
                    scroll_bounds,
                } => scan.handlers.push(Candidate {
                    tag,
                    grab,
                    kinds,
                    scroll_bounds,
                    hit: self.current_hit(),
                    pass: pass_depth > 0,
                    node: self.areas.last().map_or(0, |area| area.node),
                }),
                Op::Paint { .. } => {}
            }
        }
        scan.active_area = self.areas.last().map(|area| area.clip);
        Ok(scan)
    }

    fn current_hit(&self) -> bool {
        self.areas.last().map_or(true, |area| area.hit)
    }

    fn is_ancestor_or_self(&self, node: usize, of: usize) -> bool {
        let mut current = Some(of);
        while let Some(n) = current {
            if n == node {
                return true;
            }
            current = self.parents[n];
        }
        false
    }
}
