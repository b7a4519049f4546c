use thiserror::Error;

use super::{get_i32, OpType, Ops};
use crate::color::Color;
use crate::geometry::{rect, Rect};
use crate::pointer::{AreaKind, Kind};

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum Op<'a> {
    Area {
        kind: AreaKind,
        rect: Rect,
    },
    PopArea,
    Pass,
    PopPass,
    Cursor {
        name: &'a str,
    },
    InputHandler {
        tag: &'a str,
        grab: bool,
        kinds: Kind,
        scroll_bounds: Rect,
    },
    Paint {
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
    #[error("truncated {op:?} record at offset {offset}")]
    Truncated { op: OpType, offset: usize },
    #[error("string index {index} out of range at offset {offset}")]
    StringIndex { index: u32, offset: usize },
    #[error("unknown area kind {kind} at offset {offset}")]
    AreaKind { kind: u8, offset: usize },
    #[error("{op:?} without a matching push")]
    Unbalanced { op: OpType },
}

/// Walks an [`Ops`] buffer from the first record.
///
/// Iteration stops after the first error.
pub struct Reader<'a> {
    ops: &'a Ops,
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(ops: &'a Ops) -> Self {
        Self { ops, offset: 0 }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn decode(&self, offset: usize) -> Result<(Op<'a>, usize), DecodeError> {
        let data = self.ops.as_bytes();
        let opcode = data[offset];
        let op = OpType::from_byte(opcode).ok_or(DecodeError::UnknownOpcode { opcode, offset })?;
        let start = offset + 1;
        let end = start + op.payload_len();
        let payload = data
            .get(start..end)
            .ok_or(DecodeError::Truncated { op, offset })?;

        let string = |index_bytes: &[u8]| {
            let index = get_i32(index_bytes) as u32;
            self.ops
                .string(index)
                .ok_or(DecodeError::StringIndex { index, offset })
        };
        let read_rect = |bytes: &[u8]| {
            rect(
                get_i32(&bytes[0..]),
                get_i32(&bytes[4..]),
                get_i32(&bytes[8..]),
                get_i32(&bytes[12..]),
            )
        };

        let decoded = match op {
            OpType::Area => {
                let kind = AreaKind::from_byte(payload[0]).ok_or(DecodeError::AreaKind {
                    kind: payload[0],
                    offset,
                })?;
                Op::Area {
                    kind,
                    rect: read_rect(&payload[1..]),
                }
            }
            OpType::PopArea => Op::PopArea,
            OpType::Pass => Op::Pass,
            OpType::PopPass => Op::PopPass,
            OpType::Cursor => Op::Cursor {
                name: string(&payload[0..4])?,
            },
            OpType::InputHandler => Op::InputHandler {
                tag: string(&payload[0..4])?,
                grab: payload[4] != 0,
                kinds: Kind::from_bits_truncate(payload[5]),
                scroll_bounds: read_rect(&payload[6..]),
            },
            OpType::Paint => Op::Paint {
                color: Color([payload[0], payload[1], payload[2], payload[3]]),
            },
        };
        Ok((decoded, end))
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Op<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.ops.len() {
            return None;
        }
        match self.decode(self.offset) {
            Ok((op, next)) => {
                self.offset = next;
                Some(Ok(op))
            }
            Err(err) => {
                self.offset = self.ops.len();
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::{AreaOp, CursorName, CursorNameOp, InputOp, PassOp, PaintOp};

    fn sample_ops() -> Ops {
        let mut ops = Ops::new();
        let area = AreaOp::ellipse(rect(-5, 0, 10, 20)).push(&mut ops);
        let pass = PassOp.push(&mut ops);
        CursorNameOp {
            name: CursorName::POINTER,
        }
        .add(&mut ops);
        InputOp {
            tag: "button",
            grab: true,
            kinds: Kind::PRESS | Kind::SCROLL,
            scroll_bounds: rect(-3, -4, 5, 6),
        }
        .add(&mut ops);
        PaintOp {
            color: Color::rgb(1, 2, 3),
        }
        .add(&mut ops);
        pass.pop(&mut ops);
        area.pop(&mut ops);
        ops
    }

    #[test]
    fn decodes_every_record_kind() {
        let ops = sample_ops();
        let decoded: Vec<_> = Reader::new(&ops).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            decoded,
            vec![
                Op::Area {
                    kind: AreaKind::Ellipse,
                    rect: rect(-5, 0, 10, 20),
                },
                Op::Pass,
                Op::Cursor { name: "pointer" },
                Op::InputHandler {
                    tag: "button",
                    grab: true,
                    kinds: Kind::PRESS | Kind::SCROLL,
                    scroll_bounds: rect(-3, -4, 5, 6),
                },
                Op::Paint {
                    color: Color::rgb(1, 2, 3),
                },
                Op::PopPass,
                Op::PopArea,
            ]
        );
    }

    #[test]
    fn replay_is_deterministic() {
        let ops = sample_ops();
        let first: Vec<_> = Reader::new(&ops).collect();
        let second: Vec<_> = Reader::new(&ops).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_opcode_stops_iteration() {
        let mut ops = Ops::new();
        ops.write(OpType::Pass, &[]);
        ops.data.push(0xee);
        ops.write(OpType::PopPass, &[]);

        let mut reader = Reader::new(&ops);
        assert_eq!(reader.next(), Some(Ok(Op::Pass)));
        assert_eq!(
            reader.next(),
            Some(Err(DecodeError::UnknownOpcode {
                opcode: 0xee,
                offset: 1
            }))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn truncated_record_is_reported() {
        let mut ops = Ops::new();
        ops.data.extend_from_slice(&[OpType::Paint as u8, 1, 2]);
        let result: Result<Vec<_>, _> = Reader::new(&ops).collect();
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                op: OpType::Paint,
                offset: 0
            })
        );
    }
}
