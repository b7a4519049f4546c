//! The operation buffer.
//!
//! Every record is an opcode byte followed by a payload whose length is fixed
//! per opcode. Integers are 4-byte little endian. Strings never appear inline:
//! records carry an index into the buffer's string table, which keeps every
//! record of one kind the same size.
//!
//! Records are only ever appended, so replaying a buffer from the start always
//! decodes the same sequence. The typed builders in [`crate::pointer`] are the
//! public way to write records; [`Reader`] is the way to read them back.

mod reader;

use ahash::{HashMap, HashMapExt};

pub use reader::{DecodeError, Op, Reader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpType {
    Area = 1,
    PopArea,
    Pass,
    PopPass,
    Cursor,
    InputHandler,
    Paint,
}

impl OpType {
    pub const AREA_LEN: usize = 1 + 4 * 4;
    pub const CURSOR_LEN: usize = 4;
    pub const INPUT_HANDLER_LEN: usize = 4 + 1 + 1 + 4 * 4;
    pub const PAINT_LEN: usize = 4;

    /// Payload length in bytes, not counting the opcode itself.
    pub const fn payload_len(self) -> usize {
        match self {
            OpType::Area => Self::AREA_LEN,
            OpType::PopArea | OpType::Pass | OpType::PopPass => 0,
            OpType::Cursor => Self::CURSOR_LEN,
            OpType::InputHandler => Self::INPUT_HANDLER_LEN,
            OpType::Paint => Self::PAINT_LEN,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => OpType::Area,
            2 => OpType::PopArea,
            3 => OpType::Pass,
            4 => OpType::PopPass,
            5 => OpType::Cursor,
            6 => OpType::InputHandler,
            7 => OpType::Paint,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Area,
    Pass,
}

impl StackKind {
    fn index(self) -> usize {
        match self {
            StackKind::Area => 0,
            StackKind::Pass => 1,
        }
    }
}

/// Identity of one push, checked when the matching pop happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackId {
    kind: StackKind,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct StackState {
    open: Vec<u32>,
    /// Never rewinds, not even on reset, so stale ids from an earlier frame
    /// cannot match a fresh push.
    next_generation: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Ops {
    data: Vec<u8>,
    strings: Vec<String>,
    string_indices: HashMap<String, u32>,
    stacks: [StackState; 2],
}

impl Ops {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            strings: Vec::new(),
            string_indices: HashMap::new(),
            stacks: Default::default(),
        }
    }

    /// Empties the buffer for the next frame.
    ///
    /// # Panics
    ///
    /// If an area or pass push has not been popped yet.
    pub fn reset(&mut self) {
        assert!(
            self.is_balanced(),
            "reset with open stacks: {} area, {} pass",
            self.stacks[StackKind::Area.index()].open.len(),
            self.stacks[StackKind::Pass.index()].open.len(),
        );
        self.data.clear();
        self.strings.clear();
        self.string_indices.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when every push has been matched by its pop.
    pub fn is_balanced(&self) -> bool {
        self.stacks.iter().all(|stack| stack.open.is_empty())
    }

    pub fn string(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Appends one record.
    ///
    /// # Panics
    ///
    /// If `payload` does not have the length declared for `op`.
    pub(crate) fn write(&mut self, op: OpType, payload: &[u8]) {
        assert_eq!(
            payload.len(),
            op.payload_len(),
            "payload length mismatch for {op:?}"
        );
        self.data.push(op as u8);
        self.data.extend_from_slice(payload);
    }

    /// Appends a record whose first payload field references `value` in the
    /// string table; `rest` holds the remaining payload bytes.
    pub(crate) fn write_with_string(&mut self, op: OpType, value: &str, rest: &[u8]) {
        assert_eq!(
            4 + rest.len(),
            op.payload_len(),
            "payload length mismatch for {op:?}"
        );
        let index = self.intern(value);
        self.data.push(op as u8);
        self.data.extend_from_slice(&index.to_le_bytes());
        self.data.extend_from_slice(rest);
    }

    pub(crate) fn push(&mut self, kind: StackKind) -> StackId {
        let stack = &mut self.stacks[kind.index()];
        stack.next_generation += 1;
        let generation = stack.next_generation;
        stack.open.push(generation);
        StackId { kind, generation }
    }

    /// # Panics
    ///
    /// If `id` is not the most recent open push of its kind.
    pub(crate) fn pop(&mut self, id: StackId) {
        let stack = &mut self.stacks[id.kind.index()];
        match stack.open.last() {
            Some(&top) if top == id.generation => {
                stack.open.pop();
            }
            Some(&top) => panic!(
                "{:?} pop of push #{} out of order, push #{} is on top",
                id.kind, id.generation, top
            ),
            None => panic!(
                "{:?} pop of push #{} with nothing pushed",
                id.kind, id.generation
            ),
        }
    }

    fn intern(&mut self, value: &str) -> u32 {
        if let Some(&index) = self.string_indices.get(value) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(value.to_owned());
        self.string_indices.insert(value.to_owned(), index);
        index
    }
}

#[inline]
pub(crate) fn put_i32(buf: &mut [u8], value: i32) {
    buf[..4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn get_i32(buf: &[u8]) -> i32 {
    i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_appends_opcode_and_payload() {
        let mut ops = Ops::new();
        ops.write(OpType::Pass, &[]);
        ops.write(OpType::Paint, &[1, 2, 3, 4]);
        assert_eq!(ops.as_bytes(), &[3, 7, 1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "payload length mismatch")]
    fn write_rejects_wrong_payload_length() {
        let mut ops = Ops::new();
        ops.write(OpType::Paint, &[1, 2, 3]);
    }

    #[test]
    fn strings_are_interned_once() {
        let mut ops = Ops::new();
        ops.write_with_string(OpType::Cursor, "text", &[]);
        ops.write_with_string(OpType::Cursor, "grab", &[]);
        ops.write_with_string(OpType::Cursor, "text", &[]);
        assert_eq!(ops.as_bytes()[1..5], 0u32.to_le_bytes());
        assert_eq!(ops.as_bytes()[6..10], 1u32.to_le_bytes());
        assert_eq!(ops.as_bytes()[11..15], 0u32.to_le_bytes());
        assert_eq!(ops.string(1), Some("grab"));
        assert_eq!(ops.string(2), None);
    }

    #[test]
    fn nested_pushes_pop_in_order() {
        let mut ops = Ops::new();
        let outer = ops.push(StackKind::Area);
        let pass = ops.push(StackKind::Pass);
        let inner = ops.push(StackKind::Area);
        assert!(!ops.is_balanced());
        ops.pop(inner);
        ops.pop(pass);
        ops.pop(outer);
        assert!(ops.is_balanced());
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn popping_below_top_panics() {
        let mut ops = Ops::new();
        let outer = ops.push(StackKind::Area);
        let _inner = ops.push(StackKind::Area);
        ops.pop(outer);
    }

    #[test]
    #[should_panic(expected = "nothing pushed")]
    fn double_pop_panics() {
        let mut ops = Ops::new();
        let id = ops.push(StackKind::Pass);
        ops.pop(id);
        ops.pop(id);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn stale_id_after_reset_does_not_match() {
        let mut ops = Ops::new();
        let stale = ops.push(StackKind::Area);
        ops.pop(stale);
        ops.reset();
        let _fresh = ops.push(StackKind::Area);
        ops.pop(stale);
    }

    #[test]
    #[should_panic(expected = "reset with open stacks")]
    fn reset_with_open_push_panics() {
        let mut ops = Ops::new();
        let _id = ops.push(StackKind::Area);
        ops.reset();
    }

    #[test]
    fn reset_clears_records_and_strings() {
        let mut ops = Ops::new();
        ops.write_with_string(OpType::Cursor, "text", &[]);
        ops.reset();
        assert!(ops.is_empty());
        assert_eq!(ops.string(0), None);
    }
}
