//! 入れ子タプルの走査
//!
//! `original::tuple` は要素を `{ cur_elem, next: { cur_elem, next: ... } }` の形で
//! 再帰的に埋め込みます。`cur_elem` が読めなくなった所を末尾とみなします。

use crate::element::{ElementPair, Step};
use crate::limits::WalkLimits;
use nozoki_host::{ObjectHandle, RemoteAccessor, Value};

/// タプルのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleLayout {
    pub elems: &'static str,
    pub current: &'static str,
    pub rest: &'static str,
}

impl TupleLayout {
    pub const DEFAULT: TupleLayout = TupleLayout {
        elems: "elems",
        current: "cur_elem",
        rest: "next",
    };
}

impl Default for TupleLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// タプル走査
pub struct TupleWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    layout: TupleLayout,
    level: Option<ObjectHandle>,
    depth_left: usize,
    started: bool,
    tuple: ObjectHandle,
}

impl<'a, 'h> TupleWalk<'a, 'h> {
    pub fn new(
        accessor: &'a RemoteAccessor<'h>,
        tuple: &ObjectHandle,
        layout: TupleLayout,
        limits: &WalkLimits,
    ) -> Self {
        Self {
            accessor,
            layout,
            level: None,
            depth_left: limits.max_depth,
            started: false,
            tuple: tuple.clone(),
        }
    }

    fn nested(&self, holder: &ObjectHandle, name: &str) -> Option<ObjectHandle> {
        self.accessor
            .field(holder, name)
            .ok()
            .as_ref()
            .and_then(Value::as_handle)
    }
}

impl Iterator for TupleWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if !self.started {
            self.started = true;
            self.level = self.nested(&self.tuple, self.layout.elems);
        }

        if self.depth_left == 0 {
            self.level = None;
        }
        let level = self.level.take()?;
        self.depth_left -= 1;

        // 読めなければ再帰の終端
        let elem = self.accessor.field(&level, self.layout.current).ok()?;
        self.level = self.nested(&level, self.layout.rest);
        Some(Ok(ElementPair::single(elem)))
    }
}
