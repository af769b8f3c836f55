//! 表示アダプタ
//!
//! コンテナの種類ごとの違い（走査戦略、子要素の並べ方、要約の書式、内部状態フィールド）は
//! [`AdapterSpec`] に静的に記述します。1つの [`DisplayAdapter`] がそれを解釈して、
//! 要約文字列と子要素の列を生成します。
//!
//! 子要素の生成は遅延的です。要素ごとのリモート呼び出しの失敗はその子要素だけを
//! [`ChildValue::Unavailable`] に置き換え、残りの表示は続きます。

use crate::config::{DisplayConfig, PRETTY_PARAMETER};
use nozoki_host::{
    address_of, format_address, format_handle_address, ObjectHandle, RemoteAccessor,
    RemoteEvalError, Value,
};
use nozoki_walk::{
    inspect_smart_ptr, ChainLayout, ChainWalk, ElementPair, HashLayout, HashWalk, IndexedWalk,
    SkipListLayout, SkipListWalk, SmartPtrLayout, Step, TreeLayout, TreeWalk, TupleLayout,
    TupleWalk,
};
use std::fmt;
use std::iter;
use tracing::debug;

/// 要素数を返すメンバー関数
pub const SIZE_OP: &str = "size";

/// 省略された残りの要素を表すラベル
pub const ELIDED_LABEL: &str = "...";

type Steps<'a> = Box<dyn Iterator<Item = Step> + 'a>;

/// 子要素の表示方法のヒント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
    /// 値だけを並べる
    Array,
    /// `[key] = value` の組として並べる
    Map,
}

impl DisplayHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayHint::Array => "array",
            DisplayHint::Map => "map",
        }
    }
}

/// 要素を取り出す走査戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// 先頭ノードから `next` を辿る
    Chain {
        head: &'static str,
        layout: ChainLayout,
    },
    /// 根から中間順に辿る
    Tree {
        root: &'static str,
        layout: TreeLayout,
    },
    SkipList(SkipListLayout),
    Hash(HashLayout),
    /// `0..size` の添字で要素を取り出す
    Indexed { element_at: &'static str },
    /// 2つのフィールドを `[0]`, `[1]` として並べる
    Pair {
        first: &'static str,
        second: &'static str,
    },
    Tuple(TupleLayout),
    /// 値を持つかどうかを問い合わせ、持つ場合だけ中身を見せる
    Optional {
        engaged: &'static str,
        storage: &'static str,
        payload: &'static str,
    },
    /// 内部のコンテナをそのまま見せる
    Adaptor { serial: &'static str },
    SmartPtr(SmartPtrLayout),
}

/// 要素から子要素への並べ方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[i]` にキーだけを並べる（シーケンス、集合）
    Elements,
    /// `[i].key` と `[i].value` を並べる（マップ）
    Entries,
}

impl Shape {
    fn children(&self, index: usize, step: Step) -> Vec<Child> {
        match (self, step) {
            (Shape::Elements, Ok(pair)) => vec![Child::value(format!("[{}]", index), pair.key)],
            (Shape::Entries, Ok(ElementPair { key, value })) => {
                let mut children = vec![Child::value(format!("[{}].key", index), key)];
                if let Some(value) = value {
                    children.push(Child::value(format!("[{}].value", index), value));
                }
                children
            }
            (Shape::Elements, Err(e)) => vec![Child::unavailable(format!("[{}]", index), &e)],
            (Shape::Entries, Err(e)) => vec![
                Child::unavailable(format!("[{}].key", index), &e),
                Child::unavailable(format!("[{}].value", index), &e),
            ],
        }
    }
}

/// 要約文字列の書式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    /// `T(@0x...)`
    Address,
    /// `T(size=N, @0x...)`
    Size,
    /// `T(cap=N, @0x...)`
    Capacity,
    /// `T(size=N, levels=L, @0x...)`
    Levels { levels: &'static str },
    /// `T(size=N, cap=C, @0x...)`（Cはブロック表の長さ×ブロック長）
    Blocks {
        map: &'static str,
        block_size: u64,
    },
    /// `T(notnull=B, @0x...)`
    Engaged,
    /// `T(@0x...)` または `T(nullptr)`（保持しているポインタ）
    Pointee,
}

/// 内部状態フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Internal {
    /// フィールドが指す（または置かれている）アドレスを `@0x...` で表示する
    Address {
        label: &'static str,
        field: &'static str,
    },
    /// フィールドの値をそのまま表示する
    Field {
        label: &'static str,
        field: &'static str,
    },
}

impl Internal {
    fn child(&self, accessor: &RemoteAccessor<'_>, handle: &ObjectHandle) -> Child {
        match *self {
            Internal::Address { label, field } => match accessor.field(handle, field) {
                Ok(value) => Child::text(label, format_handle_address(address_of(&value))),
                Err(e) => Child::unavailable(label, &e),
            },
            Internal::Field { label, field } => {
                Child::from_result(label, accessor.field(handle, field))
            }
        }
    }
}

/// 内部状態フィールドを表示する条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 冗長表示のときだけ
    Verbose,
    /// 常に
    Always,
}

/// コンテナの種類ごとの表示仕様
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSpec {
    /// 登録に使う型名（名前空間なし）
    pub type_name: &'static str,
    /// 要約に表示するクラス名（名前空間なし）
    pub class_name: &'static str,
    pub strategy: Strategy,
    pub shape: Shape,
    pub summary: SummaryStyle,
    /// 先頭に `size` の子要素を置くか
    pub leading_size: bool,
    pub internals: &'static [Internal],
    pub visibility: Visibility,
    pub hint: Option<DisplayHint>,
}

/// 子要素の値
#[derive(Debug, Clone, PartialEq)]
pub enum ChildValue {
    /// ホストが返した値
    Value(Value),
    /// 整形済みの文字列
    Text(String),
    /// 取得できなかった値の診断
    Unavailable(String),
}

impl fmt::Display for ChildValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChildValue::Value(v) => write!(f, "{}", v),
            ChildValue::Text(s) | ChildValue::Unavailable(s) => write!(f, "{}", s),
        }
    }
}

/// ラベル付きの子要素
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub label: String,
    pub value: ChildValue,
}

impl Child {
    pub fn value(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value: ChildValue::Value(value),
        }
    }

    pub fn text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: ChildValue::Text(text.into()),
        }
    }

    pub fn unavailable(label: impl Into<String>, error: &RemoteEvalError) -> Self {
        Self {
            label: label.into(),
            value: ChildValue::Unavailable(error.placeholder()),
        }
    }

    pub fn from_result(label: impl Into<String>, result: Result<Value, RemoteEvalError>) -> Self {
        match result {
            Ok(value) => Self::value(label, value),
            Err(e) => Self::unavailable(label, &e),
        }
    }

    /// 表示上限を超えた要素の目印
    pub fn elided() -> Self {
        Self::text(ELIDED_LABEL, ELIDED_LABEL)
    }
}

/// 表示用に並べ直した子要素
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry<'r> {
    Labelled(&'r str, &'r ChildValue),
    /// マップの `[key] = value`
    Pair(&'r ChildValue, &'r ChildValue),
    Elided,
}

/// 1回の表示要求の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub summary: String,
    pub children: Vec<Child>,
    pub hint: Option<DisplayHint>,
}

impl Rendered {
    /// ラベルで子要素を探す
    pub fn child(&self, label: &str) -> Option<&ChildValue> {
        self.children
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.value)
    }

    /// ヒントに従って子要素を並べ直す
    ///
    /// マップでは連続する `[i].key` と `[i].value` を1つの組にまとめます。
    pub fn entries(&self) -> Vec<Entry<'_>> {
        let mut entries = Vec::with_capacity(self.children.len());
        let mut i = 0;
        while i < self.children.len() {
            let child = &self.children[i];
            if child.label == ELIDED_LABEL {
                entries.push(Entry::Elided);
                i += 1;
                continue;
            }
            if self.hint == Some(DisplayHint::Map) {
                if let (Some(prefix), Some(next)) =
                    (child.label.strip_suffix(".key"), self.children.get(i + 1))
                {
                    if next.label.strip_suffix(".value") == Some(prefix) {
                        entries.push(Entry::Pair(&child.value, &next.value));
                        i += 2;
                        continue;
                    }
                }
            }
            entries.push(Entry::Labelled(&child.label, &child.value));
            i += 1;
        }
        entries
    }

    /// 子要素の値の書式を指定して整形する
    ///
    /// `pretty` なら1行に1要素ずつ、`indent` 段の字下げで並べます。
    pub fn format_with(
        &self,
        pretty: bool,
        indent: usize,
        value_fmt: &dyn Fn(&ChildValue) -> String,
    ) -> String {
        if self.children.is_empty() {
            return self.summary.clone();
        }

        let items: Vec<String> = self
            .entries()
            .into_iter()
            .map(|entry| match entry {
                Entry::Labelled(label, value)
                    if self.hint == Some(DisplayHint::Array) && label.starts_with('[') =>
                {
                    value_fmt(value)
                }
                Entry::Labelled(label, value) => format!("{} = {}", label, value_fmt(value)),
                Entry::Pair(key, value) => format!("[{}] = {}", value_fmt(key), value_fmt(value)),
                Entry::Elided => ELIDED_LABEL.to_string(),
            })
            .collect();

        if pretty {
            let pad = "  ".repeat(indent + 1);
            let close = "  ".repeat(indent);
            format!(
                "{} = {{\n{}{}\n{}}}",
                self.summary,
                pad,
                items.join(&format!(",\n{}", pad)),
                close
            )
        } else {
            format!("{} = {{{}}}", self.summary, items.join(", "))
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format_with(false, 0, &|v| v.to_string()))
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn text<T: fmt::Display>(result: Result<T, RemoteEvalError>) -> String {
    match result {
        Ok(v) => v.to_string(),
        Err(e) => e.placeholder(),
    }
}

/// 表示アダプタ
///
/// 1回の表示要求の間だけ生存し、アクセサを借用します。
pub struct DisplayAdapter<'a, 'h> {
    spec: &'static AdapterSpec,
    accessor: &'a RemoteAccessor<'h>,
    handle: ObjectHandle,
    config: &'a DisplayConfig,
}

impl<'a, 'h: 'a> DisplayAdapter<'a, 'h> {
    /// アダプタを作成する
    ///
    /// アドレスを持たないハンドルは表示できないため `NullHandle` を返します。
    pub fn new(
        spec: &'static AdapterSpec,
        accessor: &'a RemoteAccessor<'h>,
        handle: &ObjectHandle,
        config: &'a DisplayConfig,
    ) -> Result<Self, RemoteEvalError> {
        if handle.is_null() {
            return Err(RemoteEvalError::NullHandle);
        }

        Ok(Self {
            spec,
            accessor,
            handle: handle.clone(),
            config,
        })
    }

    pub fn spec(&self) -> &'static AdapterSpec {
        self.spec
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }

    /// 名前空間で修飾したクラス名
    pub fn class_name(&self) -> String {
        self.config.qualify(self.spec.class_name)
    }

    pub fn hint(&self) -> Option<DisplayHint> {
        self.spec.hint
    }

    /// 内部状態フィールドを表示するか
    pub fn is_verbose(&self) -> bool {
        self.config
            .verbose
            .or_else(|| self.accessor.parameter(PRETTY_PARAMETER))
            .unwrap_or(false)
    }

    /// 要素数を問い合わせる
    pub fn size(&self) -> Result<u64, RemoteEvalError> {
        self.accessor.invoke_u64(&self.handle, SIZE_OP, &[])
    }

    /// 1行の要約（要求のたびに計算し直す）
    pub fn summary(&self) -> String {
        let address = format_handle_address(self.handle.address);
        let body = match self.spec.summary {
            SummaryStyle::Address => address,
            SummaryStyle::Size => format!("size={}, {}", text(self.size()), address),
            SummaryStyle::Capacity => format!("cap={}, {}", text(self.size()), address),
            SummaryStyle::Levels { levels } => format!(
                "size={}, levels={}, {}",
                text(self.size()),
                text(self.accessor.invoke_u64(&self.handle, levels, &[])),
                address
            ),
            SummaryStyle::Blocks { map, block_size } => format!(
                "size={}, cap={}, {}",
                text(self.size()),
                text(self.block_capacity(map, block_size)),
                address
            ),
            SummaryStyle::Engaged => format!("notnull={}, {}", text(self.engaged()), address),
            SummaryStyle::Pointee => text(self.pointee()),
        };
        format!("{}({})", self.class_name(), body)
    }

    /// 子要素を遅延的に列挙する
    pub fn children(&self) -> Box<dyn Iterator<Item = Child> + 'a> {
        let leading = if self.spec.leading_size {
            Some(self.size_child())
        } else {
            None
        };

        Box::new(
            leading
                .into_iter()
                .chain(self.element_children())
                .chain(self.internal_children()),
        )
    }

    /// 要約と子要素をまとめて取得する
    pub fn render(&self) -> Rendered {
        Rendered {
            summary: self.summary(),
            children: self.children().collect(),
            hint: self.hint(),
        }
    }

    fn block_capacity(&self, map: &str, block_size: u64) -> Result<u64, RemoteEvalError> {
        let map = self.accessor.field(&self.handle, map)?;
        let map = self.accessor.deref(&map)?;
        let blocks = self.accessor.invoke_u64(&map, SIZE_OP, &[])?;
        Ok(blocks.saturating_mul(block_size))
    }

    fn engaged(&self) -> Result<bool, RemoteEvalError> {
        let op = match self.spec.strategy {
            Strategy::Optional { engaged, .. } => engaged,
            _ => {
                return Err(RemoteEvalError::EvaluationFailed(format!(
                    "{} has no engagement test",
                    self.class_name()
                )))
            }
        };
        let value = self.accessor.invoke(&self.handle, op, &[])?;
        value.as_bool().ok_or_else(|| {
            RemoteEvalError::EvaluationFailed(format!("{}() returned {}", op, value))
        })
    }

    fn pointee(&self) -> Result<String, RemoteEvalError> {
        match self.spec.strategy {
            Strategy::SmartPtr(layout) => {
                let raw = self.accessor.invoke(&self.handle, layout.get, &[])?;
                Ok(format_handle_address(raw.as_u64()))
            }
            _ => Ok(format_handle_address(self.handle.address)),
        }
    }

    fn size_child(&self) -> Child {
        match self.spec.strategy {
            Strategy::Tuple(layout) => {
                let count =
                    TupleWalk::new(self.accessor, &self.handle, layout, &self.config.limits).count();
                Child::value("size", Value::Uint(count as u64))
            }
            _ => Child::from_result("size", self.size().map(Value::Uint)),
        }
    }

    fn element_children(&self) -> Box<dyn Iterator<Item = Child> + 'a> {
        match self.spec.strategy {
            Strategy::Optional {
                engaged: _,
                storage,
                payload,
            } => Box::new(self.optional_children(storage, payload).into_iter()),
            Strategy::Adaptor { serial } => Box::new(iter::once(Child::from_result(
                "serial",
                self.accessor.field(&self.handle, serial),
            ))),
            Strategy::SmartPtr(layout) => Box::new(self.smart_ptr_children(&layout).into_iter()),
            _ => {
                let shape = self.spec.shape;
                let max = self.config.max_children;
                Box::new(
                    self.steps()
                        .enumerate()
                        .take(max.saturating_add(1))
                        .flat_map(move |(index, step)| {
                            if index == max {
                                debug!(max, "element list truncated");
                                vec![Child::elided()]
                            } else {
                                shape.children(index, step)
                            }
                        }),
                )
            }
        }
    }

    fn internal_children(&self) -> Box<dyn Iterator<Item = Child> + 'a> {
        let shown = match self.spec.visibility {
            Visibility::Always => true,
            Visibility::Verbose => self.is_verbose(),
        };
        if !shown {
            return Box::new(iter::empty());
        }

        let accessor = self.accessor;
        let handle = self.handle.clone();
        Box::new(
            self.spec
                .internals
                .iter()
                .map(move |internal| internal.child(accessor, &handle)),
        )
    }

    /// 戦略に応じた走査を作成する
    ///
    /// 走査を始められなければ、その失敗を1つだけ含む列を返します。
    fn steps(&self) -> Steps<'a> {
        let accessor = self.accessor;
        let handle = &self.handle;
        let limits = &self.config.limits;

        let walk: Result<Steps<'a>, RemoteEvalError> = match self.spec.strategy {
            Strategy::Chain { head, layout } => {
                accessor.field(handle, head).map(|head| -> Steps<'a> {
                    match self.size() {
                        Ok(size) => Box::new(ChainWalk::sized(accessor, head, to_usize(size), layout)),
                        Err(e) => {
                            debug!(error = %e, "size unavailable, walking chain to its terminator");
                            Box::new(ChainWalk::until_null(accessor, head, layout, limits))
                        }
                    }
                })
            }
            Strategy::Tree { root, layout } => accessor.field(handle, root).map(|root| -> Steps<'a> {
                let size = self.size().ok().map(to_usize);
                Box::new(TreeWalk::new(accessor, root, size, layout, limits))
            }),
            Strategy::SkipList(layout) => self.size().map(|size| -> Steps<'a> {
                Box::new(SkipListWalk::new(accessor, handle, to_usize(size), layout))
            }),
            Strategy::Hash(layout) => self.size().map(|size| -> Steps<'a> {
                Box::new(HashWalk::new(accessor, handle, to_usize(size), layout))
            }),
            Strategy::Indexed { element_at } => self.size().map(|size| -> Steps<'a> {
                Box::new(IndexedWalk::new(accessor, handle, to_usize(size), element_at))
            }),
            Strategy::Pair { first, second } => {
                let handle = handle.clone();
                Ok(Box::new([first, second].into_iter().map(move |name| {
                    accessor.field(&handle, name).map(ElementPair::single)
                })))
            }
            Strategy::Tuple(layout) => Ok(Box::new(TupleWalk::new(accessor, handle, layout, limits))),
            Strategy::Optional { .. } | Strategy::Adaptor { .. } | Strategy::SmartPtr(_) => {
                Ok(Box::new(iter::empty()))
            }
        };

        walk.unwrap_or_else(|e| {
            debug!(handle = %self.handle, error = %e, "cannot start walk");
            Box::new(iter::once(Err(e)))
        })
    }

    fn optional_children(&self, storage: &str, payload: &str) -> Vec<Child> {
        match self.engaged() {
            Ok(true) => {
                let value = self
                    .accessor
                    .field(&self.handle, storage)
                    .and_then(|s| self.accessor.deref(&s))
                    .and_then(|s| self.accessor.field(&s, payload));
                vec![Child::from_result("value", value)]
            }
            Ok(false) => Vec::new(),
            Err(e) => vec![Child::unavailable("value", &e)],
        }
    }

    fn smart_ptr_children(&self, layout: &SmartPtrLayout) -> Vec<Child> {
        let view = match inspect_smart_ptr(self.accessor, &self.handle, layout) {
            Ok(view) => view,
            Err(e) => return vec![Child::unavailable("pointer", &e)],
        };

        let mut children = Vec::new();
        if let Some(address) = view.pointer {
            if view.is_array() {
                children.push(Child::text("array", format_address(address)));
            } else {
                children.push(Child::text("pointer", format_address(address)));
                children.push(match &view.target {
                    Some(target) => Child::value("object", Value::Object(target.clone())),
                    None => Child::value("object", Value::Unavailable),
                });
            }
        }

        match view.counts {
            Ok(counts) => {
                children.push(Child::value("strong_refs", Value::Uint(counts.strong)));
                children.push(Child::value("weak_refs", Value::Uint(counts.weak)));
            }
            Err(e) => children.push(Child::text(
                "ref_count_details",
                format!("[cannot access: {}]", e),
            )),
        }
        children
    }
}
