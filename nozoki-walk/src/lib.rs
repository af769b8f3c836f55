//! nozoki 構造走査エンジン
//!
//! このクレートは、検査対象プロセスのヒープ上にあるリンク構造を、アドレスと
//! 少数のリモート呼び出しだけで辿るための走査戦略を提供します。
//! 単方向チェーン、二分探索木の中間順走査、バケット付きハッシュ表、スキップリスト、
//! 添字アクセス、入れ子タプル、スマートポインタの制御ブロックを扱います。
//!
//! 各走査は遅延的で有限、かつ再開できない `Iterator` です。途中のリモート呼び出し失敗は
//! 走査全体を中断せず、`Err` の要素1つとして現れます。

pub mod chain;
pub mod element;
pub mod hash;
pub mod indexed;
pub mod limits;
pub mod skiplist;
pub mod smart_ptr;
pub mod tree;
pub mod tuple;

pub use chain::{ChainLayout, ChainWalk};
pub use element::{ElementPair, PayloadShape, Step};
pub use hash::{HashLayout, HashWalk};
pub use indexed::IndexedWalk;
pub use limits::WalkLimits;
pub use skiplist::{SkipListLayout, SkipListWalk};
pub use smart_ptr::{
    deleter_kind, inspect_smart_ptr, pointer_kind, read_counts, RefCountBlock, SmartPtrLayout,
    SmartPtrView,
};
pub use tree::{TreeLayout, TreeWalk};
pub use tuple::{TupleLayout, TupleWalk};
