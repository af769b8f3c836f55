//! nozoki 表示アダプタ
//!
//! このクレートは、対象ライブラリのコンテナを人が読める形で表示するためのアダプタを提供します。
//! 型名のパターンでアダプタを選び、構造走査エンジンで要素を取り出し、
//! 要約文字列とラベル付きの子要素に整形します。

pub mod adapter;
pub mod catalogue;
pub mod config;
pub mod errors;
pub mod fixtures;
pub mod inspector;
pub mod registry;

pub use adapter::{
    AdapterSpec, Child, ChildValue, DisplayAdapter, DisplayHint, Entry, Internal, Rendered, Shape,
    Strategy, SummaryStyle, Visibility,
};
pub use config::DisplayConfig;
pub use inspector::Inspector;
pub use registry::{Binding, LoadError, LoadReport, Registry};
