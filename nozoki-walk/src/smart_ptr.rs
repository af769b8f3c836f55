//! スマートポインタと参照カウント制御ブロックの検査
//!
//! 走査ではなく1回きりの参照解決です。生ポインタを読み、非nullなら単一オブジェクトは
//! 参照先を、配列版はアドレスだけを報告します。制御ブロックの強参照・弱参照カウンタは
//! 別途読み取り、4バイト幅の符号なし整数として解釈し直します。

use nozoki_host::address::{masked_value, COUNTER_WIDTH};
use nozoki_host::{Host, ObjectHandle, PointerKind, RemoteAccessor, RemoteEvalError};

/// スマートポインタのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartPtrLayout {
    /// 生ポインタを返すメンバー関数
    pub get: &'static str,
    /// 制御ブロックを保持するフィールド
    pub ref_count: &'static str,
    /// アトミック値を読み出すメンバー関数
    pub load: &'static str,
    pub strong: &'static str,
    pub weak: &'static str,
    /// カウンタのバイト幅
    pub counter_width: usize,
}

impl SmartPtrLayout {
    /// `original::autoPtr` 系のレイアウト
    pub const DEFAULT: SmartPtrLayout = SmartPtrLayout {
        get: "get",
        ref_count: "ref_count",
        load: "operator*",
        strong: "strong_refs",
        weak: "weak_refs",
        counter_width: COUNTER_WIDTH,
    };
}

impl Default for SmartPtrLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 制御ブロックのカウンタのスナップショット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCountBlock {
    pub strong: u64,
    pub weak: u64,
}

/// スマートポインタの検査結果
#[derive(Debug, Clone, PartialEq)]
pub struct SmartPtrView {
    /// 生ポインタ（nullならNone）
    pub pointer: Option<u64>,
    /// 配列版か
    pub kind: PointerKind,
    /// 単一オブジェクト版の参照先
    pub target: Option<ObjectHandle>,
    /// カウンタ（読めなければ診断）
    pub counts: Result<RefCountBlock, RemoteEvalError>,
}

impl SmartPtrView {
    pub fn is_null(&self) -> bool {
        self.pointer.is_none()
    }

    pub fn is_array(&self) -> bool {
        self.kind == PointerKind::Array
    }
}

/// 型名の文字列から削除子の種類を判定する
///
/// 2番目のテンプレート引数（削除子）が `[]>` で終わる場合に配列とみなします。
///
/// # Examples
/// ```
/// use nozoki_host::PointerKind;
/// use nozoki_walk::deleter_kind;
///
/// assert_eq!(
///     deleter_kind("original::ownerPtr<int, original::deleter<int []>>"),
///     PointerKind::Array
/// );
/// assert_eq!(
///     deleter_kind("original::ownerPtr<int, original::deleter<int>>"),
///     PointerKind::Scalar
/// );
/// ```
pub fn deleter_kind(type_name: &str) -> PointerKind {
    let inner = match (type_name.find('<'), type_name.rfind('>')) {
        (Some(start), Some(end)) if start < end => &type_name[start + 1..end],
        _ => return PointerKind::Scalar,
    };

    match template_args(inner).get(1) {
        Some(deleter) if deleter.ends_with("[]>") => PointerKind::Array,
        _ => PointerKind::Scalar,
    }
}

/// トップレベルのカンマでテンプレート引数を分割する（ネストした<>を考慮）
fn template_args(inner: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    args
}

/// スマートポインタの種類を判定する
///
/// ホストが型システムから判別できればそれを使い、できなければ型名の文字列検査に頼ります。
pub fn pointer_kind(host: &dyn Host, type_name: &str) -> PointerKind {
    host.pointer_kind(type_name)
        .unwrap_or_else(|| deleter_kind(type_name))
}

/// スマートポインタを検査する
///
/// 生ポインタが読めない場合だけ `Err` を返します。参照先やカウンタの失敗は結果に含めます。
pub fn inspect_smart_ptr(
    accessor: &RemoteAccessor<'_>,
    handle: &ObjectHandle,
    layout: &SmartPtrLayout,
) -> Result<SmartPtrView, RemoteEvalError> {
    let raw = accessor.invoke(handle, layout.get, &[])?;
    let pointer = raw.as_u64().filter(|addr| *addr != 0);
    let kind = pointer_kind(accessor.host(), &handle.type_name);

    let target = match (pointer, kind) {
        (Some(_), PointerKind::Scalar) => accessor.deref(&raw).ok(),
        _ => None,
    };

    Ok(SmartPtrView {
        pointer,
        kind,
        target,
        counts: read_counts(accessor, handle, layout),
    })
}

/// 制御ブロックのカウンタを読む
pub fn read_counts(
    accessor: &RemoteAccessor<'_>,
    handle: &ObjectHandle,
    layout: &SmartPtrLayout,
) -> Result<RefCountBlock, RemoteEvalError> {
    let holder = accessor.field(handle, layout.ref_count)?;
    let holder = accessor.deref(&holder)?;
    let loaded = accessor.invoke(&holder, layout.load, &[])?;
    let block = accessor.deref(&loaded)?;

    let counter = |name: &str| -> Result<u64, RemoteEvalError> {
        let atomic = accessor.field(&block, name)?;
        let atomic = accessor.deref(&atomic)?;
        let raw = accessor.invoke(&atomic, layout.load, &[])?;
        masked_value(&raw, layout.counter_width).ok_or_else(|| {
            RemoteEvalError::EvaluationFailed(format!("{} is not an integer: {}", name, raw))
        })
    };

    Ok(RefCountBlock {
        strong: counter(layout.strong)?,
        weak: counter(layout.weak)?,
    })
}
