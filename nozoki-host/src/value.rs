//! 検査対象プロセス内の値

use std::fmt;

/// 検査対象プロセス内の生きた集約オブジェクトへの参照
///
/// アドレスと静的型名だけを持ちます。所有権はなく、読み取りはすべて
/// [`RemoteAccessor`](crate::RemoteAccessor) を経由します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    /// オブジェクトのアドレス（アドレスを持たない値はNone）
    pub address: Option<u64>,
    /// 静的型名（例: `original::chain<int>`）
    pub type_name: String,
}

impl ObjectHandle {
    /// アドレス付きのハンドルを作成する
    pub fn new(address: u64, type_name: impl Into<String>) -> Self {
        Self {
            address: Some(address),
            type_name: type_name.into(),
        }
    }

    /// アドレスを持たないハンドルを作成する（レジスタ上の一時値など）
    pub fn unaddressable(type_name: impl Into<String>) -> Self {
        Self {
            address: None,
            type_name: type_name.into(),
        }
    }

    /// 有効なアドレスを持たないか
    pub fn is_null(&self) -> bool {
        matches!(self.address, None | Some(0))
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.address {
            Some(addr) => write!(f, "{{{} @0x{:x}}}", self.type_name, addr),
            None => write!(f, "{{{}}}", self.type_name),
        }
    }
}

/// ホストが返す値
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 符号付き整数（ホストの生の読み取り結果）
    Int(i64),
    /// 符号なし整数
    Uint(u64),
    /// 真偽値
    Bool(bool),
    /// 文字
    Char(char),
    /// 文字列
    Str(String),
    /// 型付きポインタ（アドレス0はnull）
    Pointer { address: u64, pointee: String },
    /// 集約オブジェクト（構造体・クラス）
    Object(ObjectHandle),
    /// 利用不可
    Unavailable,
}

impl Value {
    /// ポインタ値を作成する
    pub fn pointer(address: u64, pointee: impl Into<String>) -> Self {
        Value::Pointer {
            address,
            pointee: pointee.into(),
        }
    }

    /// nullポインタを作成する
    pub fn null(pointee: impl Into<String>) -> Self {
        Self::pointer(0, pointee)
    }

    /// オブジェクト値を作成する
    pub fn object(address: u64, type_name: impl Into<String>) -> Self {
        Value::Object(ObjectHandle::new(address, type_name))
    }

    /// nullポインタかどうか
    pub fn is_null_pointer(&self) -> bool {
        matches!(self, Value::Pointer { address: 0, .. })
    }

    /// 整数として解釈する（符号付きの値はビットパターンをそのまま使う）
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => Some(*v as u64),
            Value::Uint(v) => Some(*v),
            Value::Bool(b) => Some(u64::from(*b)),
            Value::Char(c) => Some(u64::from(*c)),
            Value::Pointer { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// 符号を保ったまま整数として取り出す
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(i128::from(*v)),
            Value::Uint(v) => Some(i128::from(*v)),
            Value::Bool(b) => Some(i128::from(*b)),
            Value::Char(c) => Some(i128::from(u32::from(*c))),
            Value::Pointer { address, .. } => Some(i128::from(*address)),
            _ => None,
        }
    }

    /// 真偽値として解釈する（C++の暗黙変換に合わせ、0以外は真）
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            other => other.as_u64().map(|v| v != 0),
        }
    }

    /// オブジェクトまたは非nullポインタの参照先ハンドルを取り出す
    pub fn as_handle(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(handle) => Some(handle.clone()),
            Value::Pointer { address, pointee } if *address != 0 => {
                Some(ObjectHandle::new(*address, pointee.clone()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Pointer { address, .. } => write!(f, "0x{:x}", address),
            Value::Object(handle) => write!(f, "{}", handle),
            Value::Unavailable => write!(f, "<unavailable>"),
        }
    }
}
