//! メモリ上で完結する模擬ホスト
//!
//! 実際のデバッガの代わりに、オブジェクト・フィールド・メンバー関数の結果を
//! あらかじめ登録しておくホストです。一時的な割り込みや読めないフィールドを
//! 注入できるため、走査の打ち切りや劣化表示の検証に使います。

use crate::error::HostError;
use crate::host::{CallExpr, Host, PointerKind};
use crate::value::{ObjectHandle, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// gdbがターゲットへのシグナル配送時に返すメッセージ
const SIGNALED_MESSAGE: &str =
    "The program being debugged was signaled while in a function called from GDB.";

/// 模擬メンバー関数の振る舞い
#[derive(Debug, Clone)]
pub enum SimOp {
    /// 固定値を返す
    Return(Value),
    /// 第1引数を添字として要素を返す（`operator[]`、`get` 等）
    Index(Vec<Value>),
    /// 常に失敗する
    Fail(String),
}

/// 模擬オブジェクト
#[derive(Debug, Clone, Default)]
pub struct SimObject {
    pub type_name: String,
    fields: BTreeMap<String, Value>,
    broken_fields: HashMap<String, String>,
    ops: HashMap<String, SimOp>,
}

impl SimObject {
    /// 新しい模擬オブジェクトを作成する
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// データメンバーを追加する
    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// 読み取ると失敗するデータメンバーを追加する
    pub fn broken_field(mut self, name: &str, message: &str) -> Self {
        self.broken_fields.insert(name.to_string(), message.to_string());
        self
    }

    /// メンバー関数を追加する
    pub fn op(mut self, name: &str, op: SimOp) -> Self {
        self.ops.insert(name.to_string(), op);
        self
    }

    /// データメンバーを書き換える（テストで構造を壊すのに使う）
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// メンバー関数を差し替える
    pub fn set_op(&mut self, name: &str, op: SimOp) {
        self.ops.insert(name.to_string(), op);
    }
}

/// 模擬ホスト
#[derive(Debug)]
pub struct SimHost {
    objects: HashMap<u64, SimObject>,
    parameters: HashMap<String, bool>,
    pointer_kinds: HashMap<String, PointerKind>,
    interrupts: RefCell<HashMap<(u64, String), u32>>,
    failures: HashMap<(u64, String, Vec<String>), String>,
    calls: Cell<usize>,
    next_address: u64,
}

impl SimHost {
    /// 割り当ての開始アドレス
    const BASE_ADDRESS: u64 = 0x5555_0000_1000;
    /// 割り当ての間隔
    const STRIDE: u64 = 0x40;

    /// 空の模擬ホストを作成する
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            parameters: HashMap::new(),
            pointer_kinds: HashMap::new(),
            interrupts: RefCell::new(HashMap::new()),
            failures: HashMap::new(),
            calls: Cell::new(0),
            next_address: Self::BASE_ADDRESS,
        }
    }

    /// 指定アドレスにオブジェクトを置く
    pub fn insert(&mut self, address: u64, object: SimObject) -> ObjectHandle {
        let handle = ObjectHandle::new(address, object.type_name.clone());
        self.objects.insert(address, object);
        handle
    }

    /// 次の空きアドレスにオブジェクトを置く
    pub fn alloc(&mut self, object: SimObject) -> ObjectHandle {
        let address = self.reserve();
        self.insert(address, object)
    }

    /// オブジェクトを置かずにアドレスだけ確保する（相互参照するノードの構築用）
    pub fn reserve(&mut self) -> u64 {
        let address = self.next_address;
        self.next_address += Self::STRIDE;
        address
    }

    /// オブジェクトを可変参照で取得する
    pub fn object_mut(&mut self, address: u64) -> Option<&mut SimObject> {
        self.objects.get_mut(&address)
    }

    /// アドレスのオブジェクトのハンドルを取得する
    pub fn handle(&self, address: u64) -> Option<ObjectHandle> {
        self.objects
            .get(&address)
            .map(|obj| ObjectHandle::new(address, obj.type_name.clone()))
    }

    /// 表示設定を設定する
    pub fn set_parameter(&mut self, name: &str, value: bool) {
        self.parameters.insert(name.to_string(), value);
    }

    /// 型システムが知るスマートポインタの種類を登録する
    pub fn set_pointer_kind(&mut self, type_name: &str, kind: PointerKind) {
        self.pointer_kinds.insert(type_name.to_string(), kind);
    }

    /// 指定したメンバー関数の評価を `times` 回だけ中断させる
    pub fn interrupt(&mut self, address: u64, operation: &str, times: u32) {
        self.interrupts
            .borrow_mut()
            .insert((address, operation.to_string()), times);
    }

    /// 指定した引数での呼び出しだけを常に失敗させる
    pub fn fail_call(&mut self, address: u64, operation: &str, args: &[&str], message: &str) {
        let args = args.iter().map(|a| a.to_string()).collect();
        self.failures
            .insert((address, operation.to_string(), args), message.to_string());
    }

    /// これまでに評価された呼び出し式の数
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    fn lookup(&self, address: Option<u64>) -> Result<&SimObject, HostError> {
        match address {
            None | Some(0) => Err(HostError::NotAddressable),
            Some(addr) => self.objects.get(&addr).ok_or_else(|| {
                HostError::Failed(format!("Cannot access memory at address 0x{:x}", addr))
            }),
        }
    }

    fn take_interrupt(&self, address: u64, operation: &str) -> bool {
        let mut interrupts = self.interrupts.borrow_mut();
        match interrupts.get_mut(&(address, operation.to_string())) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for SimHost {
    fn read_field(&self, object: &ObjectHandle, field: &str) -> Result<Value, HostError> {
        let obj = self.lookup(object.address)?;

        if let Some(message) = obj.broken_fields.get(field) {
            return Err(HostError::Failed(message.clone()));
        }

        obj.fields
            .get(field)
            .cloned()
            .ok_or_else(|| HostError::Failed(format!("There is no member named {}.", field)))
    }

    fn evaluate(&self, expr: &CallExpr) -> Result<Value, HostError> {
        self.calls.set(self.calls.get() + 1);

        if self.take_interrupt(expr.address, &expr.operation) {
            return Err(HostError::Interrupted(SIGNALED_MESSAGE.to_string()));
        }

        let key = (expr.address, expr.operation.clone(), expr.args.clone());
        if let Some(message) = self.failures.get(&key) {
            return Err(HostError::Failed(message.clone()));
        }

        let obj = self.lookup(Some(expr.address))?;
        let op = obj.ops.get(&expr.operation).ok_or_else(|| {
            HostError::Failed(format!(
                "Couldn't find method {}::{}",
                obj.type_name, expr.operation
            ))
        })?;

        match op {
            SimOp::Return(value) => Ok(value.clone()),
            SimOp::Index(values) => {
                let index = expr
                    .args
                    .first()
                    .and_then(|arg| arg.trim().parse::<usize>().ok())
                    .ok_or_else(|| HostError::Failed(format!("invalid index in {}", expr)))?;
                values.get(index).cloned().ok_or_else(|| {
                    HostError::Failed(format!("index {} out of range ({})", index, values.len()))
                })
            }
            SimOp::Fail(message) => Err(HostError::Failed(message.clone())),
        }
    }

    fn parameter(&self, name: &str) -> Option<bool> {
        self.parameters.get(name).copied()
    }

    fn pointer_kind(&self, type_name: &str) -> Option<PointerKind> {
        self.pointer_kinds.get(type_name).copied()
    }
}
