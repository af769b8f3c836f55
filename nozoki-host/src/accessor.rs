//! リモートアクセサ
//!
//! ハンドルの指すオブジェクトに対してメンバー関数をターゲット内で呼び出し、結果を返します。
//! ターゲットが評価中にシグナルを受けた場合などの一時的な失敗だけを、上限回数まで再試行します。

use crate::error::{HostError, RemoteEvalError};
use crate::host::{CallExpr, Host};
use crate::value::{ObjectHandle, Value};
use tracing::{debug, warn};

/// 評価の再試行回数の既定値
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// アクセサ設定
#[derive(Debug, Clone)]
pub struct AccessorConfig {
    /// 一時的な失敗に対する最大試行回数（1以上として扱う）
    pub max_attempts: u32,
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// リモートアクセサ
///
/// 呼び出し側は const なメンバー関数だけを呼ぶこと。評価そのものはターゲット内で
/// 任意のコードを実行するため、アクセサは状態変更を防げません。
pub struct RemoteAccessor<'h> {
    host: &'h dyn Host,
    config: AccessorConfig,
}

impl<'h> RemoteAccessor<'h> {
    /// 既定設定でアクセサを作成する
    pub fn new(host: &'h dyn Host) -> Self {
        Self::with_config(host, AccessorConfig::default())
    }

    /// 設定を指定してアクセサを作成する
    pub fn with_config(host: &'h dyn Host, config: AccessorConfig) -> Self {
        Self { host, config }
    }

    /// 背後のホストを取得する
    pub fn host(&self) -> &'h dyn Host {
        self.host
    }

    /// メンバー関数を呼び出す
    pub fn invoke(
        &self,
        handle: &ObjectHandle,
        operation: &str,
        args: &[&str],
    ) -> Result<Value, RemoteEvalError> {
        let address = match handle.address {
            Some(addr) if addr != 0 => addr,
            _ => return Err(RemoteEvalError::NullHandle),
        };

        let expr = CallExpr::new(&handle.type_name, address, operation, args);
        let attempts = self.config.max_attempts.max(1);
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            match self.host.evaluate(&expr) {
                Ok(value) => return Ok(value),
                Err(HostError::Interrupted(message)) => {
                    debug!(expr = %expr, attempt, "evaluation interrupted, retrying");
                    last_message = message;
                }
                Err(HostError::NotAddressable) => return Err(RemoteEvalError::NullHandle),
                Err(HostError::Failed(message)) => {
                    debug!(expr = %expr, %message, "evaluation failed");
                    return Err(RemoteEvalError::EvaluationFailed(message));
                }
            }
        }

        warn!(expr = %expr, attempts, "giving up after repeated interruptions");
        Err(RemoteEvalError::TransientFault(last_message))
    }

    /// メンバー関数を呼び出し、失敗時は値なしを返す
    pub fn invoke_or_absent(
        &self,
        handle: &ObjectHandle,
        operation: &str,
        args: &[&str],
    ) -> Option<Value> {
        self.invoke(handle, operation, args).ok()
    }

    /// 整数を返すメンバー関数（`size` 等）を呼び出す
    pub fn invoke_u64(
        &self,
        handle: &ObjectHandle,
        operation: &str,
        args: &[&str],
    ) -> Result<u64, RemoteEvalError> {
        let value = self.invoke(handle, operation, args)?;
        value.as_u64().ok_or_else(|| {
            RemoteEvalError::EvaluationFailed(format!(
                "{}() returned a non-integer value: {}",
                operation, value
            ))
        })
    }

    /// データメンバーを読み取る
    ///
    /// フィールド読み取りはターゲットのコードを実行しないため再試行しません。
    pub fn field(&self, handle: &ObjectHandle, name: &str) -> Result<Value, RemoteEvalError> {
        if handle.is_null() {
            return Err(RemoteEvalError::NullHandle);
        }

        self.host.read_field(handle, name).map_err(|e| match e {
            HostError::NotAddressable => RemoteEvalError::NullHandle,
            HostError::Interrupted(message) => RemoteEvalError::TransientFault(message),
            HostError::Failed(message) => RemoteEvalError::EvaluationFailed(message),
        })
    }

    /// ポインタ値（または参照として返された集約値）をハンドルに変換する
    pub fn deref(&self, pointer: &Value) -> Result<ObjectHandle, RemoteEvalError> {
        match pointer {
            Value::Pointer { address: 0, .. } => Err(RemoteEvalError::NullHandle),
            Value::Pointer { address, pointee } => Ok(ObjectHandle::new(*address, pointee.clone())),
            Value::Object(handle) if !handle.is_null() => Ok(handle.clone()),
            Value::Object(_) => Err(RemoteEvalError::NullHandle),
            other => Err(RemoteEvalError::EvaluationFailed(format!(
                "attempt to take contents of a non-pointer value: {}",
                other
            ))),
        }
    }

    /// ホストの表示設定を問い合わせる
    pub fn parameter(&self, name: &str) -> Option<bool> {
        self.host.parameter(name)
    }
}
