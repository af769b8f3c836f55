//! アドレスと識別子のユーティリティ

use crate::value::Value;

/// 整数の既定幅（バイト）
pub const DEFAULT_WIDTH: usize = 8;

/// スマートポインタの参照カウンタの幅（バイト）
pub const COUNTER_WIDTH: usize = 4;

/// 値の安定した数値アドレスを取得する
///
/// オブジェクトならその先頭アドレス、ポインタなら指す先のアドレス。
pub fn address_of(value: &Value) -> Option<u64> {
    match value {
        Value::Object(handle) => handle.address,
        Value::Pointer { address, .. } => Some(*address),
        _ => None,
    }
}

/// 符号付きで読まれた生の値を、指定バイト幅の符号なし整数として解釈し直す
///
/// 幅の狭いフィールドを広い符号付き表現で読むと符号拡張されるため、
/// `2^(8*width) - 1` のマスクで元のビットパターンに戻します。
pub fn mask_to_width<T: Into<i128>>(raw: T, width_bytes: usize) -> u64 {
    let bits = (width_bytes.min(DEFAULT_WIDTH) * 8) as u32;
    let mask: i128 = (1i128 << bits) - 1;
    (raw.into() & mask) as u64
}

/// 値を指定幅でマスクした整数として取り出す
pub fn masked_value(value: &Value, width_bytes: usize) -> Option<u64> {
    value.as_i128().map(|raw| mask_to_width(raw, width_bytes))
}

/// アドレスを `@0x...` 形式でフォーマットする
pub fn format_address(address: u64) -> String {
    format!("@0x{:x}", address)
}

/// ハンドルのアドレスをフォーマットする（nullやアドレスなしは `nullptr`）
pub fn format_handle_address(address: Option<u64>) -> String {
    match address {
        Some(addr) if addr != 0 => format_address(addr),
        _ => "nullptr".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectHandle;

    #[test]
    fn test_mask_to_width() {
        assert_eq!(mask_to_width(-1i64, 4), 0xFFFF_FFFF);
        assert_eq!(mask_to_width(-1i64, 4), 4294967295);
        assert_eq!(mask_to_width(5i64, 4), 5);
        assert_eq!(mask_to_width(-1i64, DEFAULT_WIDTH), u64::MAX);
        assert_eq!(mask_to_width(0x1_0000_0002u64, 4), 2);
        assert_eq!(mask_to_width(-2i64, 1), 0xFE);
    }

    #[test]
    fn test_masked_value() {
        assert_eq!(masked_value(&Value::Int(-1), COUNTER_WIDTH), Some(0xFFFF_FFFF));
        assert_eq!(masked_value(&Value::Uint(7), COUNTER_WIDTH), Some(7));
        assert_eq!(masked_value(&Value::Str("7".into()), COUNTER_WIDTH), None);
    }

    #[test]
    fn test_address_of() {
        assert_eq!(address_of(&Value::object(0x20, "original::couple<int, int>")), Some(0x20));
        assert_eq!(address_of(&Value::pointer(0x30, "int")), Some(0x30));
        assert_eq!(
            address_of(&Value::Object(ObjectHandle::unaddressable("original::couple<int, int>"))),
            None
        );
        assert_eq!(address_of(&Value::Int(3)), None);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x7ffd_1234), "@0x7ffd1234");
        assert_eq!(format_handle_address(Some(0x10)), "@0x10");
        assert_eq!(format_handle_address(Some(0)), "nullptr");
        assert_eq!(format_handle_address(None), "nullptr");
    }
}
