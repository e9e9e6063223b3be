/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalized lookup key for pool names and values: trimmed, lower-cased.
///
/// Two spellings that differ only in case (or surrounding whitespace) map to
/// the same key, which is what the uniqueness constraints are declared on.
pub fn lookup_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
