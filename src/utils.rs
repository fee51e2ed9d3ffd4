use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 当前 Unix 时间（秒，带小数）
pub fn current_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Unix 秒转成可读时间
pub fn format_timestamp(ts: f64) -> String {
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{ts}"))
}

/// 生成一个随机唯一 ID
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch() {
        assert_eq!(format_timestamp(0.0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(86_400.5), "1970-01-02 00:00:00 UTC");
    }
}
