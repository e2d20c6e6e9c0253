use time::OffsetDateTime;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn utc_to_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn current_millis() -> i64 {
    utc_to_millis(OffsetDateTime::now_utc())
}

pub fn current_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
