//! Display helpers for catalog values.

/// `mm:ss`, both parts zero-padded to two digits.
pub fn duration(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Track position, zero-padded below 10.
pub fn rank(rank: u32) -> String {
    format!("{rank:02}")
}

const MILLION: u64 = 1_000_000;
const THOUSAND: u64 = 1_000;

/// Shorthand listener count: `"3m listeners"`, `"12k listeners"`, `"999 listeners"`.
///
/// A step applies only when the count is strictly above it, so exactly one
/// thousand is still `"1000 listeners"`.
pub fn listeners(count: u64) -> String {
    if count > MILLION {
        format!("{}m listeners", count / MILLION)
    } else if count > THOUSAND {
        format!("{}k listeners", count / THOUSAND)
    } else {
        format!("{count} listeners")
    }
}
