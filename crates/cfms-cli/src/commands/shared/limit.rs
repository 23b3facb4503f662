/// The `--limit` flag, else the configured default. Zero means the default too.
#[must_use]
pub fn effective_limit(flag: Option<u32>, configured: u32) -> u32 {
    flag.filter(|limit| *limit > 0).unwrap_or(configured)
}

#[cfg(test)]
mod tests {
    use super::effective_limit;

    #[test]
    fn flag_wins_over_config() {
        assert_eq!(effective_limit(Some(5), 20), 5);
    }

    #[test]
    fn missing_or_zero_flag_uses_config() {
        assert_eq!(effective_limit(None, 20), 20);
        assert_eq!(effective_limit(Some(0), 20), 20);
    }
}
