use std::str::FromStr;

pub fn env_var_truthy(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.to_ascii_lowercase();
            v == "1" || v == "true" || v == "yes" || v == "on"
        }
        Err(_) => false,
    }
}

/// Parsed value of `name`, or `None` when unset or unparsable.
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable name; the process environment is shared across test threads.
    #[test]
    fn truthy_values() {
        std::env::set_var("UNIQSET_TEST_TRUTHY", "Yes");
        assert!(env_var_truthy("UNIQSET_TEST_TRUTHY"));
        std::env::set_var("UNIQSET_TEST_TRUTHY", "0");
        assert!(!env_var_truthy("UNIQSET_TEST_TRUTHY"));
        assert!(!env_var_truthy("UNIQSET_TEST_UNSET_TRUTHY"));
    }

    #[test]
    fn parse_ignores_garbage() {
        std::env::set_var("UNIQSET_TEST_PARSE", " 8 ");
        assert_eq!(env_parse::<usize>("UNIQSET_TEST_PARSE"), Some(8));
        std::env::set_var("UNIQSET_TEST_PARSE", "eight");
        assert_eq!(env_parse::<usize>("UNIQSET_TEST_PARSE"), None);
    }
}
