//! Gateway utility functions.

/// Expand `${VAR}` patterns in a string with environment variable values.
///
/// Unknown variables are replaced with an empty string. A `$` that does not
/// open a `${...}` group is copied through.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }

        chars.next();
        let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
        match std::env::var(&name) {
            Ok(value) => result.push_str(&value),
            Err(_) => tracing::debug!("environment variable {name} is not set"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::expand_env_vars;

    #[test]
    fn unknown_variables_expand_to_empty() {
        assert_eq!(
            expand_env_vars("key = \"${DATAAGENT_SURELY_UNSET_VAR}\""),
            "key = \"\""
        );
    }

    #[test]
    fn plain_dollar_is_kept() {
        assert_eq!(expand_env_vars("cost = \"$5\""), "cost = \"$5\"");
    }

    #[test]
    fn known_variable_is_substituted() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars("${PATH}"), path);
    }
}
