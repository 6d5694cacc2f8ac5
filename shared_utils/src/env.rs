use crate::config::ConfigError;

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Blank values are rejected as well: a `DATABASE_URL=` line in a shell profile
/// should fail the same way an unset variable does.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyEnvVar(name.to_string()));
    }
    Ok(value)
}

/// Optional variant of [`get_env_var`]: `None` when unset or blank.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    get_env_var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VAR: &str = "SHARED_UTILS_TEST_VAR";

    #[test]
    #[serial]
    fn missing_var_is_reported_by_name() {
        unsafe { std::env::remove_var(VAR) };
        assert_eq!(
            get_env_var(VAR),
            Err(ConfigError::MissingEnvVar(VAR.to_string()))
        );
        assert_eq!(get_env_var_opt(VAR), None);
    }

    #[test]
    #[serial]
    fn blank_var_is_rejected() {
        unsafe { std::env::set_var(VAR, "   ") };
        assert_eq!(get_env_var(VAR), Err(ConfigError::EmptyEnvVar(VAR.to_string())));
        assert_eq!(get_env_var_opt(VAR), None);
        unsafe { std::env::remove_var(VAR) };
    }

    #[test]
    #[serial]
    fn present_var_is_returned_verbatim() {
        unsafe { std::env::set_var(VAR, " sqlite://db.sqlite ") };
        assert_eq!(get_env_var(VAR).unwrap(), " sqlite://db.sqlite ");
        unsafe { std::env::remove_var(VAR) };
    }
}
