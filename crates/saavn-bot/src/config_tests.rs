#[cfg(test)]
mod tests {
    use crate::config::*;

    #[test]
    fn test_default_limit_config() {
        let limits = LimitConfig::default();
        assert_eq!(limits.max_file_mb, 50);
        assert_eq!(limits.max_duration_secs, 900);
        assert_eq!(limits.download_timeout_secs, 60);
        assert_eq!(limits.inter_track_delay_ms, 500);
        assert_eq!(limits.max_file_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            channel_id = -1001234567890
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.channel_id, -1001234567890);
        assert_eq!(config.api.base_url, "https://saavn.sumit.co");
        assert_eq!(config.storage.temp_dir, "temp");
        assert_eq!(config.limits.max_duration_secs, 900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            channel_id = -100

            [api]
            base_url = "http://localhost:9999"

            [limits]
            max_file_mb = 10
            inter_track_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:9999");
        assert_eq!(config.limits.max_file_mb, 10);
        assert_eq!(config.limits.inter_track_delay_ms, 0);
        // Untouched sections keep their defaults.
        assert_eq!(config.limits.max_duration_secs, 900);
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = ""
            channel_id = -100
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
