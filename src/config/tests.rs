// 配置系统测试

#[cfg(test)]
mod tests {
    use crate::config::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.security.session_ttl_days, 7);
        assert_eq!(config.security.session_cookie, "session");
        assert_eq!(config.storage.bucket, "ims-files");
        assert_eq!(config.storage.port, 9000);
        assert_eq!(config.storage.default_token_expiry_hours, 24);
        assert_eq!(config.storage.app_url, "http://localhost:3000");
        assert_eq!(config.vector_store.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config.server.port = 8080;
        config.database.min_connections = 50;
        assert!(config.validate().is_err());

        config.database.min_connections = 1;
        config.storage.bucket = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_secret_rejected_in_production() {
        let mut config = AppConfig::default();
        config.environment.name = "production".to_string();
        assert!(config.validate().is_err());

        config.security.jwt_secret = "a-real-production-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_methods() {
        let mut config = AppConfig::default();

        config.environment.name = "development".to_string();
        assert!(config.is_development());
        assert!(!config.is_production());

        config.environment.name = "production".to_string();
        assert!(config.is_production());
        assert!(!config.is_test());

        config.environment.name = "test".to_string();
        assert!(config.is_test());
    }

    #[test]
    fn test_storage_urls() {
        let mut storage = AppConfig::default().storage;
        assert_eq!(storage.storage_url(), "https://localhost:9000");

        storage.use_ssl = false;
        storage.endpoint = "minio".to_string();
        assert_eq!(storage.endpoint_url(), "http://minio:9000");

        storage.public_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(storage.storage_url(), "https://cdn.example.com");
        assert!(!storage.has_credentials());
    }

    #[test]
    fn test_config_validator_security() {
        let mut security = AppConfig::default().security;

        assert!(ConfigValidator::validate_security(&security, false).is_ok());

        security.bcrypt_cost = 50;
        assert!(ConfigValidator::validate_security(&security, false).is_err());

        security.bcrypt_cost = 10;
        security.session_ttl_days = 0;
        assert!(ConfigValidator::validate_security(&security, false).is_err());
    }

    #[test]
    fn test_config_validator_storage() {
        let mut storage = AppConfig::default().storage;
        assert!(ConfigValidator::validate_storage(&storage).is_ok());

        storage.app_url = "not a url".to_string();
        assert!(ConfigValidator::validate_storage(&storage).is_err());

        storage.app_url = "http://localhost:3000".to_string();
        storage.default_token_expiry_hours = 0;
        assert!(ConfigValidator::validate_storage(&storage).is_err());
    }

    #[test]
    fn test_config_validator_logging() {
        let mut logging = AppConfig::default().logging;
        assert!(ConfigValidator::validate_logging(&logging).is_ok());

        logging.level = "verbose".to_string();
        assert!(ConfigValidator::validate_logging(&logging).is_err());

        logging.level = "info".to_string();
        logging.file_enabled = true;
        assert!(ConfigValidator::validate_logging(&logging).is_err());
    }
}
