// 日志系统测试

#[cfg(test)]
mod tests {
    use crate::logging::{LoggingSetup, RequestContext};
    use tracing::Level;

    #[test]
    fn test_parse_level() {
        assert_eq!(LoggingSetup::parse_level("trace"), Level::TRACE);
        assert_eq!(LoggingSetup::parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(LoggingSetup::parse_level("warn"), Level::WARN);
        assert_eq!(LoggingSetup::parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_environment_presets() {
        let dev = LoggingSetup::development_config();
        assert_eq!(dev.format, "pretty");
        assert!(!dev.file_enabled);

        let prod = LoggingSetup::production_config();
        assert_eq!(prod.format, "json");
        assert!(prod.file_enabled);
        assert!(prod.file_path.is_some());

        let test = LoggingSetup::test_config();
        assert_eq!(test.level, "warn");

        let cli = LoggingSetup::cli_config(&prod);
        assert_eq!(cli.level, "info");
        assert!(!cli.file_enabled);
    }

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            LoggingSetup::split_log_path("./logs/orgdesk.log"),
            ("./logs".to_string(), "orgdesk.log".to_string())
        );
        assert_eq!(
            LoggingSetup::split_log_path("app.log"),
            (".".to_string(), "app.log".to_string())
        );
    }

    #[test]
    fn test_request_context_log_fields() {
        let context = RequestContext::new()
            .with_user_id("user-123")
            .with_organization_id("org-456");

        let fields = context.to_log_fields();

        assert!(fields.iter().any(|(k, _)| *k == "request_id"));
        assert!(fields.iter().any(|(k, v)| *k == "user_id" && v == "user-123"));
        assert!(fields.iter().any(|(k, v)| *k == "organization_id" && v == "org-456"));
        assert!(!fields.iter().any(|(k, _)| *k == "method"));
    }

    #[actix_web::test]
    async fn test_request_context_from_http_request() {
        let req = actix_web::test::TestRequest::get()
            .uri("/api/agents")
            .insert_header(("user-agent", "curl/8.0"))
            .to_http_request();

        let context = RequestContext::from_http_request(&req);
        assert_eq!(context.method.as_deref(), Some("GET"));
        assert_eq!(context.path.as_deref(), Some("/api/agents"));
        assert_eq!(context.user_agent.as_deref(), Some("curl/8.0"));
        assert!(!context.request_id.is_empty());
    }
}
