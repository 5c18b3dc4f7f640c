use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub static_path: String,
    pub studio_name: String,
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let static_path = env::var("DAZZLING_STATIC_PATH").unwrap_or("./web".to_string());
        let studio_name =
            env::var("DAZZLING_STUDIO_NAME").unwrap_or_else(|_| "DAZZLING STUDIO".to_string());
        let openai_api_hostname = env::var("DAZZLING_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        // A missing key isn't fatal here. The upstream rejects the
        // request and the caller gets the usual error response.
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("DAZZLING_LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Self {
            static_path,
            studio_name,
            openai_model,
            openai_api_hostname,
            openai_api_key,
        }
    }
}
