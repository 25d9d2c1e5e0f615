//! `/render` and `/connect`: template rendering and expression evaluation
//!
//! Both run caller-controlled source through the same template environment.
//! Its globals carry the application config, secret key included.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use minijinja::{context, Environment, Value};
use serde::Serialize;

use crate::config::{AppState, Config};
use crate::error::AppError;
use crate::http;

/// Config values exposed to templates as `config`
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct TemplateConfig {
    secret_key: String,
    debug: bool,
    db_host: String,
    db_user: String,
    db_password: String,
    upload_folder: String,
}

impl TemplateConfig {
    fn from_config(config: &Config) -> Self {
        Self {
            secret_key: config.server.secret_key.clone(),
            debug: config.server.debug,
            db_host: config.database.host.clone(),
            db_user: config.database.user.clone(),
            db_password: config.database.password.clone(),
            upload_folder: config.upload.dir.clone(),
        }
    }
}

/// Build the shared environment: `config` global plus the `connect_to` function
pub fn build_environment(config: &Config) -> Environment<'static> {
    let mut env = Environment::new();
    env.add_global(
        "config",
        Value::from_serialize(TemplateConfig::from_config(config)),
    );

    let db_user = config.database.user.clone();
    env.add_function("connect_to", move |host: String| -> String {
        format!("connected to {host} as {db_user}")
    });
    env
}

/// Render template source supplied by the caller
pub fn render_template(env: &Environment<'static>, source: &str) -> Result<String, AppError> {
    Ok(env.render_str(source, context! {})?)
}

/// Evaluate `connect_to('<host>')` with the host pasted into the expression
pub fn connect_db(env: &Environment<'static>, host: &str) -> Result<String, AppError> {
    let expression = format!("connect_to('{host}')");
    render_template(env, &format!("{{{{ {expression} }}}}"))
}

pub fn render(state: &AppState, source: &str) -> Result<Response<Full<Bytes>>, AppError> {
    let output = render_template(&state.templates, source)?;
    Ok(http::build_ok_response(
        output,
        &state.config.http.default_content_type,
    ))
}

pub fn connect(state: &AppState, host: &str) -> Result<Response<Full<Bytes>>, AppError> {
    let output = connect_db(&state.templates, host)?;
    Ok(http::build_ok_response(
        output,
        &state.config.http.default_content_type,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SECRET_KEY;

    fn env() -> Environment<'static> {
        let config = Config::load_from("does/not/exist/config").unwrap();
        build_environment(&config)
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(render_template(&env(), "Hello World").unwrap(), "Hello World");
    }

    #[test]
    fn test_expression_is_evaluated() {
        assert_eq!(render_template(&env(), "{{ 7*7 }}").unwrap(), "49");
    }

    #[test]
    fn test_config_leaks_secret() {
        assert_eq!(
            render_template(&env(), "{{ config.SECRET_KEY }}").unwrap(),
            SECRET_KEY
        );
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            render_template(&env(), "{{ 7*"),
            Err(AppError::Template(_))
        ));
    }

    #[test]
    fn test_connect_db() {
        assert_eq!(
            connect_db(&env(), "localhost").unwrap(),
            "connected to localhost as admin"
        );
    }

    #[test]
    fn test_connect_db_evaluates_injected_code() {
        let out = connect_db(&env(), "x') ~ config.SECRET_KEY ~ ('").unwrap();
        assert_eq!(out, format!("connected to x as admin{SECRET_KEY}"));

        let out = connect_db(&env(), "db') ~ (6*7) ~ ('").unwrap();
        assert_eq!(out, "connected to db as admin42");
    }
}
