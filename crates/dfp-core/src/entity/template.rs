use minijinja::{Environment, context};
use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;

/// A Jinja-style template applied to a raw attribute before it is stored.
///
/// The raw attribute is bound as `value`. Rendering failures fall back to
/// the raw attribute.
#[derive(Debug, Clone)]
pub struct ValueTemplate {
    env: Environment<'static>,
    source: String,
}

impl ValueTemplate {
    /// Compile-check `source`; syntax errors surface here, not at render time.
    pub fn new(source: &str) -> Result<Self, CoreError> {
        let check = Environment::new();
        if let Err(e) = check.template_from_str(source) {
            return Err(CoreError::Config {
                message: format!("invalid value template: {e}"),
            });
        }
        Ok(Self {
            env: Environment::new(),
            source: source.to_owned(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against `value`, returning the rendered text as a string value.
    pub fn render(&self, value: &Value) -> Value {
        match self.env.render_str(&self.source, context! { value => value }) {
            Ok(rendered) => Value::String(rendered),
            Err(e) => {
                warn!(
                    template = %self.source,
                    error = %e,
                    "value template failed, using raw value"
                );
                value.clone()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn renders_with_value_bound() {
        let template = ValueTemplate::new("{{ value * 2 }}").unwrap();
        assert_eq!(template.render(&json!(21)), json!("42"));

        let template = ValueTemplate::new("{{ value | upper }}").unwrap();
        assert_eq!(template.render(&json!("on")), json!("ON"));
    }

    #[test]
    fn render_error_falls_back_to_raw_value() {
        let template = ValueTemplate::new("{{ value + 'x' }}").unwrap();
        assert_eq!(template.render(&json!(7)), json!(7));
    }

    #[test]
    fn syntax_error_is_a_config_error() {
        let err = ValueTemplate::new("{{ value ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
