//! JavaScript execution methods.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::protocol::{Command, RuntimeCommand};

use super::Tab;

// ============================================================================
// Tab - Script Execution
// ============================================================================

impl Tab {
    /// Evaluates an expression in the page and returns its value.
    ///
    /// Promises are awaited. `undefined` comes back as `Value::Null`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let title = tab.evaluate("document.title").await?;
    /// ```
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        debug!(session_id = %self.inner.session_id, script_len = expression.len(), "Evaluating script");

        let command = Command::Runtime(RuntimeCommand::Evaluate {
            expression: expression.to_string(),
            return_by_value: true,
            await_promise: true,
            user_gesture: true,
        });

        let result = self.send_command(command).await?;
        check_exception(&result)?;

        Ok(remote_value(&result))
    }

    /// Evaluates an expression and returns a handle to the resulting object.
    ///
    /// Returns `None` when the expression yields `null` or `undefined`.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<Option<ObjectId>> {
        let command = Command::Runtime(RuntimeCommand::Evaluate {
            expression: expression.to_string(),
            return_by_value: false,
            await_promise: true,
            user_gesture: false,
        });

        let result = self.send_command(command).await?;
        check_exception(&result)?;

        Ok(result
            .get("result")
            .and_then(|r| r.get("objectId"))
            .and_then(Value::as_str)
            .map(ObjectId::new))
    }

    /// Calls `function_declaration` with `this` bound to `object_id`.
    ///
    /// `args` are passed by value.
    pub async fn call_function_on(
        &self,
        object_id: &ObjectId,
        function_declaration: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        trace!(%object_id, "Calling function on object");

        let command = Command::Runtime(RuntimeCommand::CallFunctionOn {
            function_declaration: function_declaration.to_string(),
            object_id: object_id.clone(),
            arguments: args
                .into_iter()
                .map(|value| serde_json::json!({ "value": value }))
                .collect(),
            return_by_value: true,
            await_promise: true,
        });

        let result = self.send_command(command).await?;
        check_exception(&result)?;

        Ok(remote_value(&result))
    }

    /// Releases a remote object handle.
    pub async fn release_object(&self, object_id: &ObjectId) -> Result<()> {
        let command = Command::Runtime(RuntimeCommand::ReleaseObject {
            object_id: object_id.clone(),
        });
        self.send_command(command).await?;
        Ok(())
    }

    /// Polls `expression` until it evaluates truthy.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if it is still falsy after `timeout`
    pub async fn wait_for_truthy(
        &self,
        expression: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if is_truthy(&self.evaluate(expression).await?) {
                debug!(attempts, elapsed_ms = started.elapsed().as_millis() as u64, "Condition met");
                return Ok(());
            }

            if started.elapsed() >= timeout {
                return Err(Error::timeout(
                    format!("wait_for_truthy({expression})"),
                    timeout.as_millis() as u64,
                ));
            }

            tokio::time::sleep(interval).await;
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns the `result.value` of an evaluation response.
fn remote_value(result: &Value) -> Value {
    result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Converts `exceptionDetails` into [`Error::Script`].
fn check_exception(result: &Value) -> Result<()> {
    let Some(details) = result.get("exceptionDetails") else {
        return Ok(());
    };

    let message = details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("unknown exception");

    Err(Error::script(message))
}

/// JavaScript truthiness of a by-value result.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_remote_value() {
        let result = json!({"result": {"type": "string", "value": "Lecture"}});
        assert_eq!(remote_value(&result), json!("Lecture"));

        let undefined = json!({"result": {"type": "undefined"}});
        assert_eq!(remote_value(&undefined), Value::Null);
    }

    #[test]
    fn test_check_exception_uses_description() {
        let result = json!({
            "result": {"type": "object", "subtype": "error"},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "TypeError: x is undefined"}
            }
        });
        let err = check_exception(&result).unwrap_err();
        assert_eq!(err.to_string(), "Script error: TypeError: x is undefined");
    }

    #[test]
    fn test_check_exception_passes_clean_result() {
        assert!(check_exception(&json!({"result": {"type": "number", "value": 1}})).is_ok());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(3)));
        assert!(is_truthy(&json!("ready")));
        assert!(is_truthy(&json!({})));
    }
}
