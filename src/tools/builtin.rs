//! The four host-automation tools offered to the model.
//!
//! Each handler owns a typed argument struct and delegates to
//! [`HostControl`]; host faults propagate as [`ToolError::Host`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::host::HostControl;
use crate::inference::ToolDefinition;

use super::registry::ToolRegistry;
use super::types::{parse_arguments, ToolArguments, ToolError, ToolHandler, ToolResult};

pub const OPEN_APPLICATION: &str = "open_application";
pub const TAKE_SCREENSHOT: &str = "take_screenshot";
pub const GET_SYSTEM_INFO: &str = "get_system_info";
pub const EXECUTE_COMMAND: &str = "execute_command";

/// Registry with every built-in tool bound to `host`.
pub fn default_registry(host: Arc<dyn HostControl>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        open_application_definition(&host.application_names()),
        Arc::new(OpenApplication { host: host.clone() }),
    );
    registry.register(
        ToolDefinition::function(
            TAKE_SCREENSHOT,
            "Capture the current screen to inspect what is displayed",
            empty_parameters(),
        ),
        Arc::new(TakeScreenshot { host: host.clone() }),
    );
    registry.register(
        ToolDefinition::function(
            GET_SYSTEM_INFO,
            "Get system information: CPU usage, memory usage, disk space, process count and boot time",
            empty_parameters(),
        ),
        Arc::new(GetSystemInfo { host: host.clone() }),
    );
    registry.register(
        ToolDefinition::function(
            EXECUTE_COMMAND,
            "Run a system command (only whitelisted safe commands are allowed)",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command line to run"
                    }
                },
                "required": ["command"]
            }),
        ),
        Arc::new(ExecuteCommand { host }),
    );

    tracing::debug!(tools = ?registry.tool_names(), "built-in tools registered");
    registry
}

fn empty_parameters() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}

/// The `app_name` enum lists exactly the whitelisted keys.
fn open_application_definition(app_names: &[String]) -> ToolDefinition {
    ToolDefinition::function(
        OPEN_APPLICATION,
        "Open a desktop application such as a text editor, calculator, file manager or task manager",
        json!({
            "type": "object",
            "properties": {
                "app_name": {
                    "type": "string",
                    "description": "Application name",
                    "enum": app_names
                }
            },
            "required": ["app_name"]
        }),
    )
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OpenApplicationArgs {
    app_name: String,
}

struct OpenApplication {
    host: Arc<dyn HostControl>,
}

#[async_trait]
impl ToolHandler for OpenApplication {
    async fn call(&self, args: &ToolArguments) -> Result<ToolResult, ToolError> {
        let args: OpenApplicationArgs = parse_arguments(OPEN_APPLICATION, args, &["app_name"])?;
        tracing::info!(app = %args.app_name, "opening application");

        let report = self.host.launch_application(&args.app_name).await?;
        Ok(ToolResult::success(json!({
            "message": format!("Launched {}", report.application),
            "application": report.application,
            "command": report.command,
        })))
    }
}

struct TakeScreenshot {
    host: Arc<dyn HostControl>,
}

#[async_trait]
impl ToolHandler for TakeScreenshot {
    async fn call(&self, args: &ToolArguments) -> Result<ToolResult, ToolError> {
        parse_arguments::<ToolArguments>(TAKE_SCREENSHOT, args, &[])?;
        tracing::info!("taking screenshot");

        let shot = self.host.capture_screenshot().await?;
        let mut payload = serde_json::to_value(&shot)?;
        if let Value::Object(map) = &mut payload {
            map.insert("message".into(), json!("Screenshot captured"));
        }
        Ok(ToolResult::success(payload))
    }
}

struct GetSystemInfo {
    host: Arc<dyn HostControl>,
}

#[async_trait]
impl ToolHandler for GetSystemInfo {
    async fn call(&self, args: &ToolArguments) -> Result<ToolResult, ToolError> {
        parse_arguments::<ToolArguments>(GET_SYSTEM_INFO, args, &[])?;
        tracing::info!("collecting system info");

        let metrics = self.host.system_metrics().await?;
        Ok(ToolResult::success(serde_json::to_value(&metrics)?))
    }
}

#[derive(Deserialize)]
struct ExecuteCommandArgs {
    command: String,
}

struct ExecuteCommand {
    host: Arc<dyn HostControl>,
}

#[async_trait]
impl ToolHandler for ExecuteCommand {
    async fn call(&self, args: &ToolArguments) -> Result<ToolResult, ToolError> {
        let args: ExecuteCommandArgs = parse_arguments(EXECUTE_COMMAND, args, &["command"])?;
        tracing::info!(command = %args.command, "executing command");

        // A bare application name launches it, same as open_application
        if let Some(app) = self.host.resolve_application(&args.command) {
            let report = self.host.launch_application(&app).await?;
            return Ok(ToolResult::success(json!({
                "message": format!("Launched {}", report.application),
                "command": args.command,
            })));
        }

        let output = self.host.run_command(&args.command).await?;
        Ok(ToolResult::success(serde_json::to_value(&output)?))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CommandOutput, HostError, LaunchReport, Screenshot, SystemMetrics};
    use std::sync::Mutex;

    /// Records calls; never touches the OS.
    #[derive(Default)]
    struct FakeHost {
        launched: Mutex<Vec<String>>,
        commands: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HostControl for FakeHost {
        fn application_names(&self) -> Vec<String> {
            vec!["calc".into(), "notepad".into()]
        }

        fn resolve_application(&self, name: &str) -> Option<String> {
            match name.to_lowercase().as_str() {
                "calc" | "calculator" => Some("calc".into()),
                "notepad" => Some("notepad".into()),
                _ => None,
            }
        }

        async fn launch_application(&self, name: &str) -> Result<LaunchReport, HostError> {
            let app = self
                .resolve_application(name)
                .ok_or_else(|| HostError::UnknownApplication { name: name.into() })?;
            self.launched.lock().unwrap().push(app.clone());
            Ok(LaunchReport {
                command: format!("{app}.exe"),
                application: app,
            })
        }

        async fn run_command(&self, command: &str) -> Result<CommandOutput, HostError> {
            if !command.starts_with("echo") {
                return Err(HostError::CommandNotAllowed {
                    command: command.into(),
                });
            }
            self.commands.lock().unwrap().push(command.into());
            Ok(CommandOutput {
                command: command.into(),
                stdout: "hi\n".into(),
                stderr: String::new(),
                return_code: Some(0),
            })
        }

        async fn capture_screenshot(&self) -> Result<Screenshot, HostError> {
            Err(HostError::ScreenshotUnavailable)
        }

        async fn system_metrics(&self) -> Result<SystemMetrics, HostError> {
            Err(HostError::ControlDisabled)
        }
    }

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn registry() -> (Arc<FakeHost>, ToolRegistry) {
        let host = Arc::new(FakeHost::default());
        let registry = default_registry(host.clone());
        (host, registry)
    }

    async fn call(registry: &ToolRegistry, name: &str, a: Value) -> Result<ToolResult, ToolError> {
        registry.lookup(name).unwrap().handler.call(&args(a)).await
    }

    #[test]
    fn test_registry_has_four_tools() {
        let (_, registry) = registry();
        assert_eq!(
            registry.tool_names(),
            vec![OPEN_APPLICATION, TAKE_SCREENSHOT, GET_SYSTEM_INFO, EXECUTE_COMMAND]
        );
    }

    #[test]
    fn test_open_application_enum_lists_whitelisted_apps() {
        let (_, registry) = registry();
        let def = &registry.lookup(OPEN_APPLICATION).unwrap().definition;
        assert_eq!(
            def.function.parameters["properties"]["app_name"]["enum"],
            json!(["calc", "notepad"])
        );
    }

    #[tokio::test]
    async fn test_open_application_launches() {
        let (host, registry) = registry();
        let result = call(&registry, OPEN_APPLICATION, json!({"app_name": "Calculator"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.payload["application"], "calc");
        assert_eq!(*host.launched.lock().unwrap(), vec!["calc"]);
    }

    #[tokio::test]
    async fn test_open_application_missing_argument() {
        let (_, registry) = registry();
        let err = call(&registry, OPEN_APPLICATION, json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_execute_command_routes_app_names_to_launch() {
        let (host, registry) = registry();
        let result = call(&registry, EXECUTE_COMMAND, json!({"command": "notepad"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(*host.launched.lock().unwrap(), vec!["notepad"]);
        assert!(host.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_command_runs_whitelisted() {
        let (_, registry) = registry();
        let result = call(&registry, EXECUTE_COMMAND, json!({"command": "echo hi"}))
            .await
            .unwrap();
        assert_eq!(result.payload["stdout"], "hi\n");
        assert_eq!(result.payload["return_code"], 0);
    }

    #[tokio::test]
    async fn test_host_refusal_surfaces_as_tool_error() {
        let (_, registry) = registry();
        let err = call(&registry, EXECUTE_COMMAND, json!({"command": "rm -rf /"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Host(HostError::CommandNotAllowed { .. })));
        assert!(err.to_string().contains("not in the allowed list"));
    }

    #[tokio::test]
    async fn test_screenshot_unavailable() {
        let (_, registry) = registry();
        let err = call(&registry, TAKE_SCREENSHOT, json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Host(HostError::ScreenshotUnavailable)));
    }
}
