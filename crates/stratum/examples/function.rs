//! A complete function: configuration, telemetry, middleware and a handler.
//!
//! Run with:
//!
//! ```sh
//! STRATUM__LOGGING__FORMAT=pretty cargo run -p stratum --example function
//! ```

use std::time::Duration;

use serde_json::json;
use stratum::prelude::*;
use stratum::util::{get_internal, InternalSelector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_optional_file("stratum.toml")?
        .with_dotenv()?
        .with_env_prefix("STRATUM")
        .load()?;

    init_telemetry(&config.to_telemetry_config())?;

    let mut internal = stratum::core::Internal::new();
    internal.insert_pending("greeting", async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok::<_, Error>(json!({ "text": "hello" }))
    });

    let engine = Engine::with_config(
        |event: Event, context: Context, _signal| async move {
            tracing::info!(function = %context.function_name, "handling event");
            Ok(json!({
                "statusCode": 200,
                "body": format!("{} {}", event["greeting"].as_str().unwrap_or("hi"), event["name"]),
            }))
        },
        stratum::engine::EngineConfig::from_settings(&config.engine)
            .internal(internal)
            .plugin(TracingPlugin::new().with_hook_metrics()),
    );

    engine
        .use_middleware(Middleware::new("greeting").before(|request| {
            Box::pin(async move {
                let values = get_internal(
                    &InternalSelector::Mapped(vec![("greeting".into(), "greeting.text".into())]),
                    &request.internal,
                )
                .await?;
                request.event["greeting"] = values["greeting"].clone();
                Ok(Flow::Continue)
            })
        }))?
        .use_middleware(Middleware::new("http-error").on_error(|request| {
            Box::pin(async move {
                let status = request.error.as_ref().and_then(Error::status_code).unwrap_or(500);
                let body = request.error.as_ref().map(ToString::to_string);
                Ok(Flow::Respond(json!({ "statusCode": status, "body": body })))
            })
        }))?;

    let context = Context::new("greeter")
        .with_request_id("local-1")
        .with_remaining_time(Duration::from_secs(3));

    let response = engine.invoke(json!({ "name": "stratum" }), context).await?;
    println!("{response}");

    if config.metrics.enabled {
        if let Some(rendered) = stratum::telemetry::render_metrics() {
            println!("{rendered}");
        }
    }

    Ok(())
}
