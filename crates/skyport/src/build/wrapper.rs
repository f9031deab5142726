//! Deployable wrapper sources
//!
//! Each wrapper imports one export from a user module and adapts it to the
//! entrypoint shape the target runtime calls. Route handlers receive a
//! standard `Request` plus `{ params, ... }` and return a `Response`;
//! subscribers receive the decoded message.

use skyport_router::exports::{DEFAULT_EXPORT, HANDLER_EXPORT};
use skyport_router::Method;
use std::path::{Component, Path};

use crate::config::Target;

const ROUTE_BINDING: &str = "route";
const SUBSCRIBER_BINDING: &str = "subscriber";

/// Module specifier for `to_file`, relative to the directory `from_dir`
///
/// Both paths must be expressed from the same base. The extension is dropped
/// so the target bundler resolves the module itself.
///
/// # Examples
///
/// ```
/// use skyport::build::wrapper::relative_import;
/// use std::path::Path;
///
/// let from = Path::new(".skyport/aws-lambda/routes/users");
/// let to = Path::new("functions/api/users/[id].ts");
/// assert_eq!(relative_import(from, to), "../../../../functions/api/users/[id]");
/// ```
pub fn relative_import(from_dir: &Path, to_file: &Path) -> String {
    let from: Vec<Component> = from_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component> = to_file
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(from.len() - common)
        .collect();
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if let Some(last) = parts.last_mut() {
        if let Some(dot) = last.rfind('.').filter(|&dot| dot > 0) {
            last.truncate(dot);
        }
    }

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// JavaScript string literal for `value`
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn import_line(export_name: &str, binding: &str, specifier: &str) -> String {
    if export_name == DEFAULT_EXPORT {
        format!("import {} from {};", binding, js_string(specifier))
    } else {
        format!(
            "import {{ {} as {} }} from {};",
            export_name,
            binding,
            js_string(specifier)
        )
    }
}

/// Wrapper source for one `(route, method)` handler
///
/// `template` is the route in the target's placeholder syntax.
pub fn route_wrapper(
    target: Target,
    method: Method,
    template: &str,
    export_name: &str,
    specifier: &str,
) -> String {
    let label = format!("{} {}", method, template);

    match target {
        // A Lambda-native `handler` export is already the entrypoint
        Target::AwsLambda if export_name == HANDLER_EXPORT => format!(
            "// Generated by skyport for {label}. Do not edit.\nexport {{ {HANDLER_EXPORT} }} from {};\n",
            js_string(specifier)
        ),
        Target::AwsLambda => {
            lambda_route(&label, method, &import_line(export_name, ROUTE_BINDING, specifier))
        }
        Target::CloudflareWorkers => {
            workers_route(&label, template, &import_line(export_name, ROUTE_BINDING, specifier))
        }
    }
}

fn lambda_route(label: &str, method: Method, import: &str) -> String {
    let fallback_method = if method.is_wildcard() { Method::Get } else { method };

    format!(
        r#"// Generated by skyport for {label}. Do not edit.
{import}

export const handler = async (event: any, context: unknown) => {{
  const method: string = event.requestContext?.http?.method ?? "{fallback_method}";
  const query = event.rawQueryString ? `?${{event.rawQueryString}}` : "";
  const url = `https://${{event.requestContext?.domainName ?? "localhost"}}${{event.rawPath ?? "/"}}${{query}}`;
  const body =
    event.body === undefined || method === "GET" || method === "HEAD"
      ? undefined
      : event.isBase64Encoded
        ? Buffer.from(event.body, "base64")
        : event.body;

  const request = new Request(url, {{ method, headers: event.headers ?? {{}}, body }});
  const response: Response = await {ROUTE_BINDING}(request, {{ params: event.pathParameters ?? {{}}, context }});

  return {{
    statusCode: response.status,
    headers: Object.fromEntries(response.headers.entries()),
    body: await response.text(),
  }};
}};
"#
    )
}

fn workers_route(label: &str, template: &str, import: &str) -> String {
    let template = js_string(template);

    format!(
        r#"// Generated by skyport for {label}. Do not edit.
{import}

const TEMPLATE = {template};

function params(pathname: string): Record<string, string> {{
  const expected = TEMPLATE.split("/").filter(Boolean);
  const actual = pathname.split("/").filter(Boolean);
  const found: Record<string, string> = {{}};
  expected.forEach((segment, i) => {{
    if (segment.startsWith(":") && actual[i] !== undefined) {{
      found[segment.slice(1)] = decodeURIComponent(actual[i]);
    }}
  }});
  return found;
}}

export default {{
  async fetch(request: Request, env: unknown, ctx: unknown): Promise<Response> {{
    return {ROUTE_BINDING}(request, {{ params: params(new URL(request.url).pathname), env, ctx }});
  }},
}};
"#
    )
}

/// Wrapper source for an event subscriber
pub fn subscriber_wrapper(
    target: Target,
    name: &str,
    export_name: &str,
    specifier: &str,
) -> String {
    let import = import_line(export_name, SUBSCRIBER_BINDING, specifier);

    match target {
        Target::AwsLambda => format!(
            r#"// Generated by skyport for subscriber {name}. Do not edit.
{import}

export const handler = async (event: {{ Records?: Array<{{ body: string }}> }}, context: unknown) => {{
  for (const record of event.Records ?? []) {{
    let message: unknown = record.body;
    try {{
      message = JSON.parse(record.body);
    }} catch {{
      // plain-text body
    }}
    await {SUBSCRIBER_BINDING}(message, {{ context }});
  }}
}};
"#
        ),
        Target::CloudflareWorkers => format!(
            r#"// Generated by skyport for subscriber {name}. Do not edit.
{import}

type Message = {{ body: unknown; ack(): void }};

export default {{
  async queue(batch: {{ messages: Message[] }}, env: unknown, ctx: unknown): Promise<void> {{
    for (const message of batch.messages) {{
      await {SUBSCRIBER_BINDING}(message.body, {{ env, ctx }});
      message.ack();
    }}
  }},
}};
"#
        ),
    }
}
