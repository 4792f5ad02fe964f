//! Sentinel gateway: entry point.
//!
//! Loads [`Settings`] and serves the status routes behind the admission
//! middleware.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SENTINEL_CONFIG` | *(none)* | Optional TOML/YAML/JSON settings file. |
//! | `SENTINEL_PORT` | `8000` | TCP port to listen on. |
//! | `SENTINEL_API_KEYS` | *(none)* | Comma-separated keys on the authenticated tier. |
//! | `DEFAULT_LIMIT` | `100` | Anonymous requests per period. |
//! | `USER_LIMIT` | `1000` | Authenticated requests per period. |
//! | `DEFAULT_PERIOD` | `60` | Period in seconds. |
//! | `SENTINEL_LOG_FORMAT` | `text` | `json` for structured output. |
//! | `RUST_LOG` | `sentinel_gateway=info,tower_http=info` | Log filter. |

use eyre::WrapErr;
use sentinel_gateway::server::GatewayServer;
use sentinel_gateway::settings::Settings;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();

    let settings = Settings::load().map_err(|report| eyre::eyre!("{report:?}"))?;

    info!(
        addr = %settings.bind_addr(),
        default_limit = settings.default_limit,
        user_limit = settings.user_limit,
        period_secs = settings.default_period,
        auth_keys = settings.api_keys.len(),
        "Sentinel configuration loaded"
    );
    if settings.api_keys.is_empty() {
        warn!("SENTINEL_API_KEYS is not set; every caller is on the anonymous tier");
    }

    let server = GatewayServer::new(settings).map_err(|report| eyre::eyre!("{report:?}"))?;
    server.start().await.wrap_err("gateway server stopped")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentinel_gateway=info,tower_http=info"));
    let json = std::env::var("SENTINEL_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
