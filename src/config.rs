//! Command-line configuration (SPEC_FULL.md §10.3). The broker takes no
//! config file: everything it needs fits on a command line, the way
//! `clap::Parser` derives it for plain binaries elsewhere in this crate's
//! lineage.

use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
	/// Address the public broker routes (`/proxy`, `/client`, `/answer`)
	/// listen on.
	#[arg(long, env = "BROKER_LISTEN", default_value = "0.0.0.0:8000")]
	pub listen: String,

	/// Address the `/metrics` and `/healthz` routes listen on.
	#[arg(long, env = "BROKER_ADMIN_LISTEN", default_value = "0.0.0.0:8001")]
	pub admin_listen: String,

	/// Proxy poll timeout (spec.md §3 Tp): how long an admitted proxy
	/// waits in the registry before being forgotten.
	#[arg(long, env = "BROKER_PROXY_TIMEOUT_SECS", default_value_t = 45)]
	pub proxy_timeout_secs: u64,

	/// Client answer timeout (spec.md §3 Tc): how long a matched client
	/// waits for the proxy's answer before giving up.
	#[arg(long, env = "BROKER_CLIENT_TIMEOUT_SECS", default_value_t = 20)]
	pub client_timeout_secs: u64,
}

impl Args {
	pub fn proxy_timeout(&self) -> Duration {
		Duration::from_secs(self.proxy_timeout_secs)
	}

	pub fn client_timeout(&self) -> Duration {
		Duration::from_secs(self.client_timeout_secs)
	}
}
