use {
    clap::{Args, Parser, Subcommand},
    dev_proxy::{ProxyRule, RuleError, ServerConfig, DEV_HOST, DEV_PORT, PREVIEW_PORT},
    std::path::PathBuf,
    walletkit_client::{Core, InitializationError},
    walletkit_types::{auth::RELAY_WEBSOCKET_ADDRESS, metadata::Metadata},
};

#[derive(Debug, Parser)]
#[command(name = "walletkit-dev", version, about)]
pub struct Cli {
    /// Log filter directives, e.g. `info,dev_proxy=debug`.
    #[arg(long, global = true, env = "WALLETKIT_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the development server with the WalletConnect Verify proxy.
    Serve(ServeArgs),

    /// Serve the production build, e.g. behind a tunnel host.
    Preview(PreviewArgs),

    /// Initialize the wallet client and hold its relay connection until
    /// interrupted.
    Wallet(WalletArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host name to bind.
    #[arg(long, env = "WALLETKIT_DEV_HOST", default_value = DEV_HOST)]
    pub host: String,

    #[arg(long, env = "WALLETKIT_DEV_PORT", default_value_t = DEV_PORT)]
    pub port: u16,

    /// Optional directory served next to the proxy.
    #[arg(long, env = "WALLETKIT_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl ServeArgs {
    pub fn into_config(self) -> Result<ServerConfig, RuleError> {
        Ok(ServerConfig::serve(vec![ProxyRule::walletconnect_verify()?])
            .with_host(self.host)
            .with_port(self.port)
            .with_static_dir(self.static_dir))
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Host name to bind. Environment specific, usually a tunnel host.
    #[arg(long, env = "WALLETKIT_PREVIEW_HOST")]
    pub host: String,

    #[arg(long, env = "WALLETKIT_PREVIEW_PORT", default_value_t = PREVIEW_PORT)]
    pub port: u16,

    /// Directory holding the production build.
    #[arg(long, env = "WALLETKIT_STATIC_DIR", default_value = dev_proxy::PREVIEW_STATIC_DIR)]
    pub static_dir: PathBuf,
}

impl PreviewArgs {
    pub fn into_config(self) -> Result<ServerConfig, RuleError> {
        Ok(
            ServerConfig::preview(self.host, vec![ProxyRule::walletconnect_verify()?])
                .with_port(self.port)
                .with_static_dir(self.static_dir),
        )
    }
}

#[derive(Debug, Args)]
pub struct WalletArgs {
    /// WalletConnect project ID from the cloud dashboard. Prefer the
    /// environment variable, arguments are visible to other processes.
    #[arg(long, env = "WALLETKIT_PROJECT_ID", hide_env_values = true)]
    pub project_id: String,

    #[arg(long, env = "WALLETKIT_RELAY_ADDRESS", default_value = RELAY_WEBSOCKET_ADDRESS)]
    pub relay_address: String,

    #[arg(long, env = "WALLETKIT_METADATA_NAME", default_value = "My Wallet")]
    pub name: String,

    #[arg(
        long,
        env = "WALLETKIT_METADATA_DESCRIPTION",
        default_value = "A simple wallet app using WalletKit"
    )]
    pub description: String,

    #[arg(long, env = "WALLETKIT_METADATA_URL", default_value = "https://yourapp.com")]
    pub url: String,

    /// Comma separated icon URLs.
    #[arg(long, env = "WALLETKIT_METADATA_ICONS", value_delimiter = ',')]
    pub icons: Vec<String>,
}

impl WalletArgs {
    /// Validates the project ID.
    pub fn core(&self) -> Result<Core, InitializationError> {
        Ok(Core::new(self.project_id.as_str())?.with_relay_address(self.relay_address.clone()))
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(&self.name, &self.description, &self.url).with_icons(&self.icons)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        clap::CommandFactory,
        dev_proxy::Mode,
        walletkit_types::domain::ProjectIdError,
    };

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("walletkit-dev").chain(args.iter().copied())).unwrap()
    }

    fn parse(args: &[&str]) -> Command {
        cli(args).command
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_is_accepted_anywhere() {
        assert_eq!(cli(&["--log", "debug", "serve"]).log, "debug");
        assert_eq!(
            cli(&["preview", "--host", "h", "--log", "warn,dev_proxy=trace"]).log,
            "warn,dev_proxy=trace"
        );
    }

    #[test]
    fn serve_uses_the_verify_rule() {
        let Command::Serve(args) = parse(&["serve", "--host", "127.0.0.1", "--port", "3000"])
        else {
            panic!("expected serve");
        };

        let config = args.into_config().unwrap();
        assert_eq!(config.mode, Mode::Serve);
        assert_eq!((config.host.as_str(), config.port), ("127.0.0.1", 3000));
        assert_eq!(config.rules, vec![ProxyRule::walletconnect_verify().unwrap()]);
    }

    #[test]
    fn preview_takes_the_tunnel_host() {
        let Command::Preview(args) = parse(&["preview", "--host", "abc.ngrok-free.app"]) else {
            panic!("expected preview");
        };

        let config = args.into_config().unwrap();
        assert_eq!(config.mode, Mode::Preview);
        assert_eq!(config.host, "abc.ngrok-free.app");
        assert_eq!(config.static_dir, Some(PathBuf::from("dist")));
    }

    #[test]
    fn wallet_args_build_core_and_metadata() {
        let Command::Wallet(args) = parse(&[
            "wallet",
            "--project-id",
            "59b8f4b8f8153ff97e652204f24f0442",
            "--icons",
            "https://yourapp.com/a.png,https://yourapp.com/b.png",
        ]) else {
            panic!("expected wallet");
        };

        let core = args.core().unwrap();
        assert_eq!(core.project_id().to_string(), "59b8f4b8f8153ff97e652204f24f0442");

        let metadata = args.metadata();
        assert_eq!(metadata.url(), "https://yourapp.com");
        assert_eq!(
            metadata.icons(),
            ["https://yourapp.com/a.png", "https://yourapp.com/b.png"]
        );
    }

    #[test]
    fn empty_project_id_is_refused_at_startup() {
        let Command::Wallet(args) = parse(&["wallet", "--project-id", ""]) else {
            panic!("expected wallet");
        };

        assert!(matches!(
            args.core(),
            Err(InitializationError::InvalidProjectId(ProjectIdError::Empty))
        ));
        assert!(args.metadata().icons().is_empty());
    }
}
