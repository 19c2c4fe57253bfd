//! Argument parsing
//!
//! `provider-auth-cli [--config <path>] <command> [args]`

use anyhow::{Result, bail};
use provider_auth::FederatedProvider;

pub const USAGE: &str = "\
usage: provider-auth-cli [--config <path>] <command>

commands:
  authorize-url          print the provider login URL
  login                  open the provider login page
  login-federated <name> open a third-party login page (kakao)
  callback <url>         finish a login from the callback URL or ?code=...
  whoami                 print the signed-in user
  refresh                rotate the stored tokens
  status                 report whether a session was started
  logout                 forget the stored session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AuthorizeUrl,
    Login,
    LoginFederated(FederatedProvider),
    Callback(String),
    WhoAmI,
    Refresh,
    Status,
    Logout,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub command: Command,
}

impl Invocation {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut config_path = None;
        let mut positional = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => match iter.next() {
                    Some(path) => config_path = Some(path.clone()),
                    None => bail!("--config requires a path"),
                },
                "-h" | "--help" => positional.insert(0, "help"),
                other => positional.push(other),
            }
        }

        let command = match positional.as_slice() {
            [] | ["help", ..] => Command::Help,
            ["authorize-url"] => Command::AuthorizeUrl,
            ["login"] => Command::Login,
            ["login-federated", provider] => Command::LoginFederated(provider.parse()?),
            ["login-kakao"] => Command::LoginFederated(FederatedProvider::Kakao),
            ["callback", url] => Command::Callback((*url).to_owned()),
            ["whoami"] => Command::WhoAmI,
            ["refresh"] => Command::Refresh,
            ["status"] => Command::Status,
            ["logout"] => Command::Logout,
            other => bail!("unrecognized arguments: {}\n\n{USAGE}", other.join(" ")),
        };

        Ok(Self {
            config_path,
            command,
        })
    }
}
