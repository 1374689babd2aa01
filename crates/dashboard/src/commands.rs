//! Command-line actions against a restored session.

use anyhow::{bail, Context};

use construcard_auth::{explain, RbacRegistry, SessionManager};

use crate::navigation;

pub const USAGE: &str = "usage: construcard <login EMAIL PASSWORD | logout | whoami | nav | roles | explain SECTION>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Whoami,
    Nav,
    Roles,
    Explain { section: String },
}

impl Command {
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        let command = match argv.as_slice() {
            ["login", email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ["logout"] => Command::Logout,
            ["whoami"] | [] => Command::Whoami,
            ["nav"] => Command::Nav,
            ["roles"] => Command::Roles,
            ["explain", section] => Command::Explain {
                section: section.to_string(),
            },
            _ => bail!("{USAGE}"),
        };
        Ok(command)
    }
}

/// Run a command and return what should be printed.
pub async fn run(session: &SessionManager, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Login { email, password } => {
            if email.trim().is_empty() || password.is_empty() {
                return Ok("Fill in all fields".to_string());
            }
            if session.login(&email, &password).await {
                Ok(whoami(session))
            } else {
                Ok("Invalid email or password".to_string())
            }
        }
        Command::Logout => {
            session.logout();
            Ok("Logged out".to_string())
        }
        Command::Whoami => Ok(whoami(session)),
        Command::Nav => {
            let items = navigation::visible_items(session);
            if items.is_empty() {
                return Ok("No sections available".to_string());
            }
            let lines: Vec<String> = items.iter().map(|i| format!("{} ({})", i.name, i.key)).collect();
            Ok(lines.join("\n"))
        }
        Command::Roles => {
            let registry = RbacRegistry::from_model(session.permission_model());
            serde_json::to_string_pretty(&registry).context("failed to render role registry")
        }
        Command::Explain { section } => {
            let Some(item) = navigation::find(&section) else {
                bail!("unknown section '{section}'");
            };
            let current = session.current();
            let explanation = explain(current.as_ref(), &item.access_request(), session.permission_model());
            serde_json::to_string_pretty(&explanation).context("failed to render explanation")
        }
    }
}

fn whoami(session: &SessionManager) -> String {
    match session.current() {
        Some(identity) => {
            let mut line = format!("{} <{}> ({})", identity.name, identity.email, identity.role.label());
            if let Some(department) = &identity.department {
                line.push_str(&format!(", {department}"));
            }
            line
        }
        None => "Not logged in".to_string(),
    }
}
